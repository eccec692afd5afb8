//! UI-agnostic client state.
//!
//! Everything the controller mutates lives here as plain data so it can be
//! exercised without a terminal.

use std::time::{Duration, Instant};

use crate::api::AnalyzeRequest;
use crate::render::AnalysisView;

pub const DEFAULT_TITLE: &str = "Untitled Meeting";
pub const THINKING: &str = "Thinking...";
pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";
pub const COPY_CONFIRM_DURATION: Duration = Duration::from_millis(1500);
pub const REVEAL_FRAMES: u8 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Editable text with a cursor counted in chars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the contents and move the cursor to the end.
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    /// Text after trimming, as sent to the backend.
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }
}

/// Form fields of the meeting being worked on.
#[derive(Debug, Clone, Default)]
pub struct MeetingDraft {
    pub title: TextInput,
    pub notes: TextInput,
    pub meeting_type_idx: usize,
}

impl MeetingDraft {
    /// Body of an analyze request, or `None` when there are no notes.
    pub fn analyze_request(&self, meeting_types: &[String]) -> Option<AnalyzeRequest> {
        if self.notes.is_blank() {
            return None;
        }
        let title = match self.title.trimmed() {
            "" => DEFAULT_TITLE.to_string(),
            t => t.to_string(),
        };
        Some(AnalyzeRequest {
            meeting_text: self.notes.trimmed().to_string(),
            meeting_title: title,
            meeting_type: self.meeting_type(meeting_types).unwrap_or_default().to_string(),
        })
    }

    pub fn meeting_type<'a>(&self, meeting_types: &'a [String]) -> Option<&'a str> {
        meeting_types.get(self.meeting_type_idx).map(String::as_str)
    }

    pub fn next_meeting_type(&mut self, count: usize) {
        if count > 0 {
            self.meeting_type_idx = (self.meeting_type_idx + 1) % count;
        }
    }

    pub fn prev_meeting_type(&mut self, count: usize) {
        if count > 0 {
            self.meeting_type_idx = (self.meeting_type_idx + count - 1) % count;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(u64);

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Ai,
}

/// A chat message in the Q&A transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: ChatRole,
    pub text: String,
    pub pending: bool,
}

/// Ordered chat transcript. Placeholders are addressed by handle, never by
/// position.
#[derive(Debug, Clone, Default)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl ChatTranscript {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn push(&mut self, role: ChatRole, text: String, pending: bool) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(ChatMessage { id, role, text, pending });
        id
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> MessageId {
        self.push(ChatRole::User, text.into(), false)
    }

    pub fn push_placeholder(&mut self) -> MessageId {
        self.push(ChatRole::Ai, THINKING.to_string(), true)
    }

    /// Drop the placeholder and append the answer. Returns false if the
    /// placeholder is gone (transcript cleared meanwhile).
    pub fn resolve(&mut self, placeholder: MessageId, answer: impl Into<String>) -> bool {
        let Some(pos) = self.messages.iter().position(|m| m.id == placeholder) else {
            return false;
        };
        self.messages.remove(pos);
        self.push(ChatRole::Ai, answer.into(), false);
        true
    }
}

/// Result cards: summary, key points, decisions, action items, confidence.
#[derive(Debug, Clone, Default)]
pub struct ResultCards {
    pub view: Option<AnalysisView>,
    pub visible: bool,
    /// Reveal transition progress, `REVEAL_FRAMES` when fully shown.
    pub reveal: u8,
}

impl ResultCards {
    pub fn show(&mut self, view: AnalysisView) {
        self.view = Some(view);
        self.visible = true;
        self.reveal = 0;
    }

    pub fn hide(&mut self) {
        self.view = None;
        self.visible = false;
        self.reveal = 0;
    }

    pub fn tick(&mut self) {
        if self.visible && self.reveal < REVEAL_FRAMES {
            self.reveal += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Analyze,
    Transcribe,
    Chat,
    ExportPdf,
}

/// Per-action in-flight guards.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    analyze: bool,
    transcribe: bool,
    chat: bool,
    export_pdf: bool,
}

impl InFlight {
    fn slot(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Analyze => &mut self.analyze,
            Action::Transcribe => &mut self.transcribe,
            Action::Chat => &mut self.chat,
            Action::ExportPdf => &mut self.export_pdf,
        }
    }

    pub fn is_busy(&self, action: Action) -> bool {
        match action {
            Action::Analyze => self.analyze,
            Action::Transcribe => self.transcribe,
            Action::Chat => self.chat,
            Action::ExportPdf => self.export_pdf,
        }
    }

    pub fn any(&self) -> bool {
        self.analyze || self.transcribe || self.chat || self.export_pdf
    }

    /// Mark the action as running. False if it already is.
    pub fn try_begin(&mut self, action: Action) -> bool {
        let slot = self.slot(action);
        if *slot {
            return false;
        }
        *slot = true;
        true
    }

    pub fn finish(&mut self, action: Action) {
        *self.slot(action) = false;
    }
}

/// Label of the copy control, swapped to a confirmation for a short while.
#[derive(Debug, Clone, Default)]
pub struct CopyFeedback {
    until: Option<Instant>,
}

impl CopyFeedback {
    pub fn confirm(&mut self, now: Instant) {
        self.until = Some(now + COPY_CONFIRM_DURATION);
    }

    pub fn label(&self, now: Instant) -> &'static str {
        match self.until {
            Some(until) if now < until => COPIED_LABEL,
            _ => COPY_LABEL,
        }
    }

    pub fn expire(&mut self, now: Instant) {
        if self.until.is_some_and(|until| now >= until) {
            self.until = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> Vec<String> {
        vec!["general".into(), "standup".into()]
    }

    #[test]
    fn test_text_input_utf8_editing() {
        let mut input = TextInput::default();
        for c in "héllo".chars() {
            input.insert(c);
        }
        input.left();
        input.left();
        input.backspace();
        assert_eq!(input.text(), "hélo");
        input.home();
        input.delete();
        assert_eq!(input.text(), "élo");
        input.end();
        input.insert('!');
        assert_eq!(input.text(), "élo!");
        assert_eq!(input.cursor(), 4);
    }

    #[test]
    fn test_analyze_request_requires_notes() {
        let mut draft = MeetingDraft::default();
        draft.notes.set("   \n  ");
        assert!(draft.analyze_request(&types()).is_none());
    }

    #[test]
    fn test_analyze_request_defaults_title() {
        let mut draft = MeetingDraft::default();
        draft.notes.set("  Discuss Q3 budget \n");
        draft.next_meeting_type(2);
        let request = draft.analyze_request(&types()).unwrap();
        assert_eq!(request.meeting_text, "Discuss Q3 budget");
        assert_eq!(request.meeting_title, DEFAULT_TITLE);
        assert_eq!(request.meeting_type, "standup");

        draft.title.set(" Sprint review ");
        assert_eq!(draft.analyze_request(&types()).unwrap().meeting_title, "Sprint review");
    }

    #[test]
    fn test_meeting_type_cycles() {
        let mut draft = MeetingDraft::default();
        draft.prev_meeting_type(3);
        assert_eq!(draft.meeting_type_idx, 2);
        draft.next_meeting_type(3);
        assert_eq!(draft.meeting_type_idx, 0);
        draft.next_meeting_type(0);
        assert_eq!(draft.meeting_type_idx, 0);
    }

    #[test]
    fn test_resolve_replaces_placeholder_by_handle() {
        let mut chat = ChatTranscript::default();
        chat.push_user("What was decided?");
        let first = chat.push_placeholder();
        chat.push_user("And who owns it?");
        let second = chat.push_placeholder();

        // Answers arrive out of order; each replaces its own placeholder.
        assert!(chat.resolve(second, "Dana"));
        assert!(chat.resolve(first, "Cut spend"));

        let texts: Vec<&str> = chat.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["What was decided?", "And who owns it?", "Dana", "Cut spend"]);
        assert!(chat.messages().iter().all(|m| !m.pending));
    }

    #[test]
    fn test_resolve_after_clear_is_ignored() {
        let mut chat = ChatTranscript::default();
        let id = chat.push_placeholder();
        chat.clear();
        assert!(!chat.resolve(id, "late answer"));
        assert!(chat.is_empty());
    }

    #[test]
    fn test_in_flight_guard() {
        let mut in_flight = InFlight::default();
        assert!(in_flight.try_begin(Action::Analyze));
        assert!(!in_flight.try_begin(Action::Analyze));
        assert!(in_flight.try_begin(Action::Chat));
        in_flight.finish(Action::Analyze);
        assert!(!in_flight.is_busy(Action::Analyze));
        assert!(in_flight.any());
    }

    #[test]
    fn test_copy_feedback_reverts() {
        let start = Instant::now();
        let mut feedback = CopyFeedback::default();
        assert_eq!(feedback.label(start), COPY_LABEL);
        feedback.confirm(start);
        assert_eq!(feedback.label(start + Duration::from_millis(1499)), COPIED_LABEL);
        assert_eq!(feedback.label(start + COPY_CONFIRM_DURATION), COPY_LABEL);
        feedback.expire(start + Duration::from_secs(2));
        assert_eq!(feedback.label(start), COPY_LABEL);
    }

    #[test]
    fn test_result_cards_reveal() {
        let mut cards = ResultCards::default();
        cards.tick();
        assert_eq!(cards.reveal, 0);
        cards.visible = true;
        for _ in 0..10 {
            cards.tick();
        }
        assert_eq!(cards.reveal, REVEAL_FRAMES);
        cards.hide();
        assert!(!cards.visible);
        assert!(cards.view.is_none());
    }
}
