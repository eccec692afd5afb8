use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, FocusPane, InputMode};
use crate::state::TextInput;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(Instant::now()),
        AppEvent::Backend(reply) => app.apply_reply(reply),
        AppEvent::Speech { session, update } => app.apply_speech(session, update),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Alerts are modal: any key dismisses
    if app.alert.is_some() {
        app.dismiss_alert();
        return;
    }

    if app.audio_prompt.is_some() {
        handle_audio_prompt(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_audio_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_audio_prompt(),
        KeyCode::Enter => app.submit_transcribe(),
        _ => {
            if let Some(input) = app.audio_prompt.as_mut() {
                edit_line(input, key);
            }
        }
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    app.status = None;
    match key.code {
        KeyCode::Char('q') => {
            app.stop_listening();
            app.should_quit = true;
        }

        // Focus
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.prev(),
        KeyCode::Char('i') | KeyCode::Enter if app.focus.is_editable() => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('/') => {
            app.focus = FocusPane::Chat;
            app.input_mode = InputMode::Editing;
        }

        // Meeting type selector
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right if app.focus == FocusPane::MeetingType => {
            app.draft.next_meeting_type(app.meeting_types.len());
        }
        KeyCode::Char('h') | KeyCode::Left if app.focus == FocusPane::MeetingType => {
            app.draft.prev_meeting_type(app.meeting_types.len());
        }

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => scroll(app, 1),
        KeyCode::Char('k') | KeyCode::Up => scroll(app, -1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => scroll(app, 10),
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => scroll(app, -10),

        // Actions
        KeyCode::Char('a') => app.submit_analyze(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('m') => app.toggle_listening(),
        KeyCode::Char('u') => app.open_audio_prompt(),
        KeyCode::Char('x') => app.clear(),
        KeyCode::Char('X') => app.clear_chat(),
        KeyCode::Char('c') => app.copy_summary(Instant::now()),
        KeyCode::Char('s') => app.download_text(),
        KeyCode::Char('p') => app.download_pdf(),

        _ => {}
    }
}

fn scroll(app: &mut App, delta: i32) {
    let target = match app.focus {
        FocusPane::Chat => &mut app.chat_scroll,
        _ => &mut app.results_scroll,
    };
    // u16::MAX means "stick to bottom"; the renderer clamps it
    let current = i32::from(*target).min(i32::from(u16::MAX - 1));
    *target = (current + delta).clamp(0, i32::from(u16::MAX - 1)) as u16;
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            return;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = if key.code == KeyCode::Tab { app.focus.next() } else { app.focus.prev() };
            if !app.focus.is_editable() {
                app.input_mode = InputMode::Normal;
            }
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Notes => {
            // The live transcript owns the notes while listening
            if app.listening.is_some() {
                return;
            }
            match key.code {
                KeyCode::Enter => app.draft.notes.insert('\n'),
                _ => edit_line(&mut app.draft.notes, key),
            }
        }
        FocusPane::Title => match key.code {
            KeyCode::Enter => app.input_mode = InputMode::Normal,
            _ => edit_line(&mut app.draft.title, key),
        },
        FocusPane::Chat => match key.code {
            KeyCode::Enter => app.send_chat(),
            _ => edit_line(&mut app.chat_input, key),
        },
        FocusPane::MeetingType | FocusPane::Results => app.input_mode = InputMode::Normal,
    }
}

fn edit_line(input: &mut TextInput, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.left(),
        KeyCode::Right => input.right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => input.insert(c),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AnalysisResult, AnalyzeRequest, Backend, ChatRequest, ExportPdfRequest};
    use crate::config::Config;
    use crate::error::BackendResult;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct EchoBackend;

    #[async_trait]
    impl Backend for EchoBackend {
        async fn analyze(&self, _request: &AnalyzeRequest) -> BackendResult<AnalysisResult> {
            Ok(AnalysisResult::default())
        }

        async fn transcribe(&self, _file_name: &str, _audio: Vec<u8>) -> BackendResult<String> {
            Ok(String::new())
        }

        async fn chat(&self, request: &ChatRequest) -> BackendResult<String> {
            Ok(request.question.clone())
        }

        async fn export_pdf(&self, _request: &ExportPdfRequest) -> BackendResult<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    fn app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let app = App::new(&Config::new(), None, Arc::new(EchoBackend), None, tx);
        (app, rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_typing_notes_and_newlines() {
        let (mut app, _rx) = app();
        type_str(&mut app, "line one");
        press(&mut app, KeyCode::Enter);
        type_str(&mut app, "two");
        assert_eq!(app.draft.notes.text(), "line one\ntwo");
    }

    #[tokio::test]
    async fn test_enter_in_chat_sends() {
        let (mut app, mut rx) = app();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('/'));
        type_str(&mut app, "who owns the budget?");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.chat.len(), 2);

        while let Some(event) = rx.recv().await {
            if matches!(event, AppEvent::Backend(_)) {
                handle_event(&mut app, event);
                break;
            }
        }
        assert_eq!(app.chat.messages()[1].text, "who owns the budget?");
    }

    #[tokio::test]
    async fn test_alert_is_dismissed_by_any_key() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('a'));
        assert!(app.alert.is_some());
        press(&mut app, KeyCode::Char('a'));
        assert!(app.alert.is_none());
    }

    #[tokio::test]
    async fn test_meeting_type_selector_cycles() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Esc);
        app.focus = FocusPane::MeetingType;
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.draft.meeting_type_idx, 2);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.draft.meeting_type_idx, 1);
    }

    #[tokio::test]
    async fn test_scroll_clamps_at_zero() {
        let (mut app, _rx) = app();
        press(&mut app, KeyCode::Esc);
        app.focus = FocusPane::Results;
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.results_scroll, 0);
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.results_scroll, 1);
    }

    #[tokio::test]
    async fn test_shift_x_clears_chat_only() {
        let (mut app, _rx) = app();
        type_str(&mut app, "notes stay");
        app.chat.push_user("hi");
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('X'));
        assert!(app.chat.is_empty());
        assert_eq!(app.draft.notes.text(), "notes stay");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_while_editing() {
        let (mut app, _rx) = app();
        handle_event(
            &mut app,
            AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        );
        assert!(app.should_quit);
    }
}
