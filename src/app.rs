use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::api::{AnalysisResult, Backend, ChatRequest, ExportPdfRequest};
use crate::clipboard::copy_to_clipboard;
use crate::config::Config;
use crate::download::{save_download, REPORT_PDF, SUMMARY_TXT};
use crate::error::BackendResult;
use crate::render::{analysis_view, summary_text};
use crate::speech::{LiveTranscript, SpeechRecognizer, SpeechSink, SpeechUpdate};
use crate::state::{
    Action, ChatTranscript, CopyFeedback, InFlight, MeetingDraft, MessageId, ResultCards, TextInput,
};
use crate::theme::Theme;
use crate::tui::{AppEvent, EventSender};

pub const NOTES_REQUIRED: &str = "Please enter meeting notes first.";
pub const AUDIO_REQUIRED: &str = "Please select an audio file first.";
pub const BACKEND_ERROR: &str = "Backend error";
pub const TRANSCRIBE_FAILED: &str = "Transcription failed";
pub const PDF_FAILED: &str = "PDF download failed";
pub const COPY_FAILED: &str = "Copy failed";
pub const DOWNLOAD_FAILED: &str = "Download failed";
pub const CHAT_FAILED: &str = "Error: could not get an answer.";
pub const CHAT_BUSY: &str = "Still answering the previous question";
pub const TRANSCRIBE_BUSY: &str = "A transcription is already running";
pub const NO_SUMMARY: &str = "No summary yet, analyze the notes first";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Notes,
    Title,
    MeetingType,
    Results,
    Chat,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Notes => FocusPane::Title,
            FocusPane::Title => FocusPane::MeetingType,
            FocusPane::MeetingType => FocusPane::Results,
            FocusPane::Results => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Notes,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FocusPane::Notes => FocusPane::Chat,
            FocusPane::Title => FocusPane::Notes,
            FocusPane::MeetingType => FocusPane::Title,
            FocusPane::Results => FocusPane::MeetingType,
            FocusPane::Chat => FocusPane::Results,
        }
    }

    /// Panes that take typed text.
    pub fn is_editable(self) -> bool {
        matches!(self, FocusPane::Notes | FocusPane::Title | FocusPane::Chat)
    }
}

/// Outcome of a background request, delivered through the event channel.
#[derive(Debug)]
pub enum BackendReply {
    Analyzed(BackendResult<AnalysisResult>),
    Transcribed(BackendResult<String>),
    Answered {
        placeholder: MessageId,
        result: BackendResult<String>,
    },
    PdfExported(BackendResult<Vec<u8>>),
}

pub type ClipboardFn = fn(&str) -> anyhow::Result<()>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub theme: Theme,

    // Form
    pub draft: MeetingDraft,
    pub meeting_types: Vec<String>,

    // Results
    pub results: ResultCards,
    pub results_scroll: u16,
    pub copy_feedback: CopyFeedback,

    // Chat
    pub chat: ChatTranscript,
    pub chat_input: TextInput,
    pub chat_scroll: u16,

    // Requests and feedback
    pub in_flight: InFlight,
    pub alert: Option<String>,
    pub status: Option<String>,
    pub audio_prompt: Option<TextInput>,
    pub animation_frame: u8,

    // Live speech
    pub listening: Option<LiveTranscript>,
    speech_session: u64,
    speech: Option<Box<dyn SpeechRecognizer>>,
    speech_language: String,

    // Collaborators
    backend: Arc<dyn Backend>,
    events: EventSender,
    clipboard: ClipboardFn,
    config_path: Option<PathBuf>,
    download_dir: PathBuf,
}

impl App {
    pub fn new(
        config: &Config,
        config_path: Option<PathBuf>,
        backend: Arc<dyn Backend>,
        speech: Option<Box<dyn SpeechRecognizer>>,
        events: EventSender,
    ) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Notes,
            theme: config.theme(),

            draft: MeetingDraft::default(),
            meeting_types: config.meeting_types(),

            results: ResultCards::default(),
            results_scroll: 0,
            copy_feedback: CopyFeedback::default(),

            chat: ChatTranscript::default(),
            chat_input: TextInput::default(),
            chat_scroll: 0,

            in_flight: InFlight::default(),
            alert: None,
            status: None,
            audio_prompt: None,
            animation_frame: 0,

            listening: None,
            speech_session: 0,
            speech,
            speech_language: config.speech_language(),

            backend,
            events,
            clipboard: copy_to_clipboard,
            config_path,
            download_dir: config.download_dir(),
        }
    }

    pub fn with_clipboard(mut self, clipboard: ClipboardFn) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = BackendReply> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let reply = request.await;
            if events.send(AppEvent::Backend(reply)).is_err() {
                tracing::debug!("reply dropped, event loop is gone");
            }
        });
    }

    fn show_alert(&mut self, message: &str) {
        self.alert = Some(message.to_string());
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    fn clear_status(&mut self, message: &str) {
        if self.status.as_deref() == Some(message) {
            self.status = None;
        }
    }

    /// Flip the theme and persist it.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        if let Some(path) = &self.config_path {
            if let Err(e) = Config::save_theme(path, self.theme) {
                tracing::warn!(error = %e, "could not persist theme");
            }
        }
    }

    pub fn submit_analyze(&mut self) {
        let Some(request) = self.draft.analyze_request(&self.meeting_types) else {
            self.show_alert(NOTES_REQUIRED);
            return;
        };
        if !self.in_flight.try_begin(Action::Analyze) {
            return;
        }

        tracing::info!(
            title = %request.meeting_title,
            meeting_type = %request.meeting_type,
            chars = request.meeting_text.len(),
            "analyzing meeting"
        );
        let backend = self.backend.clone();
        self.spawn_request(async move { BackendReply::Analyzed(backend.analyze(&request).await) });
    }

    pub fn speech_available(&self) -> bool {
        self.speech.is_some()
    }

    pub fn toggle_listening(&mut self) {
        if self.listening.is_some() {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    fn start_listening(&mut self) {
        let Some(speech) = self.speech.as_mut() else {
            return;
        };
        self.speech_session += 1;
        let session = self.speech_session;
        let events = self.events.clone();
        let sink: SpeechSink = Arc::new(move |update| {
            let _ = events.send(AppEvent::Speech { session, update });
        });
        match speech.start(&self.speech_language, sink) {
            Ok(()) => self.listening = Some(LiveTranscript::begin(self.draft.notes.text())),
            Err(e) => tracing::error!(error = %e, "could not start speech recognition"),
        }
    }

    pub fn stop_listening(&mut self) {
        if let Some(speech) = self.speech.as_mut() {
            speech.stop();
        }
        self.listening = None;
    }

    /// Apply an update from a listening session. Updates from an earlier
    /// session still queued in the channel are dropped.
    pub fn apply_speech(&mut self, session: u64, update: SpeechUpdate) {
        if session != self.speech_session {
            tracing::debug!(session, "dropping update from a stopped session");
            return;
        }
        let Some(live) = self.listening.as_mut() else {
            return;
        };
        match update {
            SpeechUpdate::Result(event) => {
                live.apply(&event);
                self.draft.notes.set(live.text());
            }
            SpeechUpdate::Error(e) => tracing::warn!(error = %e, "speech recognition error"),
            SpeechUpdate::Ended => {
                tracing::info!("speech recognition ended");
                self.listening = None;
            }
        }
    }

    pub fn open_audio_prompt(&mut self) {
        self.audio_prompt = Some(TextInput::default());
    }

    pub fn cancel_audio_prompt(&mut self) {
        self.audio_prompt = None;
    }

    /// Upload the file named in the audio prompt for transcription.
    pub fn submit_transcribe(&mut self) {
        if self.in_flight.is_busy(Action::Transcribe) {
            self.status = Some(TRANSCRIBE_BUSY.to_string());
            return;
        }
        let path = self
            .audio_prompt
            .take()
            .map(|input| input.trimmed().to_string())
            .unwrap_or_default();
        if path.is_empty() {
            self.show_alert(AUDIO_REQUIRED);
            return;
        }
        if !self.in_flight.try_begin(Action::Transcribe) {
            return;
        }

        let path = expand_home(&path);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        tracing::info!(path = %path.display(), "transcribing audio");

        let backend = self.backend.clone();
        self.spawn_request(async move {
            let result = match tokio::fs::read(&path).await {
                Ok(audio) => backend.transcribe(&file_name, audio).await,
                Err(e) => Err(e.into()),
            };
            BackendReply::Transcribed(result)
        });
    }

    /// Reset the form and results. The chat transcript is left alone.
    pub fn clear(&mut self) {
        self.draft.notes.clear();
        self.draft.title.clear();
        self.results.hide();
        self.results_scroll = 0;
        if self.listening.is_some() {
            self.listening = Some(LiveTranscript::begin(""));
        }
        self.focus = FocusPane::Notes;
        self.input_mode = InputMode::Editing;
    }

    pub fn clear_chat(&mut self) {
        self.chat.clear();
        self.chat_scroll = 0;
    }

    pub fn summary(&self) -> String {
        summary_text(self.results.view.as_ref())
    }

    fn has_summary(&mut self) -> bool {
        if self.results.view.is_none() {
            self.status = Some(NO_SUMMARY.to_string());
            return false;
        }
        true
    }

    pub fn copy_summary(&mut self, now: Instant) {
        if !self.has_summary() {
            return;
        }
        match (self.clipboard)(&self.summary()) {
            Ok(()) => self.copy_feedback.confirm(now),
            Err(e) => {
                tracing::error!(error = %e, "copy failed");
                self.show_alert(COPY_FAILED);
            }
        }
    }

    pub fn download_text(&mut self) {
        if !self.has_summary() {
            return;
        }
        match save_download(&self.download_dir, SUMMARY_TXT, self.summary().as_bytes()) {
            Ok(path) => self.status = Some(format!("Saved {}", path.display())),
            Err(e) => {
                tracing::error!(error = %e, "text download failed");
                self.show_alert(DOWNLOAD_FAILED);
            }
        }
    }

    pub fn download_pdf(&mut self) {
        if !self.in_flight.try_begin(Action::ExportPdf) {
            return;
        }
        let request = ExportPdfRequest {
            summary: self.summary(),
        };
        let backend = self.backend.clone();
        self.spawn_request(async move { BackendReply::PdfExported(backend.export_pdf(&request).await) });
    }

    /// Send the chat input. Blank questions are ignored, and so is a new
    /// question while the previous one is unanswered.
    pub fn send_chat(&mut self) {
        let question = self.chat_input.trimmed().to_string();
        if question.is_empty() {
            return;
        }
        // The question stays in the input so it can be sent once the answer lands.
        if !self.in_flight.try_begin(Action::Chat) {
            self.status = Some(CHAT_BUSY.to_string());
            return;
        }

        self.chat.push_user(question.clone());
        let placeholder = self.chat.push_placeholder();
        self.chat_input.clear();
        self.chat_scroll = u16::MAX;

        let request = ChatRequest {
            question,
            notes: self.draft.notes.text().to_string(),
        };
        let backend = self.backend.clone();
        self.spawn_request(async move {
            BackendReply::Answered {
                placeholder,
                result: backend.chat(&request).await,
            }
        });
    }

    /// Render a finished request. In-flight state is restored on every path.
    pub fn apply_reply(&mut self, reply: BackendReply) {
        match reply {
            BackendReply::Analyzed(result) => {
                self.in_flight.finish(Action::Analyze);
                match result {
                    Ok(result) => {
                        tracing::info!(
                            key_points = result.key_points.len(),
                            decisions = result.decisions.len(),
                            action_items = result.action_items.len(),
                            "analysis received"
                        );
                        self.results.show(analysis_view(&result));
                        self.results_scroll = 0;
                        self.focus = FocusPane::Results;
                        self.input_mode = InputMode::Normal;
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "analyze failed");
                        self.show_alert(BACKEND_ERROR);
                    }
                }
            }
            BackendReply::Transcribed(result) => {
                self.in_flight.finish(Action::Transcribe);
                self.clear_status(TRANSCRIBE_BUSY);
                match result {
                    Ok(text) => {
                        self.stop_listening();
                        self.draft.notes.set(text.trim());
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "transcription failed");
                        self.show_alert(TRANSCRIBE_FAILED);
                    }
                }
            }
            BackendReply::Answered { placeholder, result } => {
                self.in_flight.finish(Action::Chat);
                self.clear_status(CHAT_BUSY);
                let answer = result.unwrap_or_else(|e| {
                    tracing::error!(error = %e, "chat failed");
                    CHAT_FAILED.to_string()
                });
                if !self.chat.resolve(placeholder, answer) {
                    tracing::debug!("chat answer arrived after transcript was cleared");
                }
                self.chat_scroll = u16::MAX;
            }
            BackendReply::PdfExported(result) => {
                self.in_flight.finish(Action::ExportPdf);
                let saved = result
                    .map_err(anyhow::Error::from)
                    .and_then(|pdf| save_download(&self.download_dir, REPORT_PDF, &pdf));
                match saved {
                    Ok(path) => self.status = Some(format!("Saved {}", path.display())),
                    Err(e) => {
                        tracing::error!(error = %e, "pdf export failed");
                        self.show_alert(PDF_FAILED);
                    }
                }
            }
        }
    }

    /// Tick animation frame, card reveal and copy-label reset
    pub fn tick(&mut self, now: Instant) {
        if self.in_flight.any() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.results.tick();
        self.copy_feedback.expire(now);
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
