pub mod api;
pub mod app;
pub mod clipboard;
pub mod config;
pub mod download;
pub mod error;
pub mod handler;
pub mod render;
pub mod speech;
pub mod state;
pub mod theme;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::{AnalysisResult, AnalyzeRequest, Backend, ChatRequest, ExportPdfRequest, HttpBackend};
pub use app::{App, BackendReply};
pub use config::Config;
pub use error::{BackendError, BackendResult};
pub use render::{analysis_view, AnalysisView};
pub use speech::{LiveTranscript, RecognitionEvent, SpeechRecognizer};
pub use theme::Theme;
