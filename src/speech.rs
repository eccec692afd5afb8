//! Live speech-to-text.
//!
//! A recognizer reports [`RecognitionEvent`]s shaped like the Web Speech API:
//! `results` holds every result from `result_index` onward, each either
//! final or still interim. [`LiveTranscript`] folds those events into the
//! notes text.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecognitionSegment {
    pub transcript: String,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecognitionEvent {
    #[serde(default)]
    pub result_index: usize,
    pub results: Vec<RecognitionSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechUpdate {
    Result(RecognitionEvent),
    Error(String),
    Ended,
}

pub type SpeechSink = Arc<dyn Fn(SpeechUpdate) + Send + Sync>;

/// A live speech recognition capability.
pub trait SpeechRecognizer: Send {
    /// Begin continuous recognition with interim results.
    fn start(&mut self, language: &str, sink: SpeechSink) -> Result<()>;

    /// Stop recognition. Calling it while not listening does nothing.
    fn stop(&mut self);
}

/// Returns the configured recognizer, or `None` when live speech is
/// unavailable on this machine.
pub fn detect(config: &Config) -> Option<Box<dyn SpeechRecognizer>> {
    let command = config.speech_command.as_ref()?;
    if command.is_empty() || command[0].trim().is_empty() {
        return None;
    }
    Some(Box::new(CommandRecognizer::new(command.clone())))
}

/// Notes text being extended by a live session.
///
/// Final segments are appended once. The trailing interim segments are
/// replaced on every event, so a refined guess never duplicates text.
#[derive(Debug, Clone)]
pub struct LiveTranscript {
    committed: String,
    next_index: usize,
    pending: BTreeMap<usize, RecognitionSegment>,
}

fn append_spaced(text: &mut String, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }
    if !text.is_empty() && !text.ends_with(char::is_whitespace) {
        text.push(' ');
    }
    text.push_str(segment);
}

impl LiveTranscript {
    pub fn begin(notes: &str) -> Self {
        Self {
            committed: notes.to_string(),
            next_index: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, event: &RecognitionEvent) {
        for (offset, segment) in event.results.iter().enumerate() {
            let index = event.result_index + offset;
            if index >= self.next_index {
                self.pending.insert(index, segment.clone());
            }
        }

        // Results below result_index will not change again.
        let settled: Vec<usize> = self
            .pending
            .range(..event.result_index)
            .map(|(&index, _)| index)
            .collect();
        for index in settled {
            if let Some(segment) = self.pending.remove(&index) {
                append_spaced(&mut self.committed, &segment.transcript);
            }
        }
        self.next_index = self.next_index.max(event.result_index);

        while let Some(segment) = self.pending.get(&self.next_index) {
            if !segment.is_final {
                break;
            }
            append_spaced(&mut self.committed, &segment.transcript);
            self.pending.remove(&self.next_index);
            self.next_index += 1;
        }
    }

    /// Committed text followed by the current interim guess.
    pub fn text(&self) -> String {
        let mut text = self.committed.clone();
        for segment in self.pending.values() {
            append_spaced(&mut text, &segment.transcript);
        }
        text
    }
}

/// Runs an external speech engine that prints one JSON `RecognitionEvent`
/// per line on stdout.
pub struct CommandRecognizer {
    command: Vec<String>,
    child: Option<Child>,
    reader: Option<JoinHandle<()>>,
}

impl CommandRecognizer {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            child: None,
            reader: None,
        }
    }

    fn args(&self, language: &str) -> Vec<String> {
        self.command[1..]
            .iter()
            .map(|arg| arg.replace("{lang}", language))
            .collect()
    }
}

impl SpeechRecognizer for CommandRecognizer {
    fn start(&mut self, language: &str, sink: SpeechSink) -> Result<()> {
        self.stop();

        let program = self
            .command
            .first()
            .ok_or_else(|| anyhow!("speech command is empty"))?;
        let mut child = Command::new(program)
            .args(self.args(language))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("speech command has no stdout"))?;

        tracing::info!(program = %program, language, "speech recognition started");

        self.reader = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match serde_json::from_str::<RecognitionEvent>(&line) {
                        Ok(event) => sink(SpeechUpdate::Result(event)),
                        Err(e) => sink(SpeechUpdate::Error(format!("bad recognition event: {e}"))),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        sink(SpeechUpdate::Error(e.to_string()));
                        break;
                    }
                }
            }
            sink(SpeechUpdate::Ended);
        }));
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
            tracing::info!("speech recognition stopped");
        }
    }
}

impl Drop for CommandRecognizer {
    fn drop(&mut self) {
        self.stop();
    }
}
