use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Result, anyhow};

use crate::theme::Theme;

pub const BACKEND_URL_ENV: &str = "MEETING_NOTES_BACKEND_URL";

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_SPEECH_LANGUAGE: &str = "en-US";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MEETING_TYPES: [&str; 6] = [
    "general",
    "standup",
    "planning",
    "retrospective",
    "client",
    "interview",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub theme: Option<String>,
    pub backend_url: Option<String>,
    pub speech_language: Option<String>,
    /// Program and arguments of the live speech engine. `{lang}` is replaced
    /// with the recognition language.
    pub speech_command: Option<Vec<String>>,
    pub meeting_types: Option<Vec<String>>,
    pub request_timeout_secs: Option<u64>,
    pub download_dir: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            theme: Some(Theme::default().as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Persist only the theme, leaving the rest of the file as it is on disk.
    /// A file that does not parse is left untouched.
    pub fn save_theme(path: &Path, theme: Theme) -> Result<()> {
        let mut config = Self::load_from(path)?;
        config.theme = Some(theme.as_str().to_string());
        config.save_to(path)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("meeting-notes").join("config.json"))
    }

    pub fn theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(Theme::parse)
            .unwrap_or_default()
    }

    /// Backend URL: environment first, then the file, then the local default.
    pub fn backend_url(&self) -> String {
        std::env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn speech_language(&self) -> String {
        self.speech_language
            .clone()
            .unwrap_or_else(|| DEFAULT_SPEECH_LANGUAGE.to_string())
    }

    pub fn meeting_types(&self) -> Vec<String> {
        match &self.meeting_types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => DEFAULT_MEETING_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Where downloaded files land: configured dir, the OS download dir, or
    /// the working directory.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
