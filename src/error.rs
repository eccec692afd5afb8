use thiserror::Error;

/// Failures talking to the analysis backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Builds a `Status` error from a non-success response body.
    ///
    /// The backend reports failures as `{"error": "..."}`; anything else is
    /// kept verbatim.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or_else(|| body.trim().to_string());
        BackendError::Status { status, detail }
    }
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;
