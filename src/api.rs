use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{BackendError, BackendResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub meeting_text: String,
    pub meeting_title: String,
    pub meeting_type: String,
}

/// Structured analysis returned by `/analyze`.
///
/// Fields the backend leaves out fall back to empty values so a partial
/// answer still renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub meeting_title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub decisions: Vec<String>,
    pub action_items: Vec<String>,
    #[serde(deserialize_with = "lenient_score")]
    pub confidence: f64,
}

/// The score comes from model output, so accept a number, a numeric string
/// such as `"85"` or `"85%"`, and treat anything else as 0.
fn lenient_score<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim_end().parse::<f64>().ok(),
        _ => None,
    };
    Ok(score.filter(|score| score.is_finite()).unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub notes: String,
}

#[derive(Deserialize)]
struct ChatReply {
    answer: String,
}

#[derive(Deserialize)]
struct TranscribeReply {
    text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportPdfRequest {
    pub summary: String,
}

/// The four round trips the client makes against the analysis backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn analyze(&self, request: &AnalyzeRequest) -> BackendResult<AnalysisResult>;

    /// Uploads an audio file and returns the transcript text.
    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> BackendResult<String>;

    async fn chat(&self, request: &ChatRequest) -> BackendResult<String>;

    /// Returns the raw PDF bytes.
    async fn export_pdf(&self, request: &ExportPdfRequest) -> BackendResult<Vec<u8>>;
}

#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> BackendResult<Response> {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        check_status(response).await
    }
}

async fn check_status(response: Response) -> BackendResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::from_status(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| BackendError::Decode(e.to_string()))
}

/// MIME type for an uploaded recording, from its extension.
pub fn audio_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn analyze(&self, request: &AnalyzeRequest) -> BackendResult<AnalysisResult> {
        let response = self.post_json("/analyze", request).await?;
        decode(response).await
    }

    async fn transcribe(&self, file_name: &str, audio: Vec<u8>) -> BackendResult<String> {
        let part = multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(audio_mime(file_name))?;
        let form = multipart::Form::new().part("audio", part);

        let response = self
            .client
            .post(self.url("/transcribe"))
            .multipart(form)
            .send()
            .await?;
        let reply: TranscribeReply = decode(check_status(response).await?).await?;
        Ok(reply.text)
    }

    async fn chat(&self, request: &ChatRequest) -> BackendResult<String> {
        let response = self.post_json("/chat", request).await?;
        let reply: ChatReply = decode(response).await?;
        Ok(reply.answer)
    }

    async fn export_pdf(&self, request: &ExportPdfRequest) -> BackendResult<Vec<u8>> {
        let response = self.post_json("/export-pdf", request).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
