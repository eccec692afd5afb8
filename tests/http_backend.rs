//! Runs `HttpBackend` against an in-process fake of the analysis backend.

use std::time::Duration;

use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use meeting_notes::{AnalyzeRequest, Backend, BackendError, ChatRequest, ExportPdfRequest, HttpBackend};

async fn analyze(Json(body): Json<Value>) -> Response {
    let text = body["meeting_text"].as_str().unwrap_or_default();
    if text.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "No meeting text provided"}))).into_response();
    }
    if text == "garbage" {
        return "not json".into_response();
    }
    Json(json!({
        "meeting_title": body["meeting_title"],
        "summary": format!("{} meeting about {}", body["meeting_type"].as_str().unwrap_or_default(), text),
        "key_points": ["Reduce spend"],
        "decisions": [],
        "action_items": ["Follow up with finance"],
        "confidence": 75
    }))
    .into_response()
}

async fn chat(Json(body): Json<Value>) -> Json<Value> {
    let answer = format!(
        "{} / {}",
        body["question"].as_str().unwrap_or_default(),
        body["notes"].as_str().unwrap_or_default()
    );
    Json(json!({ "answer": answer }))
}

async fn transcribe(mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("audio") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap_or_default();
            return Json(json!({ "text": format!("{name}:{}", bytes.len()) })).into_response();
        }
    }
    (StatusCode::BAD_REQUEST, "missing audio field").into_response()
}

async fn export_pdf(Json(body): Json<Value>) -> Response {
    let summary = body["summary"].as_str().unwrap_or_default();
    if summary.is_empty() {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "empty summary"}))).into_response();
    }
    (
        [(header::CONTENT_TYPE, "application/pdf")],
        format!("%PDF-1.4 {summary}").into_bytes(),
    )
        .into_response()
}

async fn spawn_backend() -> HttpBackend {
    let app = Router::new()
        .route("/analyze", post(analyze))
        .route("/chat", post(chat))
        .route("/transcribe", post(transcribe))
        .route("/export-pdf", post(export_pdf));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    HttpBackend::new(&format!("http://{addr}/"), Duration::from_secs(10)).unwrap()
}

#[tokio::test]
async fn test_analyze_round_trip() {
    let backend = spawn_backend().await;
    let result = backend
        .analyze(&AnalyzeRequest {
            meeting_text: "Discuss Q3 budget".to_string(),
            meeting_title: "Untitled Meeting".to_string(),
            meeting_type: "standup".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(result.meeting_title, "Untitled Meeting");
    assert_eq!(result.summary, "standup meeting about Discuss Q3 budget");
    assert_eq!(result.key_points, vec!["Reduce spend"]);
    assert!(result.decisions.is_empty());
    assert_eq!(result.confidence, 75.0);
}

#[tokio::test]
async fn test_analyze_error_body_is_reported() {
    let backend = spawn_backend().await;
    let err = backend
        .analyze(&AnalyzeRequest {
            meeting_text: String::new(),
            meeting_title: "Untitled Meeting".to_string(),
            meeting_type: "general".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        BackendError::Status { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "No meeting text provided");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_analyze_malformed_body_is_decode_error() {
    let backend = spawn_backend().await;
    let err = backend
        .analyze(&AnalyzeRequest {
            meeting_text: "garbage".to_string(),
            meeting_title: "x".to_string(),
            meeting_type: "general".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Decode(_)));
}

#[tokio::test]
async fn test_chat_sends_question_and_notes() {
    let backend = spawn_backend().await;
    let answer = backend
        .chat(&ChatRequest {
            question: "Who follows up?".to_string(),
            notes: "Finance follows up".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(answer, "Who follows up? / Finance follows up");
}

#[tokio::test]
async fn test_transcribe_uploads_audio_field() {
    let backend = spawn_backend().await;
    let text = backend
        .transcribe("standup.mp3", vec![0u8; 42])
        .await
        .unwrap();
    assert_eq!(text, "standup.mp3:42");
}

#[tokio::test]
async fn test_export_pdf_returns_bytes() {
    let backend = spawn_backend().await;
    let pdf = backend
        .export_pdf(&ExportPdfRequest {
            summary: "Budget trimmed".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(pdf, b"%PDF-1.4 Budget trimmed");

    let err = backend
        .export_pdf(&ExportPdfRequest { summary: String::new() })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_unreachable_backend_is_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap();
    let err = backend
        .chat(&ChatRequest {
            question: "hello".to_string(),
            notes: String::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Http(_)));
}
