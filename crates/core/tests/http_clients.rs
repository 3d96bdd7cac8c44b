//! HTTP client integration tests.
//!
//! The YouTube and Gemini clients run against small axum servers standing in
//! for the real APIs:
//! - Playlist pagination, API errors, bad JSON and the fetch timeout
//! - generateContent request shape and response parsing
//! - The two-step resumable file upload

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

use tubedigest_core::{
    config::YouTubeConfig,
    llm::{FileUploader, GeminiClient, GenerationRequest, LlmClient, LlmError},
    playlist::{ItemSource, SourceError, YouTubePlaylistSource},
    references::prepare_references,
};

/// Binds a local port and returns the listener with its base URL.
async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

fn serve(listener: TcpListener, app: Router) {
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
}

// =============================================================================
// YouTube
// =============================================================================

#[derive(Clone, Default)]
struct YouTubeState {
    requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

fn playlist_entry(video_id: &str, title: &str, position: u32) -> Value {
    json!({
        "kind": "youtube#playlistItem",
        "snippet": {
            "title": title,
            "description": format!("About {}", title),
            "position": position,
            "thumbnails": { "standard": { "url": format!("https://i.ytimg.com/vi/{}/sddefault.jpg", video_id) } }
        },
        "contentDetails": {
            "videoId": video_id,
            "videoPublishedAt": "2021-03-01T10:00:00Z"
        }
    })
}

async fn playlist_items(
    State(state): State<YouTubeState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.requests.lock().unwrap().push(params.clone());

    if params.get("key").map(String::as_str) != Some("yt-key") {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "API key not valid" } })),
        )
            .into_response();
    }

    let page = match params.get("pageToken").map(String::as_str) {
        None => json!({
            "items": [
                playlist_entry("vid-1", "Introduction", 0),
                // private video: no id
                { "snippet": { "title": "Private video", "position": 1 }, "contentDetails": {} },
            ],
            "nextPageToken": "PAGE2"
        }),
        Some("PAGE2") => json!({
            "items": [playlist_entry("vid-3", "Goroutines", 2)],
            "nextPageToken": ""
        }),
        Some(_) => return StatusCode::BAD_REQUEST.into_response(),
    };
    Json(page).into_response()
}

async fn youtube_server() -> (String, YouTubeState) {
    let state = YouTubeState::default();
    let app = Router::new()
        .route("/playlistItems", get(playlist_items))
        .with_state(state.clone());
    let (listener, base) = bind().await;
    serve(listener, app);
    (base, state)
}

fn youtube_config(base_url: &str) -> YouTubeConfig {
    YouTubeConfig {
        base_url: base_url.to_string(),
        playlist_id: "PLtest".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_playlist_follows_pages_and_skips_missing_ids() {
    let (base, state) = youtube_server().await;
    let source = YouTubePlaylistSource::new(&youtube_config(&base), "yt-key").unwrap();

    let items = assert_ok!(source.fetch_items().await);

    let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Introduction", "Goroutines"]);
    assert_eq!(items[1].video_id, "vid-3");
    assert_eq!(items[1].position, 2);
    assert!(items[0].published_at.is_some());
    assert_eq!(
        items[0].thumbnail_url.as_deref(),
        Some("https://i.ytimg.com/vi/vid-1/sddefault.jpg")
    );

    let requests = state.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["playlistId"], "PLtest");
    assert_eq!(requests[0]["maxResults"], "50");
    assert_eq!(requests[0]["part"], "snippet,contentDetails");
    assert!(!requests[0].contains_key("pageToken"));
    assert_eq!(requests[1]["pageToken"], "PAGE2");
}

#[tokio::test]
async fn test_playlist_api_error() {
    let (base, _) = youtube_server().await;
    let source = YouTubePlaylistSource::new(&youtube_config(&base), "wrong-key").unwrap();

    let err = assert_err!(source.fetch_items().await);
    match err {
        SourceError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("API key not valid"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_playlist_bad_json() {
    let app = Router::new().route("/playlistItems", get(|| async { "not json" }));
    let (listener, base) = bind().await;
    serve(listener, app);

    let source = YouTubePlaylistSource::new(&youtube_config(&base), "yt-key").unwrap();
    let err = assert_err!(source.fetch_items().await);
    assert!(matches!(err, SourceError::Parse(_)));
}

#[tokio::test]
async fn test_playlist_fetch_times_out() {
    let app = Router::new().route(
        "/playlistItems",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({ "items": [] }))
        }),
    );
    let (listener, base) = bind().await;
    serve(listener, app);

    let mut config = youtube_config(&base);
    config.request_timeout_secs = 1;
    let source = YouTubePlaylistSource::new(&config, "yt-key").unwrap();

    let err = assert_err!(source.fetch_items().await);
    match err {
        SourceError::Http(e) => assert!(e.is_timeout()),
        other => panic!("unexpected error: {:?}", other),
    }
}

// =============================================================================
// Gemini
// =============================================================================

#[derive(Clone)]
struct GeminiState {
    base: String,
    generate_bodies: Arc<Mutex<Vec<Value>>>,
    upload_commands: Arc<Mutex<Vec<String>>>,
    uploaded_bytes: Arc<Mutex<Vec<Vec<u8>>>>,
}

async fn generate_content(
    State(state): State<GeminiState>,
    Path(call): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    state.generate_bodies.lock().unwrap().push(body.clone());

    if params.get("key").map(String::as_str) != Some("gm-key") {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "error": { "code": 429, "message": "Resource has been exhausted" } })),
        )
            .into_response();
    }

    let prompt = body["contents"][0]["parts"]
        .as_array()
        .and_then(|parts| parts.last())
        .and_then(|p| p["text"].as_str())
        .unwrap_or_default()
        .to_string();
    if prompt.contains("blocked") {
        return Json(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).into_response();
    }

    let model = call.trim_end_matches(":generateContent");
    Json(json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    { "text": "thinking about it", "thought": true },
                    { "text": "# Title\n" },
                    { "text": "## Summary\ndone" }
                ]
            }
        }],
        "usageMetadata": {
            "promptTokenCount": 1200,
            "candidatesTokenCount": 80,
            "thoughtsTokenCount": 300
        },
        "modelVersion": format!("{}-001", model)
    }))
    .into_response()
}

async fn start_upload(State(state): State<GeminiState>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let command = headers
        .get("x-goog-upload-command")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.upload_commands.lock().unwrap().push(command);

    let name = body["file"]["display_name"].as_str().unwrap_or("file").to_string();
    let session = format!("{}/upload-session/{}", state.base, name);
    (StatusCode::OK, [("x-goog-upload-url", session)]).into_response()
}

async fn finish_upload(
    State(state): State<GeminiState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let command = headers
        .get("x-goog-upload-command")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.upload_commands.lock().unwrap().push(command);
    state.uploaded_bytes.lock().unwrap().push(body.to_vec());

    if name.contains("broken") {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "message": "upload failed" } })),
        )
            .into_response();
    }

    Json(json!({
        "file": {
            "name": format!("files/{}", name.replace('.', "-")),
            "displayName": name,
            "uri": format!("https://generativelanguage.googleapis.com/v1beta/files/{}", name.replace('.', "-")),
            "mimeType": "application/pdf",
            "state": "ACTIVE"
        }
    }))
    .into_response()
}

async fn gemini_server() -> (String, GeminiState) {
    let (listener, base) = bind().await;
    let state = GeminiState {
        base: base.clone(),
        generate_bodies: Arc::default(),
        upload_commands: Arc::default(),
        uploaded_bytes: Arc::default(),
    };
    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate_content))
        .route("/upload/v1beta/files", post(start_upload))
        .route("/upload-session/{name}", post(finish_upload))
        .with_state(state.clone());
    serve(listener, app);
    (base, state)
}

#[tokio::test]
async fn test_generate_sends_parts_and_config() {
    let (base, state) = gemini_server().await;
    let client = GeminiClient::new("gm-key", "gemini-2.5-flash").with_api_base(format!("{}/", base));

    let request = GenerationRequest::new()
        .with_file("video/mp4", "https://www.youtube.com/watch?v=vid-1")
        .with_text("Summarize\n# Title")
        .with_temperature(0.1)
        .with_thinking_budget(-1);
    let response = assert_ok!(client.generate(request).await);

    assert_eq!(response.text, "# Title\n## Summary\ndone");
    assert_eq!(response.usage.prompt_tokens, 1200);
    assert_eq!(response.usage.output_tokens, 80);
    assert_eq!(response.usage.thoughts_tokens, 300);
    assert_eq!(response.model, "gemini-2.5-flash-001");

    let bodies = state.generate_bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["contents"][0]["role"], "user");
    assert_eq!(
        body["contents"][0]["parts"][0]["fileData"]["fileUri"],
        "https://www.youtube.com/watch?v=vid-1"
    );
    assert_eq!(body["contents"][0]["parts"][0]["fileData"]["mimeType"], "video/mp4");
    assert_eq!(body["contents"][0]["parts"][1]["text"], "Summarize\n# Title");
    assert_eq!(body["generationConfig"]["responseModalities"], json!(["TEXT"]));
    assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], -1);
}

#[tokio::test]
async fn test_generate_api_error_carries_message() {
    let (base, _) = gemini_server().await;
    let client = GeminiClient::new("bad-key", "gemini-2.5-flash").with_api_base(base);

    let err = assert_err!(client.generate(GenerationRequest::new().with_text("hi")).await);
    match err {
        LlmError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_generate_blocked_prompt() {
    let (base, _) = gemini_server().await;
    let client = GeminiClient::new("gm-key", "gemini-2.5-flash").with_api_base(base);

    let err = assert_err!(
        client
            .generate(GenerationRequest::new().with_text("this is blocked"))
            .await
    );
    assert!(matches!(err, LlmError::EmptyResponse(ref reason) if reason == "SAFETY"));
}

#[tokio::test]
async fn test_resumable_upload() {
    let (base, state) = gemini_server().await;
    let client = GeminiClient::new("gm-key", "gemini-2.5-flash").with_api_base(base);

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("go1.16.pdf");
    std::fs::write(&path, b"%PDF-1.7 release notes").unwrap();

    let uploaded = assert_ok!(client.upload(&path, "application/pdf").await);

    assert_eq!(uploaded.name, "files/go1-16-pdf");
    assert_eq!(uploaded.display_name, "go1.16.pdf");
    assert_eq!(uploaded.mime_type, "application/pdf");
    assert!(uploaded.uri.ends_with("/files/go1-16-pdf"));

    let commands = state.upload_commands.lock().unwrap().clone();
    assert_eq!(commands, vec!["start", "upload, finalize"]);
    assert_eq!(
        state.uploaded_bytes.lock().unwrap()[0],
        b"%PDF-1.7 release notes".to_vec()
    );
}

#[tokio::test]
async fn test_upload_missing_file() {
    let (base, _) = gemini_server().await;
    let client = GeminiClient::new("gm-key", "gemini-2.5-flash").with_api_base(base);

    let err = assert_err!(
        client
            .upload(std::path::Path::new("/nonexistent/go1.16.pdf"), "application/pdf")
            .await
    );
    assert!(matches!(err, LlmError::Io(_)));
}

#[tokio::test]
async fn test_prepare_references_through_gemini() {
    let (base, _) = gemini_server().await;
    let client = GeminiClient::new("gm-key", "gemini-2.5-flash").with_api_base(base);

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("go1.17.pdf"), b"%PDF").unwrap();
    std::fs::write(dir.path().join("go1.16.pdf"), b"%PDF").unwrap();
    std::fs::write(dir.path().join("README.md"), b"notes").unwrap();

    let references = assert_ok!(
        prepare_references(&client, dir.path(), "pdf", "application/pdf").await
    );

    let names: Vec<_> = references.documents().iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["go1.16.pdf", "go1.17.pdf"]);
}

#[tokio::test]
async fn test_prepare_references_stops_on_failed_upload() {
    let (base, state) = gemini_server().await;
    let client = GeminiClient::new("gm-key", "gemini-2.5-flash").with_api_base(base);

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a-broken.pdf"), b"%PDF").unwrap();
    std::fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();

    let result = prepare_references(&client, dir.path(), "pdf", "application/pdf").await;
    assert!(result.is_err());
    // only the failing file was attempted
    assert_eq!(state.uploaded_bytes.lock().unwrap().len(), 1);
}
