//! Gemini REST API client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use super::types::{GenerationRequest, GenerationResponse, Part, TokenUsage, UploadedFile};
use super::{FileUploader, LlmClient, LlmError};

/// Gemini API client.
///
/// No request timeout is set: generation over a full video can take minutes.
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            api_base: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    async fn api_error(response: reqwest::Response) -> LlmError {
        let status = response.status().as_u16();
        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GeminiError>(&error_text)
            .map(|e| e.error.message)
            .unwrap_or(error_text);
        LlmError::Api { status, message }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: GeminiFileData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    response_modalities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<GeminiThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiThinkingConfig {
    thinking_budget: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsage>,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    thoughts_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[derive(Debug, Serialize)]
struct UploadStartRequest {
    file: UploadStartFile,
}

#[derive(Debug, Serialize)]
struct UploadStartFile {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiFile {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    uri: String,
    mime_type: String,
}

impl From<Part> for GeminiPart {
    fn from(part: Part) -> Self {
        match part {
            Part::Text(text) => GeminiPart::Text { text },
            Part::FileData { mime_type, uri } => GeminiPart::File {
                file_data: GeminiFileData {
                    mime_type,
                    file_uri: uri,
                },
            },
        }
    }
}

impl GeminiResponse {
    /// Concatenates the non-thought text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}

fn build_request(request: GenerationRequest) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user".to_string(),
            parts: request.parts.into_iter().map(GeminiPart::from).collect(),
        }],
        generation_config: GeminiGenerationConfig {
            temperature: request.temperature,
            response_modalities: vec!["TEXT".to_string()],
            thinking_config: request
                .thinking_budget
                .map(|thinking_budget| GeminiThinkingConfig { thinking_budget }),
        },
    }
}

fn parse_response(body: &str, requested_model: &str) -> Result<GenerationResponse, LlmError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Json(e.to_string()))?;

    let text = response.text();
    if text.is_empty() {
        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
            .unwrap_or_else(|| "no text in first candidate".to_string());
        return Err(LlmError::EmptyResponse(reason));
    }

    let usage = response.usage_metadata.unwrap_or_default();
    Ok(GenerationResponse {
        text,
        usage: TokenUsage {
            prompt_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            thoughts_tokens: usage.thoughts_token_count,
        },
        model: response
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
    })
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let gemini_request = build_request(request);

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.api_base, self.model
            ))
            .query(&[("key", &self.api_key)])
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        parse_response(&body, &self.model)
    }
}

#[async_trait]
impl FileUploader for GeminiClient {
    /// Uploads through the resumable Files API: a `start` request that
    /// returns the session URL, then a single `upload, finalize` request.
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<UploadedFile, LlmError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| LlmError::Io(format!("{}: {}", path.display(), e)))?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        debug!(file = %path.display(), bytes = bytes.len(), "Starting file upload");

        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.api_base))
            .query(&[("key", &self.api_key)])
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadStartRequest {
                file: UploadStartFile {
                    display_name: display_name.clone(),
                },
            })
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        if !start.status().is_success() {
            return Err(Self::api_error(start).await);
        }

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| LlmError::Http("upload session URL missing from response".to_string()))?;

        let finish = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        if !finish.status().is_success() {
            return Err(Self::api_error(finish).await);
        }

        let uploaded: UploadResponse = finish
            .json()
            .await
            .map_err(|e| LlmError::Json(e.to_string()))?;

        Ok(UploadedFile {
            name: uploaded.file.name,
            display_name: uploaded.file.display_name.unwrap_or(display_name),
            uri: uploaded.file.uri,
            mime_type: uploaded.file.mime_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_client_creation() {
        let client = GeminiClient::new("key", "gemini-2.5-flash");
        assert_eq!(client.provider(), "gemini");
        assert_eq!(client.model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_gemini_client_custom_base_strips_slash() {
        let client = GeminiClient::new("key", "m").with_api_base("http://127.0.0.1:9000/");
        assert_eq!(client.api_base, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_request_serialization() {
        let request = GenerationRequest::new()
            .with_file("video/mp4", "https://www.youtube.com/watch?v=abc")
            .with_text("Summarize")
            .with_temperature(0.1)
            .with_thinking_budget(-1);

        let json = serde_json::to_value(build_request(request)).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(parts[0]["fileData"]["mimeType"], "video/mp4");
        assert_eq!(
            parts[0]["fileData"]["fileUri"],
            "https://www.youtube.com/watch?v=abc"
        );
        assert_eq!(parts[1]["text"], "Summarize");

        let config = &json["generationConfig"];
        assert_eq!(config["responseModalities"][0], "TEXT");
        assert_eq!(config["thinkingConfig"]["thinkingBudget"], -1);
    }

    #[test]
    fn test_request_without_thinking_budget_omits_config() {
        let json = serde_json::to_value(build_request(GenerationRequest::new().with_text("hi")))
            .unwrap();
        assert!(json["generationConfig"].get("thinkingConfig").is_none());
    }

    #[test]
    fn test_parse_response_skips_thought_parts() {
        let body = r##"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "pondering...", "thought": true},
                        {"text": "# Title\n"},
                        {"text": "body"}
                    ]
                }
            }],
            "usageMetadata": {
                "promptTokenCount": 100,
                "candidatesTokenCount": 20,
                "thoughtsTokenCount": 7
            },
            "modelVersion": "gemini-2.5-flash-001"
        }"##;

        let response = parse_response(body, "gemini-2.5-flash").unwrap();
        assert_eq!(response.text, "# Title\nbody");
        assert_eq!(response.usage.prompt_tokens, 100);
        assert_eq!(response.usage.output_tokens, 20);
        assert_eq!(response.usage.thoughts_tokens, 7);
        assert_eq!(response.model, "gemini-2.5-flash-001");
    }

    #[test]
    fn test_parse_blocked_response() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let err = parse_response(body, "m").unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse(ref reason) if reason == "SAFETY"));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_response("not json", "m").unwrap_err();
        assert!(matches!(err, LlmError::Json(_)));
    }
}
