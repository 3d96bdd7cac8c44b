//! LLM client abstraction.
//!
//! The pipeline talks to the model through two seams:
//! - [`LlmClient`] sends a multi-part generation request and returns text
//! - [`FileUploader`] stores a local file with the provider so later
//!   requests can reference it by URI
//!
//! [`GeminiClient`] implements both against the Gemini REST API.

mod gemini;
mod types;

pub use gemini::GeminiClient;
pub use types::{GenerationRequest, GenerationResponse, Part, TokenUsage, UploadedFile};

use async_trait::async_trait;
use std::path::Path;

/// Error type for LLM operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Trait for LLM clients.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name (e.g., "gemini")
    fn provider(&self) -> &str;

    /// Model name (e.g., "gemini-2.5-flash")
    fn model(&self) -> &str;

    /// Send a generation request and get a text response.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Trait for uploading files the model can read by URI.
#[async_trait]
pub trait FileUploader: Send + Sync {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<UploadedFile, LlmError>;
}
