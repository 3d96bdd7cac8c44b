use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConfigError;

/// Environment variable consulted when `youtube.api_key` is not set.
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Environment variable consulted when `llm.api_key` is not set.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub youtube: YouTubeConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub references: ReferencesConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// YouTube Data API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YouTubeConfig {
    /// API key. Falls back to `YOUTUBE_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Playlist to digest
    #[serde(default = "default_playlist_id")]
    pub playlist_id: String,
    #[serde(default = "default_youtube_base_url")]
    pub base_url: String,
    /// Items requested per page (the API caps this at 50)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Timeout applied to each playlist page request
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            playlist_id: default_playlist_id(),
            base_url: default_youtube_base_url(),
            page_size: default_page_size(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl YouTubeConfig {
    /// Returns the configured API key, falling back to the environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_credential(self.api_key.as_deref(), "youtube.api_key", YOUTUBE_API_KEY_ENV)
    }
}

fn default_playlist_id() -> String {
    "PLoILbKo9rG3skRCj37Kn5Zj803hhiuRK6".to_string()
}

fn default_youtube_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_request_timeout() -> u64 {
    10
}

/// Sampling settings for one of the two generation calls
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GenerationSettings {
    pub temperature: f32,
    /// Thinking token budget. `-1` lets the model decide.
    pub thinking_budget: i32,
}

/// LLM (Gemini) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// API key. Falls back to `GEMINI_API_KEY` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,
    /// Settings for the summarization call
    #[serde(default = "default_summarize_settings")]
    pub summarize: GenerationSettings,
    /// Settings for the fact-check call
    #[serde(default = "default_validate_settings")]
    pub validate: GenerationSettings,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_base: default_llm_api_base(),
            summarize: default_summarize_settings(),
            validate: default_validate_settings(),
        }
    }
}

impl LlmConfig {
    /// Returns the configured API key, falling back to the environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_credential(self.api_key.as_deref(), "llm.api_key", GEMINI_API_KEY_ENV)
    }
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_summarize_settings() -> GenerationSettings {
    GenerationSettings {
        temperature: 0.1,
        thinking_budget: -1,
    }
}

fn default_validate_settings() -> GenerationSettings {
    GenerationSettings {
        temperature: 0.0,
        thinking_budget: 24576,
    }
}

/// Subject matter the prompts are written for
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    /// Version the course material was recorded with
    #[serde(default = "default_recorded_with")]
    pub recorded_with: String,
    /// What the reference documents are, as named in the prompt
    #[serde(default = "default_reference_label")]
    pub reference_label: String,
    /// Version the key points are checked against
    #[serde(default = "default_latest_version")]
    pub latest_version: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            recorded_with: default_recorded_with(),
            reference_label: default_reference_label(),
            latest_version: default_latest_version(),
        }
    }
}

fn default_topic() -> String {
    "Go programming".to_string()
}

fn default_recorded_with() -> String {
    "Go 1.15".to_string()
}

fn default_reference_label() -> String {
    "Go release notes".to_string()
}

fn default_latest_version() -> String {
    "Go 1.24".to_string()
}

/// Reference documents uploaded before dispatch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReferencesConfig {
    #[serde(default = "default_references_dir")]
    pub dir: PathBuf,
    /// File extension to pick up (case-insensitive, without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            dir: default_references_dir(),
            extension: default_extension(),
            mime_type: default_mime_type(),
        }
    }
}

fn default_references_dir() -> PathBuf {
    PathBuf::from("./releasenote")
}

fn default_extension() -> String {
    "pdf".to_string()
}

fn default_mime_type() -> String {
    "application/pdf".to_string()
}

/// Pipeline concurrency and failure policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Maximum videos processed at once (LLM calls in flight)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    /// Exit non-zero when any video failed to process
    #[serde(default)]
    pub fail_on_item_error: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            fail_on_item_error: false,
        }
    }
}

fn default_max_concurrent() -> usize {
    5
}

/// Where the Markdown files go
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("markdown")
}

fn resolve_credential(
    configured: Option<&str>,
    key: &str,
    env_var: &str,
) -> Result<String, ConfigError> {
    if let Some(value) = configured.filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }
    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingCredential {
            key: key.to_string(),
            env_var: env_var.to_string(),
        }),
    }
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub youtube: SanitizedYouTubeConfig,
    pub llm: SanitizedLlmConfig,
    pub references: ReferencesConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedYouTubeConfig {
    pub playlist_id: String,
    pub base_url: String,
    pub api_key_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedLlmConfig {
    pub model: String,
    pub api_base: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            youtube: SanitizedYouTubeConfig {
                playlist_id: config.youtube.playlist_id.clone(),
                base_url: config.youtube.base_url.clone(),
                api_key_configured: config.youtube.resolve_api_key().is_ok(),
            },
            llm: SanitizedLlmConfig {
                model: config.llm.model.clone(),
                api_base: config.llm.api_base.clone(),
                api_key_configured: config.llm.resolve_api_key().is_ok(),
            },
            references: config.references.clone(),
            pipeline: config.pipeline.clone(),
            output: config.output.clone(),
        }
    }
}
