//! Request and response types shared by LLM clients.

use serde::{Deserialize, Serialize};

/// One piece of a multi-part prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    /// Plain text
    Text(String),
    /// Content the provider fetches by URI (an uploaded file, a video URL)
    FileData { mime_type: String, uri: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn file(mime_type: impl Into<String>, uri: impl Into<String>) -> Self {
        Part::FileData {
            mime_type: mime_type.into(),
            uri: uri.into(),
        }
    }

    /// Returns the text of a text part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::FileData { .. } => None,
        }
    }
}

/// Request for a generation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Prompt parts, sent in order as a single user turn
    pub parts: Vec<Part>,
    /// Temperature (0.0 = deterministic)
    pub temperature: f32,
    /// Thinking token budget, `-1` for dynamic. `None` leaves it to the provider.
    pub thinking_budget: Option<i32>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationRequest {
    pub fn new() -> Self {
        Self {
            parts: Vec::new(),
            temperature: 0.0,
            thinking_budget: None,
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_part(Part::text(text))
    }

    pub fn with_file(self, mime_type: impl Into<String>, uri: impl Into<String>) -> Self {
        self.with_part(Part::file(mime_type, uri))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_thinking_budget(mut self, budget: i32) -> Self {
        self.thinking_budget = Some(budget);
        self
    }

    /// All text parts joined with newlines.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    pub thoughts_tokens: u32,
}

/// Response from a generation.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    /// The generated text (thought parts excluded)
    pub text: String,
    /// Token usage
    pub usage: TokenUsage,
    /// Model used
    pub model: String,
}

/// A file stored with the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Provider resource name (e.g. "files/abc123")
    pub name: String,
    /// Human-readable name given at upload time
    pub display_name: String,
    /// URI to reference the file in requests
    pub uri: String,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_builder() {
        let request = GenerationRequest::new()
            .with_file("video/mp4", "https://www.youtube.com/watch?v=abc")
            .with_text("Summarize")
            .with_temperature(0.1)
            .with_thinking_budget(-1);

        assert_eq!(request.parts.len(), 2);
        assert_eq!(
            request.parts[0],
            Part::file("video/mp4", "https://www.youtube.com/watch?v=abc")
        );
        assert_eq!(request.temperature, 0.1);
        assert_eq!(request.thinking_budget, Some(-1));
    }

    #[test]
    fn test_prompt_text_skips_file_parts() {
        let request = GenerationRequest::new()
            .with_text("[1] notes.pdf")
            .with_file("application/pdf", "files/1")
            .with_text("Check this");

        assert_eq!(request.prompt_text(), "[1] notes.pdf\nCheck this");
    }
}
