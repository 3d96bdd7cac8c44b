//! The per-item processing function.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::prompts::{summarize_prompt, verify_prompt};
use super::types::WorkItem;
use crate::config::{GenerationSettings, PromptConfig};
use crate::llm::{GenerationRequest, GenerationResponse, LlmClient, LlmError};
use crate::playlist::VideoItem;
use crate::references::ReferenceSet;

/// MIME type Gemini expects for YouTube URLs.
const VIDEO_MIME_TYPE: &str = "video/mp4";

/// Errors from processing a single item.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Summarization failed: {0}")]
    Summarize(#[source] LlmError),

    #[error("Verification failed: {0}")]
    Verify(#[source] LlmError),

    #[error("{0}")]
    Other(String),
}

/// Turns one work item into its final text.
#[async_trait]
pub trait ItemProcessor<I: WorkItem>: Send + Sync {
    async fn process(&self, item: &I, references: &ReferenceSet) -> Result<String, ProcessError>;
}

/// Summarizes a video, then fact-checks the summary against the references.
///
/// The two calls are sequential: the second prompt embeds the first answer.
pub struct SummarizeAndVerify<L: ?Sized> {
    llm: Arc<L>,
    prompt: PromptConfig,
    summarize: GenerationSettings,
    verify: GenerationSettings,
}

impl<L: LlmClient + ?Sized> SummarizeAndVerify<L> {
    pub fn new(
        llm: Arc<L>,
        prompt: PromptConfig,
        summarize: GenerationSettings,
        verify: GenerationSettings,
    ) -> Self {
        Self {
            llm,
            prompt,
            summarize,
            verify,
        }
    }

    fn summarize_request(&self, item: &VideoItem) -> GenerationRequest {
        GenerationRequest::new()
            .with_file(VIDEO_MIME_TYPE, item.watch_url())
            .with_text(summarize_prompt(&self.prompt, &item.title))
            .with_temperature(self.summarize.temperature)
            .with_thinking_budget(self.summarize.thinking_budget)
    }

    fn verify_request(
        &self,
        item: &VideoItem,
        summary: &str,
        references: &ReferenceSet,
    ) -> GenerationRequest {
        let mut request = GenerationRequest::new();
        for (i, doc) in references.documents().iter().enumerate() {
            request = request
                .with_text(format!("[{}] {}", i + 1, doc.name))
                .with_file(doc.mime_type.clone(), doc.uri.clone());
        }
        request
            .with_text(verify_prompt(&self.prompt, &item.title, summary))
            .with_temperature(self.verify.temperature)
            .with_thinking_budget(self.verify.thinking_budget)
    }
}

fn log_usage(stage: &str, item: &VideoItem, response: &GenerationResponse) {
    info!(
        video_id = %item.video_id,
        stage,
        chars = response.text.len(),
        thoughts_tokens = response.usage.thoughts_tokens,
        output_tokens = response.usage.output_tokens,
        "Received response"
    );
}

#[async_trait]
impl<L: LlmClient + ?Sized> ItemProcessor<VideoItem> for SummarizeAndVerify<L> {
    async fn process(
        &self,
        item: &VideoItem,
        references: &ReferenceSet,
    ) -> Result<String, ProcessError> {
        info!(video_id = %item.video_id, title = %item.title, model = self.llm.model(), "Requesting summary");
        let summary = self
            .llm
            .generate(self.summarize_request(item))
            .await
            .map_err(ProcessError::Summarize)?;
        log_usage("summarize", item, &summary);

        info!(video_id = %item.video_id, references = references.len(), "Requesting verification");
        let verified = self
            .llm
            .generate(self.verify_request(item, &summary.text, references))
            .await
            .map_err(ProcessError::Verify)?;
        log_usage("verify", item, &verified);

        Ok(verified.text)
    }
}
