//! Bounded-concurrency digest pipeline.
//!
//! One run goes through these stages:
//! 1. fetch the work items from an [`ItemSource`]
//! 2. upload the reference documents once
//! 3. dispatch one worker task per item, at most `max_concurrent` of them
//!    inside the processor at any time
//! 4. drain the outcomes into a [`ResultSink`] and a [`DigestReport`]
//!
//! Setup failures abort the run. Item failures only show up in the report.

mod collector;
mod coordinator;
mod limiter;
mod processor;
mod prompts;
mod sink;
mod types;
mod worker;

pub use collector::ResultCollector;
pub use coordinator::Coordinator;
pub use limiter::{ConcurrencyLimiter, LimiterStatus, Slot};
pub use processor::{ItemProcessor, ProcessError, SummarizeAndVerify};
pub use prompts::{summarize_prompt, verify_prompt};
pub use sink::{sanitize_file_stem, MarkdownDirSink, MemorySink, ResultSink, SinkError};
pub use types::{
    DigestReport, ItemFailure, PipelineStage, TaskOutcome, WorkItem, WriteFailure,
};
pub use worker::run_worker;

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::llm::FileUploader;
use crate::playlist::{ItemSource, SourceError, VideoItem};
use crate::references::{prepare_references, ReferenceError, ReferenceSet};

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Failed to fetch work items: {0}")]
    Source(#[from] SourceError),

    #[error("Failed to prepare reference documents: {0}")]
    Reference(#[from] ReferenceError),
}

fn enter(stage: PipelineStage) {
    info!(stage = %stage, "Pipeline stage");
}

/// Runs the whole pipeline: fetch, upload, dispatch, drain.
///
/// Every item is attempted; the returned report says which ones failed.
pub async fn run_digest<Src, U, P, S>(
    config: &Config,
    source: &Src,
    uploader: &U,
    processor: Arc<P>,
    sink: Arc<S>,
) -> Result<DigestReport, DigestError>
where
    Src: ItemSource + ?Sized,
    U: FileUploader + ?Sized,
    P: ItemProcessor<VideoItem> + ?Sized + 'static,
    S: ResultSink + ?Sized + 'static,
{
    enter(PipelineStage::Idle);

    enter(PipelineStage::FetchingItems);
    let items = source.fetch_items().await?;
    info!(count = items.len(), "Fetched playlist items");

    let coordinator = Coordinator::new(processor, sink, config.pipeline.max_concurrent);

    if items.is_empty() {
        info!("No items to process, skipping reference upload");
        let report = coordinator.run(items, Arc::new(ReferenceSet::empty())).await;
        enter(PipelineStage::Done);
        return Ok(report);
    }

    enter(PipelineStage::UploadingReferences);
    let references = prepare_references(
        uploader,
        &config.references.dir,
        &config.references.extension,
        &config.references.mime_type,
    )
    .await?;

    enter(PipelineStage::Dispatching);
    let report = coordinator.run(items, Arc::new(references)).await;

    enter(PipelineStage::Done);
    Ok(report)
}
