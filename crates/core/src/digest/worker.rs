//! One worker task: process a single item under a limiter slot.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info};

use super::limiter::ConcurrencyLimiter;
use super::processor::ItemProcessor;
use super::types::{TaskOutcome, WorkItem};
use crate::references::ReferenceSet;

/// Processes `item` and reports the outcome on `tx`.
///
/// The slot is held only while the processor runs and is released before
/// the outcome is sent, on success, error and panic alike.
pub async fn run_worker<I, P>(
    item: I,
    processor: Arc<P>,
    references: Arc<ReferenceSet>,
    limiter: ConcurrencyLimiter,
    tx: mpsc::Sender<TaskOutcome>,
) where
    I: WorkItem,
    P: ItemProcessor<I> + ?Sized,
{
    let key = item.key();
    let item_id = item.id().to_string();

    let result = match limiter.acquire().await {
        Ok(_slot) => processor
            .process(&item, &references)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(format!("Concurrency limiter closed: {}", e)),
    };

    let outcome = match result {
        Ok(text) => {
            info!(item_id = %item_id, key = %key, chars = text.len(), "Item processed");
            TaskOutcome::succeeded(key, item_id, text)
        }
        Err(reason) => {
            error!(item_id = %item_id, key = %key, error = %reason, "Item failed");
            TaskOutcome::failed(key, item_id, reason)
        }
    };

    if let Err(e) = tx.send(outcome).await {
        error!(item_id = %e.0.item_id, "Failed to report outcome, collector is gone");
    }
}
