//! Fans items out to worker tasks and waits for all of them.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info};

use super::collector::ResultCollector;
use super::limiter::{ConcurrencyLimiter, LimiterStatus};
use super::processor::ItemProcessor;
use super::sink::ResultSink;
use super::types::{DigestReport, PipelineStage, TaskOutcome, WorkItem};
use super::worker::run_worker;
use crate::references::ReferenceSet;

/// Dispatches one worker per item, bounded by a shared limiter.
pub struct Coordinator<P: ?Sized, S: ?Sized> {
    processor: Arc<P>,
    sink: Arc<S>,
    limiter: ConcurrencyLimiter,
}

impl<P: ?Sized, S: ResultSink + ?Sized + 'static> Coordinator<P, S> {
    pub fn new(processor: Arc<P>, sink: Arc<S>, max_concurrent: usize) -> Self {
        Self {
            processor,
            sink,
            limiter: ConcurrencyLimiter::new(max_concurrent),
        }
    }

    /// Limiter counters since the start of the latest run.
    pub fn limiter_status(&self) -> LimiterStatus {
        self.limiter.status()
    }

    /// Processes every item and returns the aggregate.
    ///
    /// Per-item failures end up in the report; they never abort the run or
    /// other in-flight items.
    pub async fn run<I>(&self, items: Vec<I>, references: Arc<ReferenceSet>) -> DigestReport
    where
        I: WorkItem,
        P: ItemProcessor<I> + 'static,
    {
        let started_at = Utc::now();
        let total_items = items.len();
        self.limiter.reset_stats();

        // every worker can deposit its outcome without waiting on the collector
        let (tx, rx) = mpsc::channel(total_items.max(1));
        let collector = ResultCollector::new(rx, Arc::clone(&self.sink));

        info!(
            items = total_items,
            max_concurrent = self.limiter.capacity(),
            "Dispatching workers"
        );

        let (mut report, ()) = tokio::join!(collector.run(), self.dispatch(items, references, tx));

        report.total_items = total_items;
        report.peak_in_flight = self.limiter.peak_in_flight();
        report.started_at = started_at;
        report.finished_at = Utc::now();

        info!(
            succeeded = report.results.len(),
            failed = report.failures.len(),
            write_failures = report.write_failures.len(),
            duration_ms = report.duration_ms(),
            "Digest finished"
        );

        report
    }

    /// Spawns the workers, waits for all of them, then closes the channel by
    /// dropping the last sender.
    async fn dispatch<I>(
        &self,
        items: Vec<I>,
        references: Arc<ReferenceSet>,
        tx: mpsc::Sender<TaskOutcome>,
    ) where
        I: WorkItem,
        P: ItemProcessor<I> + 'static,
    {
        let mut tasks = JoinSet::new();

        for item in items {
            let key = item.key();
            let item_id = item.id().to_string();
            let worker = run_worker(
                item,
                Arc::clone(&self.processor),
                Arc::clone(&references),
                self.limiter.clone(),
                tx.clone(),
            );
            let tx = tx.clone();

            // registered in the set before it can run, so draining the set
            // cannot finish early
            tasks.spawn(async move {
                if let Err(e) = tokio::spawn(worker).await {
                    error!(item_id = %item_id, key = %key, error = %e, "Worker task panicked");
                    let outcome =
                        TaskOutcome::failed(key, item_id, format!("Worker task panicked: {}", e));
                    if tx.send(outcome).await.is_err() {
                        error!("Failed to report panicked worker, collector is gone");
                    }
                }
            });
        }

        info!(stage = %PipelineStage::Draining, tasks = tasks.len(), "All workers launched");

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Worker supervisor failed");
            }
        }

        drop(tx);
    }
}
