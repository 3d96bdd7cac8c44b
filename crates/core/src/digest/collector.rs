//! Drains worker outcomes into a report and a sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::sink::ResultSink;
use super::types::{DigestReport, ItemFailure, TaskOutcome, WriteFailure};

/// Consumes outcomes until every sender is dropped.
pub struct ResultCollector<S: ?Sized> {
    rx: mpsc::Receiver<TaskOutcome>,
    sink: Arc<S>,
}

impl<S: ResultSink + ?Sized> ResultCollector<S> {
    pub fn new(rx: mpsc::Receiver<TaskOutcome>, sink: Arc<S>) -> Self {
        Self { rx, sink }
    }

    /// Runs until the channel is closed and drained.
    ///
    /// Outcomes arrive in completion order, not item order. A write failure
    /// is recorded and the next outcome is still processed.
    pub async fn run(mut self) -> DigestReport {
        let mut report = DigestReport::default();

        while let Some(outcome) = self.rx.recv().await {
            match outcome.result {
                Ok(text) => {
                    let base = self.sink.artifact_name(&outcome.key);
                    let name = distinct_name(&report.results, &base);
                    if name != base {
                        warn!(
                            item_id = %outcome.item_id,
                            key = %outcome.key,
                            name = %name,
                            "Result name already taken, storing under a suffixed name"
                        );
                    }

                    match self.sink.write(&name, &text).await {
                        Ok(()) => info!(item_id = %outcome.item_id, name = %name, "Result written"),
                        Err(e) => {
                            error!(item_id = %outcome.item_id, name = %name, error = %e, "Failed to write result");
                            report.write_failures.push(WriteFailure {
                                name: name.clone(),
                                reason: e.to_string(),
                            });
                        }
                    }

                    report.item_keys.insert(name.clone(), outcome.key);
                    report.results.insert(name, text);
                }
                Err(reason) => {
                    report.failures.push(ItemFailure {
                        item_id: outcome.item_id,
                        key: outcome.key,
                        reason,
                    });
                }
            }
        }

        report
    }
}

/// First of `base`, `base (2)`, `base (3)`, ... not already in `taken`.
fn distinct_name(taken: &BTreeMap<String, String>, base: &str) -> String {
    if !taken.contains_key(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", base, n);
        if !taken.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
