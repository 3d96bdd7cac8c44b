//! Types flowing through the digest pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A unit of input processed by exactly one worker task.
pub trait WorkItem: Send + Sync + 'static {
    /// Key the result is stored under.
    fn key(&self) -> String;

    /// Stable identifier for logs and failure reports.
    fn id(&self) -> &str;
}

/// What a worker task reports back, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub key: String,
    pub item_id: String,
    /// Final text, or the reason processing failed
    pub result: Result<String, String>,
}

impl TaskOutcome {
    pub fn succeeded(key: impl Into<String>, item_id: impl Into<String>, text: String) -> Self {
        Self {
            key: key.into(),
            item_id: item_id.into(),
            result: Ok(text),
        }
    }

    pub fn failed(key: impl Into<String>, item_id: impl Into<String>, reason: String) -> Self {
        Self {
            key: key.into(),
            item_id: item_id.into(),
            result: Err(reason),
        }
    }
}

/// An item whose processing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub item_id: String,
    pub key: String,
    pub reason: String,
}

/// A result that was produced but could not be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteFailure {
    pub name: String,
    pub reason: String,
}

/// Aggregate of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestReport {
    /// Output name -> text, one entry per successfully processed item.
    ///
    /// Names come from the sink's artifact naming plus a ` (n)` suffix on
    /// collisions, so they can differ from the item key.
    pub results: BTreeMap<String, String>,
    /// Output name -> key of the item that produced it
    pub item_keys: BTreeMap<String, String>,
    pub failures: Vec<ItemFailure>,
    pub write_failures: Vec<WriteFailure>,
    pub total_items: usize,
    /// Most slots held at once during the run
    pub peak_in_flight: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl Default for DigestReport {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            results: BTreeMap::new(),
            item_keys: BTreeMap::new(),
            failures: Vec::new(),
            write_failures: Vec::new(),
            total_items: 0,
            peak_in_flight: 0,
            started_at: now,
            finished_at: now,
        }
    }
}

impl DigestReport {
    /// True when every item produced a result and every result was written.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
            && self.write_failures.is_empty()
            && self.results.len() == self.total_items
    }

    /// Output name of each result produced for `key`.
    pub fn names_for_key(&self, key: &str) -> Vec<&str> {
        self.item_keys
            .iter()
            .filter(|(_, k)| k.as_str() == key)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Stages of a whole run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    FetchingItems,
    UploadingReferences,
    Dispatching,
    Draining,
    Done,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::FetchingItems => "fetching_items",
            PipelineStage::UploadingReferences => "uploading_references",
            PipelineStage::Dispatching => "dispatching",
            PipelineStage::Draining => "draining",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}
