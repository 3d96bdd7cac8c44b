//! Destinations for finished results.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Characters that cannot appear in a file name on common filesystems.
static UNSAFE_FILENAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\\x00-\x1F]").expect("valid filename regex"));

/// Errors that can occur while persisting a result.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink rejected {name}: {reason}")]
    Rejected { name: String, reason: String },
}

/// Receives one (name, text) pair per successful item.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Name `key` is stored under. Keys mapping to the same name collide.
    fn artifact_name(&self, key: &str) -> String {
        key.to_string()
    }

    async fn write(&self, name: &str, text: &str) -> Result<(), SinkError>;
}

/// Replaces path separators and control characters with `_`.
///
/// An empty (or all-whitespace) key becomes `untitled`.
pub fn sanitize_file_stem(key: &str) -> String {
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(key.trim(), "_");
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.into_owned()
    }
}

/// Writes each result to `<dir>/<name>.md`.
///
/// A file left in `dir` by an earlier run is replaced. Names are only kept
/// distinct within a single run.
#[derive(Debug, Clone)]
pub struct MarkdownDirSink {
    dir: PathBuf,
}

impl MarkdownDirSink {
    /// Creates the output directory and returns a sink writing into it.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self, SinkError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| SinkError::Io {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.md", name))
    }
}

#[async_trait]
impl ResultSink for MarkdownDirSink {
    fn artifact_name(&self, key: &str) -> String {
        sanitize_file_stem(key)
    }

    async fn write(&self, name: &str, text: &str) -> Result<(), SinkError> {
        let path = self.path_for(name);
        tokio::fs::write(&path, text)
            .await
            .map_err(|source| SinkError::Io { path, source })
    }
}

/// Keeps results in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    writes: Arc<Mutex<Vec<String>>>,
    failing_names: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes writes for `name` fail.
    pub fn fail_on(&self, name: impl Into<String>) {
        if let Ok(mut failing) = self.failing_names.lock() {
            failing.push(name.into());
        }
    }

    pub fn entries(&self) -> BTreeMap<String, String> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Names in the order they were written, including overwrites.
    pub fn write_log(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn write(&self, name: &str, text: &str) -> Result<(), SinkError> {
        let should_fail = self
            .failing_names
            .lock()
            .map(|f| f.iter().any(|n| n == name))
            .unwrap_or(false);
        if should_fail {
            return Err(SinkError::Rejected {
                name: name.to_string(),
                reason: "configured to fail".to_string(),
            });
        }

        if let Ok(mut writes) = self.writes.lock() {
            writes.push(name.to_string());
        }
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(name.to_string(), text.to_string());
        }
        Ok(())
    }
}
