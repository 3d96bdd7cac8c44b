//! Reference documents shared read-only with every worker.
//!
//! Collected and uploaded once, before any worker starts.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
use walkdir::WalkDir;

use crate::llm::{FileUploader, LlmError};

/// Errors from the reference setup phase. All of them are fatal.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("Failed to read reference directory {path}: {message}")]
    Walk { path: PathBuf, message: String },

    #[error("Failed to upload reference {path}")]
    Upload {
        path: PathBuf,
        #[source]
        source: LlmError,
    },
}

/// One uploaded reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDocument {
    /// Display name, used when citing the document
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub source_path: PathBuf,
}

/// Immutable, ordered set of reference documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    documents: Vec<ReferenceDocument>,
}

impl ReferenceSet {
    pub fn new(documents: Vec<ReferenceDocument>) -> Self {
        Self { documents }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[ReferenceDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Finds every file under `dir` with the given extension, sorted by path.
///
/// The extension is matched case-insensitively and without the leading dot.
pub fn collect_reference_paths(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, ReferenceError> {
    let wanted = extension.trim_start_matches('.').to_ascii_lowercase();
    let mut paths = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|e| ReferenceError::Walk {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.to_path_buf()),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase() == wanted)
            .unwrap_or(false);
        if matches {
            paths.push(entry.into_path());
        }
    }

    paths.sort();
    Ok(paths)
}

/// Uploads each path in order. Stops at the first failure.
pub async fn upload_references<U: FileUploader + ?Sized>(
    uploader: &U,
    paths: &[PathBuf],
    mime_type: &str,
) -> Result<ReferenceSet, ReferenceError> {
    let mut documents = Vec::with_capacity(paths.len());

    for path in paths {
        let uploaded = uploader
            .upload(path, mime_type)
            .await
            .map_err(|source| ReferenceError::Upload {
                path: path.clone(),
                source,
            })?;

        info!(file = %path.display(), uri = %uploaded.uri, "Uploaded reference document");

        documents.push(ReferenceDocument {
            name: uploaded.display_name,
            uri: uploaded.uri,
            mime_type: uploaded.mime_type,
            source_path: path.clone(),
        });
    }

    info!(count = documents.len(), "Uploaded all reference documents");
    Ok(ReferenceSet::new(documents))
}

/// Collects and uploads the reference documents under `dir`.
pub async fn prepare_references<U: FileUploader + ?Sized>(
    uploader: &U,
    dir: &Path,
    extension: &str,
    mime_type: &str,
) -> Result<ReferenceSet, ReferenceError> {
    let paths = collect_reference_paths(dir, extension)?;
    info!(dir = %dir.display(), count = paths.len(), "Found reference documents");
    upload_references(uploader, &paths, mime_type).await
}
