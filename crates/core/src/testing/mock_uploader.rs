//! Mock file uploader for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::llm::{FileUploader, LlmError, UploadedFile};

/// Mock implementation of the FileUploader trait.
///
/// Never touches the filesystem. Each upload gets a sequential resource
/// name and a display name equal to the file name.
#[derive(Debug, Clone, Default)]
pub struct MockUploader {
    uploaded: Arc<Mutex<Vec<PathBuf>>>,
    failing_files: Arc<Mutex<Vec<String>>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes uploads of files named `file_name` fail.
    pub fn fail_on(&self, file_name: impl Into<String>) {
        if let Ok(mut failing) = self.failing_files.lock() {
            failing.push(file_name.into());
        }
    }

    /// Paths uploaded successfully, in order.
    pub fn uploaded_paths(&self) -> Vec<PathBuf> {
        self.uploaded.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FileUploader for MockUploader {
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<UploadedFile, LlmError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let should_fail = self
            .failing_files
            .lock()
            .map(|f| f.contains(&file_name))
            .unwrap_or(false);
        if should_fail {
            return Err(LlmError::Api {
                status: 500,
                message: format!("upload of {} rejected", file_name),
            });
        }

        let mut uploaded = self
            .uploaded
            .lock()
            .map_err(|e| LlmError::Io(e.to_string()))?;
        uploaded.push(path.to_path_buf());
        let id = uploaded.len();

        Ok(UploadedFile {
            name: format!("files/mock{}", id),
            display_name: file_name,
            uri: format!("https://mock.files/v1beta/files/mock{}", id),
            mime_type: mime_type.to_string(),
        })
    }
}
