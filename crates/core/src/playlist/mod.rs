//! Item source: the videos of a YouTube playlist.

mod types;
mod youtube;

pub use types::VideoItem;
pub use youtube::YouTubePlaylistSource;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while enumerating work items.
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Produces the ordered list of videos to digest.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<VideoItem>, SourceError>;
}

/// Source returning a fixed list of videos.
#[derive(Debug, Clone, Default)]
pub struct StaticItemSource {
    items: Vec<VideoItem>,
}

impl StaticItemSource {
    pub fn new(items: Vec<VideoItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemSource for StaticItemSource {
    async fn fetch_items(&self) -> Result<Vec<VideoItem>, SourceError> {
        Ok(self.items.clone())
    }
}
