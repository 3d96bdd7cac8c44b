//! Playlist item types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::WorkItem;

/// One video of the playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoItem {
    pub video_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Zero-based position in the playlist
    #[serde(default)]
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl VideoItem {
    pub fn new(video_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            description: String::new(),
            position: 0,
            published_at: None,
            thumbnail_url: None,
        }
    }

    /// Public watch page, which Gemini accepts as video input.
    pub fn watch_url(&self) -> String {
        format!(
            "https://www.youtube.com/watch?v={}",
            urlencoding::encode(&self.video_id)
        )
    }
}

impl WorkItem for VideoItem {
    fn key(&self) -> String {
        self.title.clone()
    }

    fn id(&self) -> &str {
        &self.video_id
    }
}

/// One page of the playlistItems endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistItemsPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PlaylistItem {
    #[serde(default)]
    pub snippet: Snippet,
    #[serde(default)]
    pub content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Snippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    #[serde(default)]
    pub position: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Thumbnails {
    #[serde(default)]
    pub standard: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ContentDetails {
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub video_published_at: Option<DateTime<Utc>>,
}

impl From<PlaylistItem> for VideoItem {
    fn from(item: PlaylistItem) -> Self {
        Self {
            video_id: item.content_details.video_id,
            title: item.snippet.title,
            description: item.snippet.description,
            position: item.snippet.position,
            published_at: item.content_details.video_published_at,
            thumbnail_url: item.snippet.thumbnails.standard.map(|t| t.url),
        }
    }
}
