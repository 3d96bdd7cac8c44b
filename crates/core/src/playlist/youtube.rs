//! YouTube Data API playlist client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::types::{PlaylistItemsPage, VideoItem};
use super::{ItemSource, SourceError};
use crate::config::YouTubeConfig;

/// Parts requested for every playlist item.
const PARTS: &str = "snippet,contentDetails";

/// Fetches every video of a playlist, following page tokens.
pub struct YouTubePlaylistSource {
    client: Client,
    base_url: String,
    api_key: String,
    playlist_id: String,
    page_size: u32,
}

impl YouTubePlaylistSource {
    /// Create a new playlist source.
    ///
    /// The configured timeout bounds each page request individually.
    pub fn new(config: &YouTubeConfig, api_key: impl Into<String>) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            playlist_id: config.playlist_id.clone(),
            page_size: config.page_size,
        })
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<PlaylistItemsPage, SourceError> {
        let url = format!("{}/playlistItems", self.base_url);
        let page_size = self.page_size.to_string();

        let mut request = self.client.get(&url).query(&[
            ("part", PARTS),
            ("playlistId", self.playlist_id.as_str()),
            ("key", self.api_key.as_str()),
            ("maxResults", page_size.as_str()),
        ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            SourceError::Parse(format!("Failed to parse playlist items response: {}", e))
        })
    }
}

#[async_trait]
impl ItemSource for YouTubePlaylistSource {
    async fn fetch_items(&self) -> Result<Vec<VideoItem>, SourceError> {
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(page_token.as_deref()).await?;
            pages += 1;

            debug!(
                playlist_id = %self.playlist_id,
                page = pages,
                items = page.items.len(),
                "Fetched playlist page"
            );

            for item in page.items {
                let video = VideoItem::from(item);
                if video.video_id.is_empty() {
                    warn!(title = %video.title, "Skipping playlist entry without a video id");
                    continue;
                }
                videos.push(video);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(videos)
    }
}
