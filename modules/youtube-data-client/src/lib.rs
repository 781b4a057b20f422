pub mod error;
pub mod types;

pub use error::{Result, YouTubeApiError};
pub use types::*;

use std::time::Duration;

use serde::de::DeserializeOwned;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

pub struct YouTubeDataClient {
    client: reqwest::Client,
    api_key: String,
}

impl YouTubeDataClient {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{BASE_URL}/{resource}");
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(YouTubeApiError::classify(status.as_u16(), body));
        }

        Ok(resp.json().await?)
    }

    /// Fetch channel metadata, statistics, and the uploads playlist id.
    pub async fn get_channel(&self, channel_id: &str) -> Result<Option<ChannelResource>> {
        let resp: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "snippet,contentDetails,statistics"),
                    ("id", channel_id),
                ],
            )
            .await?;
        Ok(resp.items.into_iter().next())
    }

    /// Resolve a legacy /user/ username to its channel resource.
    pub async fn get_channel_by_username(&self, username: &str) -> Result<Option<ChannelResource>> {
        let resp: ChannelListResponse = self
            .get_json(
                "channels",
                &[
                    ("part", "snippet,contentDetails,statistics"),
                    ("forUsername", username),
                ],
            )
            .await?;
        Ok(resp.items.into_iter().next())
    }

    /// One page of upload-playlist entries, newest first.
    pub async fn list_playlist_items(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<(Vec<PlaylistItemResource>, Option<String>)> {
        let max = max_results.min(MAX_RESULTS_PER_PAGE).to_string();
        let mut params = vec![
            ("part", "contentDetails,snippet"),
            ("playlistId", playlist_id),
            ("maxResults", max.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let resp: PlaylistItemListResponse = self.get_json("playlistItems", &params).await?;
        tracing::debug!(
            playlist_id,
            count = resp.items.len(),
            has_next = resp.next_page_token.is_some(),
            "Playlist page fetched"
        );
        Ok((resp.items, resp.next_page_token))
    }

    /// Statistics, snippet, duration, and live details for up to 50 ids.
    /// Ids beyond the platform's batching ceiling are ignored; callers batch.
    pub async fn list_videos(&self, video_ids: &[String]) -> Result<Vec<VideoResource>> {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }
        let batch = &video_ids[..video_ids.len().min(MAX_IDS_PER_STATS_CALL)];
        let ids = batch.join(",");

        let resp: VideoListResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "statistics,snippet,contentDetails,liveStreamingDetails"),
                    ("id", ids.as_str()),
                ],
            )
            .await?;

        if resp.items.len() < batch.len() {
            tracing::debug!(
                requested = batch.len(),
                returned = resp.items.len(),
                "Some videos missing from statistics response (private or deleted)"
            );
        }
        Ok(resp.items)
    }

    /// One page of a channel's videos ordered by view count. 100 units.
    pub async fn search_channel_videos_by_popularity(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<SearchResource>, Option<String>)> {
        let mut params = vec![
            ("part", "snippet"),
            ("channelId", channel_id),
            ("type", "video"),
            ("order", "viewCount"),
            ("maxResults", "50"),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let resp: SearchListResponse = self.get_json("search", &params).await?;
        Ok((resp.items, resp.next_page_token))
    }

    /// Currently-live broadcasts on a channel. 24/7 streams often never
    /// appear in the uploads playlist, so this probe is the only way to
    /// find them.
    pub async fn search_live_broadcasts(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResource>> {
        let max = max_results.min(MAX_RESULTS_PER_PAGE).to_string();
        let resp: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("channelId", channel_id),
                    ("type", "video"),
                    ("eventType", "live"),
                    ("maxResults", max.as_str()),
                ],
            )
            .await?;
        Ok(resp.items)
    }

    /// Channel search for autocomplete and handle resolution. 100 units.
    pub async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<SearchResource>> {
        let max = max_results.min(MAX_RESULTS_PER_PAGE).to_string();
        let resp: SearchListResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", max.as_str()),
                ],
            )
            .await?;
        Ok(resp.items)
    }
}
