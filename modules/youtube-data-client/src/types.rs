//! Wire types for the subset of YouTube Data API v3 responses the pipeline
//! consumes. All count fields arrive as strings on the wire.

use serde::Deserialize;

/// Quota cost per API call in units, charged against the daily budget.
/// Known up front so the orchestrator can run admission checks before
/// dispatching.
pub struct QuotaCost;

impl QuotaCost {
    pub const CHANNELS_LIST: u64 = 1;
    pub const PLAYLIST_ITEMS_LIST: u64 = 1;
    pub const VIDEOS_LIST: u64 = 1;
    pub const SEARCH_LIST: u64 = 100; // Very expensive
}

/// Batching ceiling for videos.list id parameters.
pub const MAX_IDS_PER_STATS_CALL: usize = 50;
/// Page size ceiling shared by every list endpoint.
pub const MAX_RESULTS_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Thumbnails {
    #[serde(default)]
    pub default: Option<Thumbnail>,
    #[serde(default)]
    pub medium: Option<Thumbnail>,
    #[serde(default)]
    pub high: Option<Thumbnail>,
}

impl Thumbnails {
    /// Best available size, highest first.
    pub fn best_url(&self) -> String {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }

    pub fn medium_url(&self) -> String {
        self.medium
            .as_ref()
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

// --- channels.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelResource {
    pub id: String,
    #[serde(default)]
    pub snippet: ChannelSnippet,
    #[serde(default, rename = "contentDetails")]
    pub content_details: ChannelContentDetails,
    #[serde(default)]
    pub statistics: ChannelStatistics,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "customUrl")]
    pub custom_url: String,
    #[serde(default, rename = "publishedAt")]
    pub published_at: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChannelContentDetails {
    #[serde(default, rename = "relatedPlaylists")]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RelatedPlaylists {
    #[serde(default)]
    pub uploads: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ChannelStatistics {
    #[serde(default, rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(default, rename = "subscriberCount")]
    pub subscriber_count: Option<String>,
    #[serde(default, rename = "videoCount")]
    pub video_count: Option<String>,
}

// --- playlistItems.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItemResource>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItemResource {
    #[serde(default, rename = "contentDetails")]
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct PlaylistItemContentDetails {
    #[serde(default, rename = "videoId")]
    pub video_id: String,
}

// --- videos.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoResource {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default, rename = "contentDetails")]
    pub content_details: VideoContentDetails,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default, rename = "liveStreamingDetails")]
    pub live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "publishedAt")]
    pub published_at: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    /// "none", "live", or "upcoming".
    #[serde(default, rename = "liveBroadcastContent")]
    pub live_broadcast_content: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct VideoContentDetails {
    /// ISO-8601 duration, e.g. "PT1M30S".
    #[serde(default)]
    pub duration: String,
}

/// Statistics may be hidden per video; every field stays optional.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct VideoStatistics {
    #[serde(default, rename = "viewCount")]
    pub view_count: Option<String>,
    #[serde(default, rename = "likeCount")]
    pub like_count: Option<String>,
    #[serde(default, rename = "commentCount")]
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LiveStreamingDetails {
    #[serde(default, rename = "concurrentViewers")]
    pub concurrent_viewers: Option<String>,
    #[serde(default, rename = "actualStartTime")]
    pub actual_start_time: Option<String>,
}

// --- search.list ---

#[derive(Debug, Clone, Deserialize)]
pub struct SearchListResponse {
    #[serde(default)]
    pub items: Vec<SearchResource>,
    #[serde(default, rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResource {
    #[serde(default)]
    pub id: SearchResourceId,
    #[serde(default)]
    pub snippet: SearchSnippet,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResourceId {
    #[serde(default, rename = "videoId")]
    pub video_id: Option<String>,
    #[serde(default, rename = "channelId")]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "channelId")]
    pub channel_id: String,
    #[serde(default, rename = "customUrl")]
    pub custom_url: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}
