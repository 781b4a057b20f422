use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// --- Content items ---

/// Which fetch path produced an item. On merge, the first-seen source wins;
/// a later lower-priority source never overwrites an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    Search,
    Playlist,
    Scrape,
    LiveProbe,
}

impl std::fmt::Display for ItemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemSource::Search => write!(f, "search"),
            ItemSource::Playlist => write!(f, "playlist"),
            ItemSource::Scrape => write!(f, "scrape"),
            ItemSource::LiveProbe => write!(f, "live_probe"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LiveBroadcastState {
    #[default]
    None,
    Live,
    Upcoming,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_seconds: u32,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub is_short: bool,
    pub is_live: bool,
    pub live_broadcast_state: LiveBroadcastState,
    /// Concurrent viewers for live broadcasts. None means "unknown", which is
    /// distinct from 0 (a dead stream) for the live tie-break.
    pub live_viewers: Option<u64>,
    pub is_trending: bool,
    pub hours_since_publish: f64,
    pub trending_score: f64,
    pub source: ItemSource,
}

impl VideoItem {
    /// Live candidate check: explicit flag, known concurrent viewers, or the
    /// platform's broadcast-state field saying live.
    pub fn is_live_candidate(&self) -> bool {
        self.is_live
            || self.live_viewers.is_some_and(|v| v > 0)
            || self.live_broadcast_state == LiveBroadcastState::Live
    }

    /// Sort key for live candidates: concurrent viewers first, total views
    /// as tie-break. Unknown viewers rank as 0.
    pub fn live_sort_key(&self) -> (u64, u64) {
        (self.live_viewers.unwrap_or(0), self.view_count)
    }
}

// --- Channel metadata ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAbout {
    pub channel_id: String,
    pub name: String,
    pub thumbnail: String,
    pub uploads_playlist_id: Option<String>,
    pub custom_url: String,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub video_count: u64,
    pub published_at: String,
    pub country: String,
}

impl ChannelAbout {
    /// Placeholder metadata for when every lookup path failed. Fetching
    /// continues with this rather than aborting the channel.
    pub fn placeholder(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            name: "Unknown Channel".to_string(),
            thumbnail: String::new(),
            uploads_playlist_id: None,
            custom_url: String::new(),
            subscriber_count: 0,
            view_count: 0,
            video_count: 0,
            published_at: String::new(),
            country: String::new(),
        }
    }
}

/// Summary row for channel autocomplete search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub channel_id: String,
    pub name: String,
    pub thumbnail: String,
    pub custom_url: String,
    pub subscriber_count: u64,
}

// --- Fetch results ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub channel_ref: String,
    pub channel: ChannelAbout,
    pub videos: Vec<VideoItem>,
    pub shorts: Vec<VideoItem>,
    pub trending_videos: Vec<VideoItem>,
    pub trending_shorts: Vec<VideoItem>,
    /// At most `live_top_k` entries (default 1), sorted viewers-then-views.
    pub live_videos: Vec<VideoItem>,
    pub total_fetched: usize,
    pub budget: BudgetStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFailure {
    pub channel_ref: String,
    pub message: String,
    /// Set when the failure was a budget denial, so a client can back off
    /// instead of retrying with different input.
    pub quota_exceeded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<FetchResult>,
    pub errors: Vec<ChannelFailure>,
    pub total_processed: usize,
    pub total_failed: usize,
    pub budget: BudgetStatus,
}

// --- Budget ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaLevel {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub used: u64,
    pub limit: u64,
    pub remaining: u64,
    pub percentage: f64,
    pub level: QuotaLevel,
}

impl BudgetStatus {
    pub fn new(used: u64, limit: u64) -> Self {
        let percentage = if limit == 0 {
            0.0
        } else {
            (used as f64 / limit as f64) * 100.0
        };
        let level = if percentage >= 90.0 {
            QuotaLevel::Critical
        } else if percentage >= 80.0 {
            QuotaLevel::Warning
        } else {
            QuotaLevel::Ok
        };
        Self {
            used,
            limit,
            remaining: limit.saturating_sub(used),
            percentage: (percentage * 100.0).round() / 100.0,
            level,
        }
    }
}

// --- Instagram ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstaMediaKind {
    Post,
    Reel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstaMediaItem {
    pub shortcode: String,
    pub caption: String,
    pub thumbnail: String,
    pub kind: InstaMediaKind,
    pub like_count: u64,
    pub comment_count: u64,
    pub view_count: Option<u64>,
    pub taken_at: Option<DateTime<Utc>>,
}

impl InstaMediaItem {
    pub fn engagement(&self) -> u64 {
        self.like_count + self.comment_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageProfile {
    pub username: String,
    pub full_name: String,
    pub profile_picture: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub post_count: u64,
    pub is_verified: bool,
}

impl PageProfile {
    pub fn placeholder(username: &str) -> Self {
        Self {
            username: username.to_string(),
            full_name: username.to_string(),
            profile_picture: String::new(),
            follower_count: 0,
            following_count: 0,
            post_count: 0,
            is_verified: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    pub page_ref: String,
    pub profile: PageProfile,
    pub posts: Vec<InstaMediaItem>,
    pub reels: Vec<InstaMediaItem>,
    pub total_fetched: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFailure {
    pub page_ref: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageBatchReport {
    pub results: Vec<PageResult>,
    pub errors: Vec<PageFailure>,
    pub total_processed: usize,
    pub total_failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_status_levels() {
        assert_eq!(BudgetStatus::new(0, 10_000).level, QuotaLevel::Ok);
        assert_eq!(BudgetStatus::new(7_999, 10_000).level, QuotaLevel::Ok);
        assert_eq!(BudgetStatus::new(8_000, 10_000).level, QuotaLevel::Warning);
        assert_eq!(BudgetStatus::new(9_000, 10_000).level, QuotaLevel::Critical);
        assert_eq!(BudgetStatus::new(12_000, 10_000).remaining, 0);
    }

    #[test]
    fn live_candidate_paths() {
        let mut v = VideoItem {
            id: "a".into(),
            title: String::new(),
            thumbnail: String::new(),
            published_at: None,
            duration_seconds: 0,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            is_short: false,
            is_live: false,
            live_broadcast_state: LiveBroadcastState::None,
            live_viewers: None,
            is_trending: false,
            hours_since_publish: 0.0,
            trending_score: 0.0,
            source: ItemSource::Playlist,
        };
        assert!(!v.is_live_candidate());
        v.live_viewers = Some(3);
        assert!(v.is_live_candidate());
        v.live_viewers = Some(0);
        assert!(!v.is_live_candidate());
        v.live_broadcast_state = LiveBroadcastState::Live;
        assert!(v.is_live_candidate());
    }
}
