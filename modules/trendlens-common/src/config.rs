use std::env;
use std::time::Duration;

/// Per-namespace cache TTLs. Trending and live data stay deliberately short;
/// everything else is held long to save quota.
#[derive(Debug, Clone)]
pub struct CacheTtls {
    pub channel_info: Duration,
    pub channel_videos: Duration,
    pub video_statistics: Duration,
    pub playlist_items: Duration,
    pub trending_videos: Duration,
    pub live_videos: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            channel_info: Duration::from_secs(86_400),
            channel_videos: Duration::from_secs(86_400),
            video_statistics: Duration::from_secs(86_400),
            playlist_items: Duration::from_secs(86_400),
            trending_videos: Duration::from_secs(300),
            live_videos: Duration::from_secs(60),
        }
    }
}

impl CacheTtls {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            channel_info: env_secs("CACHE_TTL_CHANNEL_INFO", d.channel_info),
            channel_videos: env_secs("CACHE_TTL_CHANNEL_VIDEOS", d.channel_videos),
            video_statistics: env_secs("CACHE_TTL_VIDEO_STATISTICS", d.video_statistics),
            playlist_items: env_secs("CACHE_TTL_PLAYLIST_ITEMS", d.playlist_items),
            trending_videos: env_secs("CACHE_TTL_TRENDING_VIDEOS", d.trending_videos),
            live_videos: env_secs("CACHE_TTL_LIVE_VIDEOS", d.live_videos),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// YouTube Data API key. Optional: without it every channel is served
    /// from the scraping path only.
    pub youtube_api_key: Option<String>,

    // Quota budget
    pub daily_quota_limit: u64,
    pub quota_warning_threshold: u64,
    /// Hour (UTC) at which the platform resets the daily budget. 08:00 UTC
    /// approximates the platform's local midnight.
    pub quota_reset_hour_utc: u32,

    // Rate limiting
    pub max_requests_per_second: u64,
    pub max_requests_per_minute: u64,

    // Fetch behavior
    /// Popularity search costs 100 units per page; disabled by default.
    pub use_search_api: bool,
    pub use_scraping_fallback: bool,
    /// How many live items to surface. Product default is 1.
    pub live_top_k: usize,
    pub request_timeout: Duration,

    // Persistence. None = in-process stores (budget not shared across
    // instances).
    pub database_url: Option<String>,

    pub cache_ttls: CacheTtls,
    pub cache_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables. Every knob has a
    /// default; only a malformed value is an error surfaced later.
    pub fn from_env() -> Self {
        Self {
            youtube_api_key: env::var("YOUTUBE_API_KEY").ok().filter(|k| !k.is_empty()),
            daily_quota_limit: env_u64("YOUTUBE_QUOTA_LIMIT", 10_000),
            quota_warning_threshold: env_u64("YOUTUBE_QUOTA_WARNING_THRESHOLD", 8_000),
            quota_reset_hour_utc: env_u64("YOUTUBE_QUOTA_RESET_HOUR_UTC", 8) as u32 % 24,
            max_requests_per_second: env_u64("YOUTUBE_MAX_REQUESTS_PER_SECOND", 5),
            max_requests_per_minute: env_u64("YOUTUBE_MAX_REQUESTS_PER_MINUTE", 100),
            use_search_api: env_bool("USE_SEARCH_API", false),
            use_scraping_fallback: env_bool("USE_WEB_SCRAPING_FALLBACK", true),
            live_top_k: env_u64("LIVE_TOP_K", 1) as usize,
            request_timeout: env_secs("REQUEST_TIMEOUT_SECS", Duration::from_secs(10)),
            database_url: env::var("DATABASE_URL").ok().filter(|u| !u.is_empty()),
            cache_ttls: CacheTtls::from_env(),
            cache_enabled: env_bool("CACHE_ENABLED", true),
        }
    }

    /// Log the effective configuration without leaking the API key.
    pub fn log_redacted(&self) {
        tracing::info!(
            api_key = if self.youtube_api_key.is_some() { "set" } else { "missing" },
            daily_quota_limit = self.daily_quota_limit,
            warning_threshold = self.quota_warning_threshold,
            reset_hour_utc = self.quota_reset_hour_utc,
            per_second = self.max_requests_per_second,
            per_minute = self.max_requests_per_minute,
            use_search_api = self.use_search_api,
            use_scraping_fallback = self.use_scraping_fallback,
            live_top_k = self.live_top_k,
            shared_store = self.database_url.is_some(),
            "Configuration loaded"
        );
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
