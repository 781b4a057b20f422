//! Mock sources for unit and integration tests. Configure before wrapping
//! in an `Arc`; call logs use interior mutability so shared mocks can be
//! asserted against afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use trendlens_common::{
    ChannelAbout, ChannelSummary, InstaMediaItem, ItemSource, LiveBroadcastState, PageProfile,
    TrendLensError, VideoItem,
};

use crate::traits::{ChannelScraper, PageSource, VideoPlatform};

type Result<T> = std::result::Result<T, TrendLensError>;

pub fn make_video(id: &str, views: u64) -> VideoItem {
    VideoItem {
        id: id.to_string(),
        title: format!("video {id}"),
        thumbnail: String::new(),
        published_at: None,
        duration_seconds: 300,
        view_count: views,
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
    }
}

pub fn make_channel(channel_id: &str) -> ChannelAbout {
    ChannelAbout {
        channel_id: channel_id.to_string(),
        name: format!("channel {channel_id}"),
        thumbnail: String::new(),
        uploads_playlist_id: Some(format!("UU{}", &channel_id[2..])),
        custom_url: String::new(),
        subscriber_count: 1_000,
        view_count: 100_000,
        video_count: 50,
        published_at: String::new(),
        country: String::new(),
    }
}

#[derive(Default)]
pub struct MockPlatform {
    pub channels: HashMap<String, ChannelAbout>,
    pub legacy_usernames: HashMap<String, ChannelAbout>,
    /// Playlist id to pages of video ids. Page N is reached with token "pN".
    pub playlist_pages: HashMap<String, Vec<Vec<String>>>,
    pub popular_pages: HashMap<String, Vec<Vec<String>>>,
    pub videos: HashMap<String, VideoItem>,
    /// Served instead of `videos` from the second details call per id,
    /// modelling a real-time statistics refresh.
    pub refreshed_videos: HashMap<String, VideoItem>,
    pub live_ids: HashMap<String, Vec<String>>,
    pub channel_search: Vec<ChannelSummary>,
    /// Operation names that fail with an upstream quota rejection.
    pub quota_fail_ops: HashSet<&'static str>,

    calls: Mutex<Vec<String>>,
    detail_serves: Mutex<HashMap<String, u32>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, about: ChannelAbout) -> Self {
        self.channels.insert(about.channel_id.clone(), about);
        self
    }

    pub fn with_playlist(mut self, playlist_id: &str, pages: Vec<Vec<&str>>) -> Self {
        self.playlist_pages.insert(
            playlist_id.to_string(),
            pages
                .into_iter()
                .map(|p| p.into_iter().map(String::from).collect())
                .collect(),
        );
        self
    }

    pub fn with_video(mut self, video: VideoItem) -> Self {
        self.videos.insert(video.id.clone(), video);
        self
    }

    pub fn with_refreshed(mut self, video: VideoItem) -> Self {
        self.refreshed_videos.insert(video.id.clone(), video);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(op))
            .count()
    }

    fn record(&self, op: &str) -> Result<()> {
        self.calls.lock().unwrap().push(op.to_string());
        let name = op.split(':').next().unwrap_or(op);
        if self.quota_fail_ops.contains(name) {
            return Err(TrendLensError::UpstreamQuota);
        }
        Ok(())
    }

    fn page<'a>(
        pages: Option<&'a Vec<Vec<String>>>,
        token: Option<&str>,
    ) -> (Vec<String>, Option<String>) {
        let Some(pages) = pages else {
            return (Vec::new(), None);
        };
        let index: usize = token
            .and_then(|t| t.strip_prefix('p'))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0);
        let ids = pages.get(index).cloned().unwrap_or_default();
        let next = if index + 1 < pages.len() {
            Some(format!("p{}", index + 1))
        } else {
            None
        };
        (ids, next)
    }
}

#[async_trait]
impl VideoPlatform for MockPlatform {
    async fn channel_by_id(&self, channel_id: &str) -> Result<Option<ChannelAbout>> {
        self.record(&format!("channel_by_id:{channel_id}"))?;
        Ok(self.channels.get(channel_id).cloned())
    }

    async fn channel_by_legacy_username(&self, username: &str) -> Result<Option<ChannelAbout>> {
        self.record(&format!("channel_by_legacy_username:{username}"))?;
        Ok(self.legacy_usernames.get(username).cloned())
    }

    async fn playlist_video_ids(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>)> {
        self.record(&format!("playlist_video_ids:{playlist_id}"))?;
        Ok(Self::page(self.playlist_pages.get(playlist_id), page_token))
    }

    async fn video_details(
        &self,
        video_ids: &[String],
        source: ItemSource,
    ) -> Result<Vec<VideoItem>> {
        self.record(&format!("video_details:{}", video_ids.len()))?;
        let mut serves = self.detail_serves.lock().unwrap();
        let mut out = Vec::new();
        for id in video_ids {
            let count = serves.entry(id.clone()).or_insert(0);
            *count += 1;
            let video = if *count > 1 {
                self.refreshed_videos
                    .get(id)
                    .or_else(|| self.videos.get(id))
            } else {
                self.videos.get(id)
            };
            if let Some(v) = video {
                let mut v = v.clone();
                v.source = source;
                out.push(v);
            }
        }
        Ok(out)
    }

    async fn popular_video_ids(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>)> {
        self.record(&format!("popular_video_ids:{channel_id}"))?;
        Ok(Self::page(self.popular_pages.get(channel_id), page_token))
    }

    async fn live_video_ids(&self, channel_id: &str, _max_results: u32) -> Result<Vec<String>> {
        self.record(&format!("live_video_ids:{channel_id}"))?;
        Ok(self.live_ids.get(channel_id).cloned().unwrap_or_default())
    }

    async fn find_channels(&self, query: &str, max_results: u32) -> Result<Vec<ChannelSummary>> {
        self.record(&format!("find_channels:{query}:{max_results}"))?;
        Ok(self.channel_search.clone())
    }
}

#[derive(Default)]
pub struct MockScraper {
    pub handles: HashMap<String, String>,
    pub abouts: HashMap<String, ChannelAbout>,
    pub videos: HashMap<String, Vec<VideoItem>>,
    calls: Mutex<Vec<String>>,
}

impl MockScraper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handle(mut self, handle: &str, channel_id: &str) -> Self {
        self.handles
            .insert(handle.to_string(), channel_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelScraper for MockScraper {
    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("resolve_handle:{handle}"));
        Ok(self.handles.get(handle).cloned())
    }

    async fn channel_about(&self, channel_id: &str) -> Result<Option<ChannelAbout>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("channel_about:{channel_id}"));
        Ok(self.abouts.get(channel_id).cloned())
    }

    async fn channel_videos(&self, channel_id: &str, max_results: usize) -> Result<Vec<VideoItem>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("channel_videos:{channel_id}"));
        let mut videos = self.videos.get(channel_id).cloned().unwrap_or_default();
        videos.truncate(max_results);
        Ok(videos)
    }
}

#[derive(Default)]
pub struct MockPageSource {
    pub profiles: HashMap<String, PageProfile>,
    pub media: HashMap<String, Vec<InstaMediaItem>>,
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn page_info(&self, username: &str) -> Result<Option<PageProfile>> {
        Ok(self.profiles.get(username).cloned())
    }

    async fn recent_media(&self, username: &str, limit: usize) -> Result<Vec<InstaMediaItem>> {
        let mut media = self.media.get(username).cloned().unwrap_or_default();
        media.truncate(limit);
        Ok(media)
    }
}
