//! Source abstractions. The orchestrator and resolver only ever talk to
//! these traits, so tests swap in mocks and the paid API, the scrapers,
//! and any future source are interchangeable.

use async_trait::async_trait;

use trendlens_common::{
    parse_count, parse_count_opt, parse_timestamp, ChannelAbout, ChannelSummary, InstaMediaItem,
    ItemSource, LiveBroadcastState, PageProfile, TrendLensError, VideoItem,
};
use youtube_data_client::{
    ChannelResource, SearchResource, VideoResource, YouTubeApiError, YouTubeDataClient,
};

use crate::ranking;

type Result<T> = std::result::Result<T, TrendLensError>;

// --- Traits ---

/// The paid video platform API, in domain terms.
#[async_trait]
pub trait VideoPlatform: Send + Sync {
    async fn channel_by_id(&self, channel_id: &str) -> Result<Option<ChannelAbout>>;
    async fn channel_by_legacy_username(&self, username: &str) -> Result<Option<ChannelAbout>>;
    /// One page of video ids from a playlist, with the next page token.
    async fn playlist_video_ids(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>)>;
    /// Full details and statistics for up to 50 ids per call.
    async fn video_details(&self, video_ids: &[String], source: ItemSource) -> Result<Vec<VideoItem>>;
    /// One page of a channel's video ids ordered by view count.
    async fn popular_video_ids(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>)>;
    /// Ids of broadcasts live right now.
    async fn live_video_ids(&self, channel_id: &str, max_results: u32) -> Result<Vec<String>>;
    async fn find_channels(&self, query: &str, max_results: u32) -> Result<Vec<ChannelSummary>>;
}

/// Free scraping fallback for channel data.
#[async_trait]
pub trait ChannelScraper: Send + Sync {
    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>>;
    async fn channel_about(&self, channel_id: &str) -> Result<Option<ChannelAbout>>;
    async fn channel_videos(&self, channel_id: &str, max_results: usize) -> Result<Vec<VideoItem>>;
}

/// An Instagram-page data source.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn page_info(&self, username: &str) -> Result<Option<PageProfile>>;
    async fn recent_media(&self, username: &str, limit: usize) -> Result<Vec<InstaMediaItem>>;
}

// --- Wire-to-domain conversions ---

fn channel_from_resource(resource: ChannelResource) -> ChannelAbout {
    ChannelAbout {
        channel_id: resource.id,
        name: resource.snippet.title,
        thumbnail: resource.snippet.thumbnails.best_url(),
        uploads_playlist_id: resource.content_details.related_playlists.uploads,
        custom_url: resource.snippet.custom_url,
        subscriber_count: parse_count(resource.statistics.subscriber_count.as_deref().unwrap_or("")),
        view_count: parse_count(resource.statistics.view_count.as_deref().unwrap_or("")),
        video_count: parse_count(resource.statistics.video_count.as_deref().unwrap_or("")),
        published_at: resource.snippet.published_at,
        country: resource.snippet.country,
    }
}

pub(crate) fn video_from_resource(resource: VideoResource, source: ItemSource) -> VideoItem {
    let live_state = match resource.snippet.live_broadcast_content.as_str() {
        "live" => LiveBroadcastState::Live,
        "upcoming" => LiveBroadcastState::Upcoming,
        _ => LiveBroadcastState::None,
    };
    let live_viewers = resource
        .live_streaming_details
        .as_ref()
        .and_then(|d| parse_count_opt(d.concurrent_viewers.as_deref()));
    let duration_seconds =
        trendlens_common::duration_seconds(&resource.content_details.duration).unwrap_or(0);

    VideoItem {
        id: resource.id,
        title: resource.snippet.title,
        thumbnail: resource.snippet.thumbnails.medium_url(),
        published_at: parse_timestamp(&resource.snippet.published_at),
        duration_seconds,
        view_count: parse_count(resource.statistics.view_count.as_deref().unwrap_or("")),
        like_count: parse_count(resource.statistics.like_count.as_deref().unwrap_or("")),
        comment_count: parse_count(resource.statistics.comment_count.as_deref().unwrap_or("")),
        is_short: ranking::is_short(duration_seconds),
        is_live: live_state == LiveBroadcastState::Live,
        live_broadcast_state: live_state,
        live_viewers,
        // Derived fields; the orchestrator recomputes them once the final
        // merged set is known.
        is_trending: false,
        hours_since_publish: 0.0,
        trending_score: 0.0,
        source,
    }
}

fn summary_from_search(resource: SearchResource) -> ChannelSummary {
    let channel_id = resource
        .id
        .channel_id
        .unwrap_or(resource.snippet.channel_id);
    ChannelSummary {
        channel_id,
        name: resource.snippet.title,
        thumbnail: resource.snippet.thumbnails.medium_url(),
        custom_url: resource.snippet.custom_url,
        subscriber_count: 0,
    }
}

fn platform_err(e: YouTubeApiError) -> TrendLensError {
    if e.is_quota() {
        TrendLensError::UpstreamQuota
    } else {
        TrendLensError::Upstream(e.to_string())
    }
}

#[async_trait]
impl VideoPlatform for YouTubeDataClient {
    async fn channel_by_id(&self, channel_id: &str) -> Result<Option<ChannelAbout>> {
        Ok(self
            .get_channel(channel_id)
            .await
            .map_err(platform_err)?
            .map(channel_from_resource))
    }

    async fn channel_by_legacy_username(&self, username: &str) -> Result<Option<ChannelAbout>> {
        Ok(self
            .get_channel_by_username(username)
            .await
            .map_err(platform_err)?
            .map(channel_from_resource))
    }

    async fn playlist_video_ids(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>)> {
        let (items, next) = self
            .list_playlist_items(playlist_id, page_token, youtube_data_client::MAX_RESULTS_PER_PAGE)
            .await
            .map_err(platform_err)?;
        let ids = items
            .into_iter()
            .map(|i| i.content_details.video_id)
            .filter(|id| !id.is_empty())
            .collect();
        Ok((ids, next))
    }

    async fn video_details(&self, video_ids: &[String], source: ItemSource) -> Result<Vec<VideoItem>> {
        let resources = self.list_videos(video_ids).await.map_err(platform_err)?;
        Ok(resources
            .into_iter()
            .map(|r| video_from_resource(r, source))
            .collect())
    }

    async fn popular_video_ids(
        &self,
        channel_id: &str,
        page_token: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>)> {
        let (items, next) = self
            .search_channel_videos_by_popularity(channel_id, page_token)
            .await
            .map_err(platform_err)?;
        let ids = items.into_iter().filter_map(|r| r.id.video_id).collect();
        Ok((ids, next))
    }

    async fn live_video_ids(&self, channel_id: &str, max_results: u32) -> Result<Vec<String>> {
        let items = self
            .search_live_broadcasts(channel_id, max_results)
            .await
            .map_err(platform_err)?;
        Ok(items.into_iter().filter_map(|r| r.id.video_id).collect())
    }

    async fn find_channels(&self, query: &str, max_results: u32) -> Result<Vec<ChannelSummary>> {
        let items = self
            .search_channels(query, max_results)
            .await
            .map_err(platform_err)?;
        Ok(items.into_iter().map(summary_from_search).collect())
    }
}

// --- Scraper adapters ---

fn scrape_err(e: trendlens_scraper::ScrapeError) -> TrendLensError {
    TrendLensError::Upstream(e.to_string())
}

#[async_trait]
impl ChannelScraper for trendlens_scraper::YouTubeScraper {
    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>> {
        trendlens_scraper::YouTubeScraper::resolve_handle(self, handle)
            .await
            .map_err(scrape_err)
    }

    async fn channel_about(&self, channel_id: &str) -> Result<Option<ChannelAbout>> {
        let Some(scraped) = trendlens_scraper::YouTubeScraper::channel_about(self, channel_id)
            .await
            .map_err(scrape_err)?
        else {
            return Ok(None);
        };
        Ok(Some(ChannelAbout {
            channel_id: scraped.channel_id,
            name: scraped.name,
            thumbnail: scraped.thumbnail,
            uploads_playlist_id: None,
            custom_url: String::new(),
            subscriber_count: scraped.subscriber_count,
            view_count: scraped.view_count,
            video_count: 0,
            published_at: String::new(),
            country: String::new(),
        }))
    }

    async fn channel_videos(&self, channel_id: &str, max_results: usize) -> Result<Vec<VideoItem>> {
        let refs = self
            .channel_video_ids(channel_id, max_results)
            .await
            .map_err(scrape_err)?;

        let mut videos = Vec::with_capacity(refs.len());
        for r in refs {
            let stats = self.video_stats(&r.video_id).await.map_err(scrape_err)?;
            let (views, likes, published) = match stats {
                Some(s) => (s.view_count, s.like_count, parse_timestamp(&s.published_at)),
                None => (0, 0, None),
            };
            videos.push(VideoItem {
                id: r.video_id,
                title: r.title,
                thumbnail: r.thumbnail,
                published_at: published,
                duration_seconds: 0,
                view_count: views,
                like_count: likes,
                comment_count: 0,
                is_short: false,
                is_live: false,
                live_broadcast_state: LiveBroadcastState::None,
                live_viewers: None,
                is_trending: false,
                hours_since_publish: 0.0,
                trending_score: 0.0,
                source: ItemSource::Scrape,
            });
        }
        Ok(videos)
    }
}

#[async_trait]
impl PageSource for trendlens_scraper::InstagramScraper {
    async fn page_info(&self, username: &str) -> Result<Option<PageProfile>> {
        trendlens_scraper::InstagramScraper::page_info(self, username)
            .await
            .map_err(scrape_err)
    }

    async fn recent_media(&self, username: &str, limit: usize) -> Result<Vec<InstaMediaItem>> {
        trendlens_scraper::InstagramScraper::recent_media(self, username, limit)
            .await
            .map_err(scrape_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use youtube_data_client::{
        LiveStreamingDetails, VideoContentDetails, VideoSnippet, VideoStatistics,
    };

    fn resource(duration: &str, live: &str, viewers: Option<&str>) -> VideoResource {
        VideoResource {
            id: "vid".to_string(),
            snippet: VideoSnippet {
                title: "t".to_string(),
                published_at: "2024-01-15T10:30:00Z".to_string(),
                live_broadcast_content: live.to_string(),
                ..Default::default()
            },
            content_details: VideoContentDetails {
                duration: duration.to_string(),
            },
            statistics: VideoStatistics {
                view_count: Some("1234".to_string()),
                like_count: None,
                comment_count: None,
            },
            live_streaming_details: viewers.map(|v| LiveStreamingDetails {
                concurrent_viewers: Some(v.to_string()),
                actual_start_time: None,
            }),
        }
    }

    #[test]
    fn short_classification_follows_duration() {
        let v = video_from_resource(resource("PT1M0S", "none", None), ItemSource::Playlist);
        assert!(v.is_short);
        assert_eq!(v.duration_seconds, 60);

        let v = video_from_resource(resource("PT1M5S", "none", None), ItemSource::Playlist);
        assert!(!v.is_short);
    }

    #[test]
    fn live_fields_map_through() {
        let v = video_from_resource(resource("PT0S", "live", Some("250")), ItemSource::LiveProbe);
        assert!(v.is_live);
        assert_eq!(v.live_broadcast_state, LiveBroadcastState::Live);
        assert_eq!(v.live_viewers, Some(250));
        assert!(!v.is_short);

        // Live without a viewer figure stays unknown, not zero.
        let v = video_from_resource(resource("PT0S", "live", None), ItemSource::LiveProbe);
        assert_eq!(v.live_viewers, None);
        assert!(v.is_live_candidate());
    }

    #[test]
    fn hidden_statistics_coerce_to_zero() {
        let mut r = resource("PT2M", "none", None);
        r.statistics = VideoStatistics::default();
        let v = video_from_resource(r, ItemSource::Search);
        assert_eq!(v.view_count, 0);
        assert_eq!(v.like_count, 0);
    }
}
