//! Multi-source fetch orchestration. One entry point per channel turns a
//! raw reference into ranked video, shorts, trending, and live lists,
//! spending quota on the cheapest path that still fills the caps and
//! falling back across sources when one fails.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;

use trendlens_common::{
    BatchReport, ChannelAbout, ChannelFailure, ChannelSummary, Config, FetchResult, ItemSource,
    TrendLensError, VideoItem,
};
use youtube_data_client::{QuotaCost, MAX_IDS_PER_STATS_CALL};

use crate::budget::ApiGate;
use crate::cache::{CacheNamespace, ResponseCache};
use crate::ranking;
use crate::resolver::ChannelResolver;
use crate::traits::{ChannelScraper, VideoPlatform};

type Result<T> = std::result::Result<T, TrendLensError>;

/// Live probe page size. 24/7 channels rarely run more than a couple of
/// simultaneous broadcasts.
const LIVE_PROBE_MAX: u32 = 5;
/// Popularity search overshoot: pull well past the caps so the view-sorted
/// cut still has enough of each kind.
const SEARCH_FETCH_MULTIPLIER: usize = 20;
const SEARCH_FETCH_MIN: usize = 200;
/// The uploads playlist arrives newest-first, so it needs a deeper overshoot
/// to catch older high-view items.
const PLAYLIST_FETCH_MULTIPLIER: usize = 30;
const PLAYLIST_FETCH_MIN: usize = 300;
/// Hard page ceiling for any paginated listing walk.
const MAX_LIST_PAGES: usize = 20;
/// Cap on the scrape-only video path; each item costs one page fetch.
const SCRAPE_VIDEO_LIMIT: usize = 30;
/// Ceiling on channel autocomplete results per query.
const MAX_SEARCH_RESULTS: u32 = 20;
/// Batch endpoint ceiling on channels per request.
pub const MAX_CHANNELS_PER_BATCH: usize = 10;

pub(crate) fn search_fetch_target(max_videos: usize, max_shorts: usize) -> usize {
    ((max_videos + max_shorts) * SEARCH_FETCH_MULTIPLIER).max(SEARCH_FETCH_MIN)
}

pub(crate) fn playlist_fetch_target(max_videos: usize, max_shorts: usize) -> usize {
    (max_videos.max(max_shorts) * PLAYLIST_FETCH_MULTIPLIER).max(PLAYLIST_FETCH_MIN)
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub use_search_api: bool,
    pub use_scraping_fallback: bool,
    pub live_top_k: usize,
}

impl From<&Config> for FetchOptions {
    fn from(config: &Config) -> Self {
        Self {
            use_search_api: config.use_search_api,
            use_scraping_fallback: config.use_scraping_fallback,
            live_top_k: config.live_top_k,
        }
    }
}

pub struct FetchOrchestrator {
    platform: Option<Arc<dyn VideoPlatform>>,
    scraper: Option<Arc<dyn ChannelScraper>>,
    resolver: ChannelResolver,
    gate: Arc<ApiGate>,
    cache: Arc<ResponseCache>,
    options: FetchOptions,
}

/// Accumulates fetched items keyed by video id, preserving first-seen order.
/// The first source to deliver an id owns the record; later sources never
/// overwrite it.
struct MergePool {
    items: Vec<VideoItem>,
    seen: HashSet<String>,
}

impl MergePool {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn add(&mut self, item: VideoItem) {
        if self.seen.insert(item.id.clone()) {
            self.items.push(item);
        }
    }

    fn extend(&mut self, items: Vec<VideoItem>) {
        for item in items {
            self.add(item);
        }
    }

    fn missing_ids(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter(|id| !self.seen.contains(*id))
            .cloned()
            .collect()
    }
}

impl FetchOrchestrator {
    pub fn new(
        platform: Option<Arc<dyn VideoPlatform>>,
        scraper: Option<Arc<dyn ChannelScraper>>,
        gate: Arc<ApiGate>,
        cache: Arc<ResponseCache>,
        options: FetchOptions,
    ) -> Self {
        let resolver = ChannelResolver::new(
            platform.clone(),
            scraper.clone(),
            gate.clone(),
            options.use_scraping_fallback,
        );
        Self {
            platform,
            scraper,
            resolver,
            gate,
            cache,
            options,
        }
    }

    pub async fn quota_status(&self) -> Result<trendlens_common::BudgetStatus> {
        self.gate.status().await
    }

    /// Channel autocomplete search. One search.list call, 100 units,
    /// capped at [`MAX_SEARCH_RESULTS`] per query.
    pub async fn search_channels(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<ChannelSummary>> {
        let platform = self
            .platform
            .as_ref()
            .ok_or_else(|| TrendLensError::Config("no API key configured for search".into()))?;
        let max_results = max_results.min(MAX_SEARCH_RESULTS);

        let key = ("channel_search", query, max_results);
        if let Some(cached) = self
            .cache
            .get::<_, Vec<ChannelSummary>>(CacheNamespace::ChannelInfo, &key)
            .await?
        {
            return Ok(cached);
        }
        self.gate.acquire(QuotaCost::SEARCH_LIST).await?;
        let results = platform.find_channels(query, max_results).await?;
        self.cache
            .set(CacheNamespace::ChannelInfo, &key, &results)
            .await?;
        Ok(results)
    }

    /// Fetch and rank a channel's content. Steps run cheapest-first and a
    /// quota denial partway through degrades to partial results instead of
    /// discarding whatever was already fetched.
    pub async fn fetch_channel_content(
        &self,
        channel_ref: &str,
        max_videos: usize,
        max_shorts: usize,
        real_time_trending: bool,
        real_time_live: bool,
    ) -> Result<FetchResult> {
        let channel_id = self.resolver.resolve(channel_ref).await?;
        tracing::info!(channel_ref, channel_id, "Fetching channel content");

        // Whole-result cache with the short trending TTL. A hit skips the
        // fetch steps; a requested real-time refresh still runs over the
        // cached selection, and the budget snapshot is always recomputed.
        let result_key = ("fetch", channel_id.as_str(), max_videos, max_shorts);
        if let Some(mut cached) = self
            .cache
            .get::<_, FetchResult>(CacheNamespace::TrendingVideos, &result_key)
            .await?
        {
            if real_time_trending || real_time_live {
                let mut budget_hit = false;
                self.refresh_selected(
                    &mut cached.trending_videos,
                    &mut cached.trending_shorts,
                    &mut cached.live_videos,
                    real_time_trending,
                    real_time_live,
                    &mut budget_hit,
                )
                .await;
            }
            cached.budget = self.gate.status().await?;
            return Ok(cached);
        }

        let mut budget_hit = false;

        let channel = self.channel_metadata(&channel_id, &mut budget_hit).await;
        let mut pool = MergePool::new();

        // Live probe first: live broadcasts often never reach the uploads
        // playlist, and the probe result seeds the merge pool so later
        // sources cannot demote a live item.
        self.collect_live(&channel_id, &mut pool, &mut budget_hit)
            .await;

        let mut search_ok = false;
        if self.options.use_search_api {
            search_ok = self
                .collect_from_search(&channel_id, max_videos, max_shorts, &mut pool, &mut budget_hit)
                .await;
        }

        // Playlist path when search was skipped, failed, or left either
        // category short of its cap.
        let regular_in_pool = pool.items.iter().filter(|v| !v.is_short).count();
        let shorts_in_pool = pool.items.len() - regular_in_pool;
        if !search_ok || regular_in_pool < max_videos || shorts_in_pool < max_shorts {
            let target = playlist_fetch_target(max_videos, max_shorts);
            self.collect_from_playlist(&channel, &channel_id, target, &mut pool, &mut budget_hit)
                .await;
        }

        if pool.items.is_empty() && self.options.use_scraping_fallback {
            if let Some(scraper) = &self.scraper {
                match scraper.channel_videos(&channel_id, SCRAPE_VIDEO_LIMIT).await {
                    Ok(items) => pool.extend(items),
                    Err(e) => tracing::warn!(channel_id, error = %e, "Scrape fallback failed"),
                }
            }
        }

        let total_fetched = pool.items.len();
        if total_fetched == 0 {
            if budget_hit {
                let status = self.gate.status().await?;
                return Err(TrendLensError::BudgetExceeded {
                    used: status.used,
                    limit: status.limit,
                });
            }
            return Err(TrendLensError::NoContent(channel_id));
        }

        let mut ranked = rank_and_cut(pool.items, max_videos, max_shorts, self.options.live_top_k);

        if real_time_trending || real_time_live {
            self.refresh_selected(
                &mut ranked.trending_videos,
                &mut ranked.trending_shorts,
                &mut ranked.live_videos,
                real_time_trending,
                real_time_live,
                &mut budget_hit,
            )
            .await;
        }

        if budget_hit {
            tracing::warn!(channel_id, "Budget exhausted mid-fetch, returning partial results");
        }

        let result = FetchResult {
            channel_ref: channel_ref.to_string(),
            channel,
            videos: ranked.videos,
            shorts: ranked.shorts,
            trending_videos: ranked.trending_videos,
            trending_shorts: ranked.trending_shorts,
            live_videos: ranked.live_videos,
            total_fetched,
            budget: self.gate.status().await?,
        };
        // Partial results stay uncached so the next request retries the
        // failed steps once budget frees up.
        if !budget_hit {
            self.cache
                .set(CacheNamespace::TrendingVideos, &result_key, &result)
                .await?;
        }
        Ok(result)
    }

    /// Analyze up to [`MAX_CHANNELS_PER_BATCH`] channels. One channel's
    /// failure never takes down the rest of the batch.
    pub async fn analyze_channels(
        &self,
        channel_refs: &[String],
        max_videos: usize,
        max_shorts: usize,
        real_time_trending: bool,
        real_time_live: bool,
    ) -> BatchReport {
        let refs = &channel_refs[..channel_refs.len().min(MAX_CHANNELS_PER_BATCH)];
        if refs.len() < channel_refs.len() {
            tracing::warn!(
                requested = channel_refs.len(),
                accepted = refs.len(),
                "Batch truncated to the per-request channel cap"
            );
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for channel_ref in refs {
            match self
                .fetch_channel_content(
                    channel_ref,
                    max_videos,
                    max_shorts,
                    real_time_trending,
                    real_time_live,
                )
                .await
            {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(channel_ref, error = %e, "Channel analysis failed");
                    errors.push(ChannelFailure {
                        channel_ref: channel_ref.clone(),
                        quota_exceeded: e.is_quota(),
                        message: e.to_string(),
                    });
                }
            }
        }

        let budget = self
            .gate
            .status()
            .await
            .unwrap_or_else(|_| trendlens_common::BudgetStatus::new(0, 0));
        BatchReport {
            total_processed: results.len(),
            total_failed: errors.len(),
            results,
            errors,
            budget,
        }
    }

    // --- Fetch steps ---

    async fn channel_metadata(&self, channel_id: &str, budget_hit: &mut bool) -> ChannelAbout {
        match self.channel_metadata_inner(channel_id).await {
            Ok(Some(about)) => about,
            Ok(None) => {
                tracing::warn!(channel_id, "No metadata from any source, using placeholder");
                ChannelAbout::placeholder(channel_id)
            }
            Err(e) => {
                if e.is_quota() {
                    *budget_hit = true;
                }
                tracing::warn!(channel_id, error = %e, "Metadata lookup failed, using placeholder");
                ChannelAbout::placeholder(channel_id)
            }
        }
    }

    async fn channel_metadata_inner(&self, channel_id: &str) -> Result<Option<ChannelAbout>> {
        if let Some(cached) = self
            .cache
            .get::<_, ChannelAbout>(CacheNamespace::ChannelInfo, &channel_id)
            .await?
        {
            return Ok(Some(cached));
        }

        if let Some(platform) = &self.platform {
            self.gate.acquire(QuotaCost::CHANNELS_LIST).await?;
            match platform.channel_by_id(channel_id).await {
                Ok(Some(about)) => {
                    self.cache
                        .set(CacheNamespace::ChannelInfo, &channel_id, &about)
                        .await?;
                    return Ok(Some(about));
                }
                Ok(None) => {}
                Err(e) if e.is_quota() => return Err(e),
                Err(e) => tracing::warn!(channel_id, error = %e, "API metadata lookup failed"),
            }
        }

        if self.options.use_scraping_fallback {
            if let Some(scraper) = &self.scraper {
                if let Some(about) = scraper.channel_about(channel_id).await? {
                    self.cache
                        .set(CacheNamespace::ChannelInfo, &channel_id, &about)
                        .await?;
                    return Ok(Some(about));
                }
            }
        }
        Ok(None)
    }

    async fn collect_live(&self, channel_id: &str, pool: &mut MergePool, budget_hit: &mut bool) {
        let Some(platform) = &self.platform else {
            return;
        };

        let result: Result<()> = async {
            let key = ("live_probe", channel_id);
            let ids = match self
                .cache
                .get::<_, Vec<String>>(CacheNamespace::LiveVideos, &key)
                .await?
            {
                Some(ids) => ids,
                None => {
                    self.gate.acquire(QuotaCost::SEARCH_LIST).await?;
                    let ids = platform.live_video_ids(channel_id, LIVE_PROBE_MAX).await?;
                    self.cache
                        .set(CacheNamespace::LiveVideos, &key, &ids)
                        .await?;
                    ids
                }
            };
            if ids.is_empty() {
                return Ok(());
            }

            let mut items = self.details_cached(&ids, ItemSource::LiveProbe).await?;
            for item in &mut items {
                // The probe only returns currently-live broadcasts; the flag
                // sticks even when the details payload lags behind.
                item.is_live = true;
            }
            pool.extend(items);
            Ok(())
        }
        .await;

        if let Err(e) = result {
            if e.is_quota() {
                *budget_hit = true;
            }
            tracing::warn!(channel_id, error = %e, "Live probe failed");
        }
    }

    /// Returns whether the search path completed; a failed or skipped search
    /// hands the job to the playlist path.
    async fn collect_from_search(
        &self,
        channel_id: &str,
        max_videos: usize,
        max_shorts: usize,
        pool: &mut MergePool,
        budget_hit: &mut bool,
    ) -> bool {
        let Some(platform) = &self.platform else {
            return false;
        };
        let target = search_fetch_target(max_videos, max_shorts);

        let result: Result<()> = async {
            let key = ("popular_ids", channel_id, target);
            let ids = match self
                .cache
                .get::<_, Vec<String>>(CacheNamespace::ChannelVideos, &key)
                .await?
            {
                Some(ids) => ids,
                None => {
                    let mut ids: Vec<String> = Vec::new();
                    let mut page_token: Option<String> = None;
                    for _ in 0..MAX_LIST_PAGES {
                        self.gate.acquire(QuotaCost::SEARCH_LIST).await?;
                        let (page, next) = platform
                            .popular_video_ids(channel_id, page_token.as_deref())
                            .await?;
                        ids.extend(page);
                        page_token = next;
                        if ids.len() >= target || page_token.is_none() {
                            break;
                        }
                    }
                    self.cache
                        .set(CacheNamespace::ChannelVideos, &key, &ids)
                        .await?;
                    ids
                }
            };

            let wanted = pool.missing_ids(&ids);
            let items = self.details_cached(&wanted, ItemSource::Search).await?;
            pool.extend(items);
            Ok(())
        }
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                if e.is_quota() {
                    *budget_hit = true;
                }
                tracing::warn!(channel_id, error = %e, "Popularity search failed");
                false
            }
        }
    }

    async fn collect_from_playlist(
        &self,
        channel: &ChannelAbout,
        channel_id: &str,
        target: usize,
        pool: &mut MergePool,
        budget_hit: &mut bool,
    ) {
        let Some(platform) = &self.platform else {
            return;
        };
        let Some(playlist_id) = uploads_playlist(channel, channel_id) else {
            tracing::warn!(channel_id, "No uploads playlist id available");
            return;
        };

        // Page-at-a-time with per-page error handling: a quota denial on
        // page 12 keeps pages 1-11.
        let key = ("playlist_ids", playlist_id.as_str(), target);
        let cached_ids = self
            .cache
            .get::<_, Vec<String>>(CacheNamespace::PlaylistItems, &key)
            .await
            .unwrap_or(None);

        let ids = match cached_ids {
            Some(ids) => ids,
            None => {
                let mut ids: Vec<String> = Vec::new();
                let mut page_token: Option<String> = None;
                let mut complete = true;
                for _ in 0..MAX_LIST_PAGES {
                    let page = async {
                        self.gate.acquire(QuotaCost::PLAYLIST_ITEMS_LIST).await?;
                        platform
                            .playlist_video_ids(&playlist_id, page_token.as_deref())
                            .await
                    }
                    .await;
                    match page {
                        Ok((page_ids, next)) => {
                            ids.extend(page_ids);
                            page_token = next;
                            if ids.len() >= target || page_token.is_none() {
                                break;
                            }
                        }
                        Err(e) => {
                            if e.is_quota() {
                                *budget_hit = true;
                            }
                            tracing::warn!(channel_id, error = %e, "Playlist page fetch failed");
                            complete = false;
                            break;
                        }
                    }
                }
                // Only a complete listing is worth caching.
                if complete {
                    if let Err(e) = self
                        .cache
                        .set(CacheNamespace::PlaylistItems, &key, &ids)
                        .await
                    {
                        tracing::warn!(error = %e, "Playlist cache write failed");
                    }
                }
                ids
            }
        };

        let wanted = pool.missing_ids(&ids);
        match self.details_cached(&wanted, ItemSource::Playlist).await {
            Ok(items) => pool.extend(items),
            Err(e) => {
                if e.is_quota() {
                    *budget_hit = true;
                }
                tracing::warn!(channel_id, error = %e, "Playlist details fetch failed");
            }
        }
    }

    /// Cached details lookup, batched at the API's 50-id ceiling. A quota
    /// denial mid-way returns the batches already fetched.
    async fn details_cached(&self, ids: &[String], source: ItemSource) -> Result<Vec<VideoItem>> {
        let mut out = Vec::new();
        for chunk in ids.chunks(MAX_IDS_PER_STATS_CALL) {
            match self.details_chunk(chunk, source).await {
                Ok(items) => out.extend(items),
                Err(e) if e.is_quota() && !out.is_empty() => {
                    tracing::warn!("Details fetch cut short by budget, keeping partial batches");
                    return Ok(out);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    async fn details_chunk(&self, chunk: &[String], source: ItemSource) -> Result<Vec<VideoItem>> {
        if let Some(mut cached) = self
            .cache
            .get::<_, Vec<VideoItem>>(CacheNamespace::VideoStatistics, &chunk)
            .await?
        {
            for item in &mut cached {
                item.source = source;
            }
            return Ok(cached);
        }
        let platform = self
            .platform
            .as_ref()
            .ok_or_else(|| TrendLensError::Config("no API key configured".into()))?;
        self.gate.acquire(QuotaCost::VIDEOS_LIST).await?;
        let items = platform.video_details(chunk, source).await?;
        self.cache
            .set(CacheNamespace::VideoStatistics, &chunk, &items)
            .await?;
        Ok(items)
    }

    /// On-demand statistics refresh for the items already selected into the
    /// trending and live lists, and only those. One fresh batch straight
    /// from the platform (never the cache), overwriting the volatile fields,
    /// dropping live entries that have since ended, and re-running the
    /// trending and live sorts over the updated figures.
    async fn refresh_selected(
        &self,
        trending_videos: &mut Vec<VideoItem>,
        trending_shorts: &mut Vec<VideoItem>,
        live_videos: &mut Vec<VideoItem>,
        refresh_trending: bool,
        refresh_live: bool,
        budget_hit: &mut bool,
    ) {
        let Some(platform) = &self.platform else {
            return;
        };

        let mut ids: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for item in trending_videos
            .iter()
            .chain(trending_shorts.iter())
            .chain(live_videos.iter())
        {
            if seen.insert(item.id.clone()) {
                ids.push(item.id.clone());
            }
        }
        if ids.is_empty() {
            return;
        }

        let mut fresh: HashMap<String, VideoItem> = HashMap::new();
        for chunk in ids.chunks(MAX_IDS_PER_STATS_CALL) {
            let batch = async {
                self.gate.acquire(QuotaCost::VIDEOS_LIST).await?;
                platform.video_details(chunk, ItemSource::Playlist).await
            }
            .await;
            match batch {
                Ok(items) => {
                    for item in items {
                        fresh.insert(item.id.clone(), item);
                    }
                }
                Err(e) => {
                    if e.is_quota() {
                        *budget_hit = true;
                    }
                    tracing::warn!(error = %e, "Statistics refresh failed, keeping cached figures");
                    return;
                }
            }
        }

        let now = Utc::now();
        if refresh_trending {
            for list in [&mut *trending_videos, &mut *trending_shorts] {
                for item in list.iter_mut() {
                    if let Some(f) = fresh.get(&item.id) {
                        overwrite_volatile(item, f);
                        ranking::apply_trending(item, now);
                    }
                }
                list.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));
                list.truncate(ranking::TRENDING_TOP_N);
            }
        }

        if refresh_live {
            live_videos.retain_mut(|item| {
                let Some(f) = fresh.get(&item.id) else {
                    // Gone from the platform entirely.
                    return false;
                };
                overwrite_volatile(item, f);
                item.is_live_candidate()
            });
            live_videos.sort_by(|a, b| b.live_sort_key().cmp(&a.live_sort_key()));
        }
    }
}

/// Copy the fields a real-time refresh is allowed to change. Identity and
/// ranking inputs set at fetch time stay as they were.
fn overwrite_volatile(item: &mut VideoItem, fresh: &VideoItem) {
    item.view_count = fresh.view_count;
    item.like_count = fresh.like_count;
    item.comment_count = fresh.comment_count;
    item.is_live = fresh.is_live;
    item.live_broadcast_state = fresh.live_broadcast_state;
    item.live_viewers = fresh.live_viewers;
}

fn uploads_playlist(channel: &ChannelAbout, channel_id: &str) -> Option<String> {
    if let Some(id) = &channel.uploads_playlist_id {
        if !id.is_empty() {
            return Some(id.clone());
        }
    }
    // The uploads playlist id is the channel id with the UC prefix swapped
    // for UU.
    channel_id
        .strip_prefix("UC")
        .map(|rest| format!("UU{rest}"))
}

struct RankedLists {
    videos: Vec<VideoItem>,
    shorts: Vec<VideoItem>,
    trending_videos: Vec<VideoItem>,
    trending_shorts: Vec<VideoItem>,
    live_videos: Vec<VideoItem>,
}

/// Recompute derived fields, pick the live and trending selections from the
/// whole merged pool, then partition into videos and shorts, rank each list,
/// and enforce the caps.
fn rank_and_cut(
    mut pool: Vec<VideoItem>,
    max_videos: usize,
    max_shorts: usize,
    live_top_k: usize,
) -> RankedLists {
    let now = Utc::now();
    for item in &mut pool {
        ranking::apply_trending(item, now);
    }

    // The live slot is an extra surface, not a partition: live items still
    // compete for the ranked lists below.
    let live_videos = ranking::select_top_live(&pool, live_top_k);

    let (mut shorts, mut videos): (Vec<VideoItem>, Vec<VideoItem>) =
        pool.into_iter().partition(|item| item.is_short);

    // Trending comes from everything fetched, before the view-count cut: a
    // freshly published item rarely has the views to survive that cut.
    let trending_videos = ranking::top_trending(&videos, ranking::TRENDING_TOP_N);
    let trending_shorts = ranking::top_trending(&shorts, ranking::TRENDING_TOP_N);

    ranking::sort_by_views_desc(&mut videos);
    ranking::sort_by_views_desc(&mut shorts);
    videos.truncate(max_videos);
    shorts.truncate(max_shorts);

    RankedLists {
        videos,
        shorts,
        trending_videos,
        trending_shorts,
        live_videos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_video;
    use chrono::Duration;

    #[test]
    fn fetch_targets_have_floors() {
        assert_eq!(search_fetch_target(5, 5), 200);
        assert_eq!(search_fetch_target(10, 10), 400);
        assert_eq!(playlist_fetch_target(5, 5), 300);
        assert_eq!(playlist_fetch_target(20, 5), 600);
    }

    #[test]
    fn uploads_playlist_derivation() {
        let mut channel = ChannelAbout::placeholder("UCabcdefghijklmnopqrstuv");
        assert_eq!(
            uploads_playlist(&channel, "UCabcdefghijklmnopqrstuv").as_deref(),
            Some("UUabcdefghijklmnopqrstuv")
        );
        channel.uploads_playlist_id = Some("UUexplicit".to_string());
        assert_eq!(
            uploads_playlist(&channel, "UCabcdefghijklmnopqrstuv").as_deref(),
            Some("UUexplicit")
        );
    }

    #[test]
    fn trending_selected_before_view_cut() {
        let now = Utc::now();
        let mut pool: Vec<VideoItem> = (0..5)
            .map(|i| {
                let mut v = make_video(&format!("old{i}"), 1_000_000 - i);
                v.published_at = Some(now - Duration::days(30));
                v
            })
            .collect();
        let mut fresh = make_video("fresh", 1_000);
        fresh.published_at = Some(now - Duration::hours(2));
        pool.push(fresh);

        let ranked = rank_and_cut(pool, 5, 5, 1);

        // The low-view newcomer loses the view-count cut but still takes the
        // trending slot.
        assert!(ranked.videos.iter().all(|v| v.id != "fresh"));
        assert_eq!(ranked.trending_videos.len(), 1);
        assert_eq!(ranked.trending_videos[0].id, "fresh");
    }

    #[test]
    fn live_items_stay_in_ranked_lists() {
        let mut live = make_video("live1", 500);
        live.is_live = true;
        live.live_viewers = Some(40);

        let ranked = rank_and_cut(vec![live, make_video("v1", 100)], 5, 5, 1);

        assert_eq!(ranked.live_videos.len(), 1);
        assert_eq!(ranked.live_videos[0].id, "live1");
        assert!(ranked.videos.iter().any(|v| v.id == "live1"));
    }
}
