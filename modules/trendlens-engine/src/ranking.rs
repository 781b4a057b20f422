//! Pure ranking rules: shorts classification, trending detection and
//! scoring, view-ordered sorting, and live-broadcast selection. Everything
//! here is deterministic in its inputs so the orchestrator stays testable.

use chrono::{DateTime, Utc};

use trendlens_common::VideoItem;

/// Trending window, in hours since publish.
pub const TRENDING_WINDOW_HOURS: f64 = 3.0;
/// Below this age the velocity math degenerates, so the score switches to a
/// flat view multiplier instead of dividing by a near-zero hour count.
pub const FRESH_BOOST_HOURS: f64 = 0.1;
const FRESH_BOOST_FACTOR: f64 = 10.0;

/// How many trending items each of the video and shorts lists surfaces.
pub const TRENDING_TOP_N: usize = 3;

/// A short is at most 60 seconds. Zero duration means a live or unparsed
/// item, never a short.
pub fn is_short(duration_seconds: u32) -> bool {
    (1..=60).contains(&duration_seconds)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendingInfo {
    pub hours_since_publish: f64,
    pub is_trending: bool,
    pub trending_score: f64,
}

impl TrendingInfo {
    fn none(hours: f64) -> Self {
        Self {
            hours_since_publish: hours,
            is_trending: false,
            trending_score: 0.0,
        }
    }
}

/// Velocity-based trending: views per hour within the publish window, with
/// a flat boost for items younger than [`FRESH_BOOST_HOURS`]. Outside the
/// window the score is 0 and the item is not trending.
pub fn compute_trending(
    published_at: Option<DateTime<Utc>>,
    view_count: u64,
    now: DateTime<Utc>,
) -> TrendingInfo {
    let Some(published) = published_at else {
        return TrendingInfo::none(0.0);
    };
    let hours = (now - published).num_milliseconds() as f64 / 3_600_000.0;
    if !(0.0..=TRENDING_WINDOW_HOURS).contains(&hours) {
        return TrendingInfo::none(hours.max(0.0));
    }
    let score = if hours < FRESH_BOOST_HOURS {
        view_count as f64 * FRESH_BOOST_FACTOR
    } else {
        view_count as f64 / hours
    };
    TrendingInfo {
        hours_since_publish: hours,
        is_trending: true,
        trending_score: score,
    }
}

/// Recompute the derived trending fields on an item in place.
pub fn apply_trending(item: &mut VideoItem, now: DateTime<Utc>) {
    let info = compute_trending(item.published_at, item.view_count, now);
    item.hours_since_publish = info.hours_since_publish;
    item.is_trending = info.is_trending;
    item.trending_score = info.trending_score;
}

/// Stable descending sort by view count. Equal counts keep fetch order.
pub fn sort_by_views_desc(items: &mut [VideoItem]) {
    items.sort_by(|a, b| b.view_count.cmp(&a.view_count));
}

/// Top `n` trending items by score, descending.
pub fn top_trending(items: &[VideoItem], n: usize) -> Vec<VideoItem> {
    let mut trending: Vec<VideoItem> = items.iter().filter(|v| v.is_trending).cloned().collect();
    trending.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));
    trending.truncate(n);
    trending
}

/// Top `k` live candidates, ranked by concurrent viewers with total views
/// as the tie-break.
pub fn select_top_live(items: &[VideoItem], k: usize) -> Vec<VideoItem> {
    let mut live: Vec<VideoItem> = items
        .iter()
        .filter(|v| v.is_live_candidate())
        .cloned()
        .collect();
    live.sort_by(|a, b| b.live_sort_key().cmp(&a.live_sort_key()));
    live.truncate(k);
    live
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use trendlens_common::{ItemSource, LiveBroadcastState};

    fn video(id: &str, views: u64) -> VideoItem {
        VideoItem {
            id: id.to_string(),
            title: String::new(),
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

    #[test]
    fn shorts_boundary() {
        assert!(is_short(59));
        assert!(is_short(60));
        assert!(!is_short(65));
        assert!(!is_short(0));
    }

    #[test]
    fn trending_score_is_views_per_hour() {
        let now = Utc::now();
        let info = compute_trending(Some(now - Duration::hours(2)), 1_000, now);
        assert!(info.is_trending);
        assert!((info.trending_score - 500.0).abs() < 1.0);
    }

    #[test]
    fn fresh_items_get_flat_boost() {
        let now = Utc::now();
        let info = compute_trending(Some(now - Duration::minutes(3)), 1_000, now);
        assert!(info.is_trending);
        assert_eq!(info.trending_score, 10_000.0);
    }

    #[test]
    fn outside_window_is_not_trending() {
        let now = Utc::now();
        let info = compute_trending(Some(now - Duration::hours(4)), 1_000_000, now);
        assert!(!info.is_trending);
        assert_eq!(info.trending_score, 0.0);

        assert!(!compute_trending(None, 1_000, now).is_trending);
    }

    #[test]
    fn view_sort_is_stable_descending() {
        let mut items = vec![video("a", 10), video("b", 30), video("c", 30), video("d", 5)];
        sort_by_views_desc(&mut items);
        let ids: Vec<&str> = items.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a", "d"]);
    }

    #[test]
    fn viewers_outrank_views_for_live() {
        let mut a = video("a", 9_000);
        a.is_live = true;
        let mut b = video("b", 5_000);
        b.is_live = true;
        b.live_viewers = Some(100);

        let top = select_top_live(&[a, b], 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, "b");
    }

    #[test]
    fn top_trending_sorted_by_score() {
        let now = Utc::now();
        let mut items = Vec::new();
        for (id, views, mins) in [("a", 100u64, 150i64), ("b", 900, 150), ("c", 500, 150), ("d", 300, 150)] {
            let mut v = video(id, views);
            v.published_at = Some(now - Duration::minutes(mins));
            apply_trending(&mut v, now);
            items.push(v);
        }
        let top = top_trending(&items, TRENDING_TOP_N);
        let ids: Vec<&str> = top.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "d"]);
    }
}
