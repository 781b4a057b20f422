//! End-to-end orchestration tests over mock sources: batch isolation,
//! ranking caps, live selection, fallback order, and budget behavior.

use std::sync::Arc;

use chrono::{Duration, Utc};
use trendlens_common::{CacheTtls, LiveBroadcastState, TrendLensError};
use trendlens_engine::testing::{make_channel, make_video, MockPlatform, MockScraper};
use trendlens_engine::{
    ApiGate, FetchOptions, FetchOrchestrator, MemoryStore, QuotaTracker, RateLimiter,
    ResponseCache,
};

const CH_A: &str = "UCaaaaaaaaaaaaaaaaaaaaaa";
const CH_B: &str = "UCbbbbbbbbbbbbbbbbbbbbbb";

fn uploads(channel_id: &str) -> String {
    format!("UU{}", &channel_id[2..])
}

fn options() -> FetchOptions {
    FetchOptions {
        use_search_api: false,
        use_scraping_fallback: false,
        live_top_k: 1,
    }
}

fn build(
    platform: MockPlatform,
    options: FetchOptions,
    quota_limit: u64,
) -> (FetchOrchestrator, Arc<MockPlatform>, Arc<ApiGate>) {
    let platform = Arc::new(platform);
    let store = Arc::new(MemoryStore::new());
    let gate = Arc::new(ApiGate::new(
        QuotaTracker::new(store.clone(), quota_limit, quota_limit * 8 / 10, 8),
        RateLimiter::new(store.clone(), 1_000, 10_000),
    ));
    let cache = Arc::new(ResponseCache::new(store, CacheTtls::default(), true));
    let orchestrator = FetchOrchestrator::new(
        Some(platform.clone()),
        None,
        gate.clone(),
        cache,
        options,
    );
    (orchestrator, platform, gate)
}

#[tokio::test]
async fn caps_and_descending_order() {
    let mut platform = MockPlatform::new().with_channel(make_channel(CH_A)).with_playlist(
        &uploads(CH_A),
        vec![vec!["v1", "v2", "v3", "v4", "v5", "s1", "s2", "s3"]],
    );
    for (id, views) in [("v1", 50u64), ("v2", 900), ("v3", 10), ("v4", 300), ("v5", 70)] {
        platform = platform.with_video(make_video(id, views));
    }
    for (id, views) in [("s1", 5u64), ("s2", 80), ("s3", 40)] {
        let mut short = make_video(id, views);
        short.duration_seconds = 45;
        short.is_short = true;
        platform = platform.with_video(short);
    }

    let (orchestrator, _, _) = build(platform, options(), 10_000);
    let result = orchestrator
        .fetch_channel_content(CH_A, 3, 2, false, false)
        .await
        .unwrap();

    let video_ids: Vec<&str> = result.videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(video_ids, ["v2", "v4", "v5"]);
    let short_ids: Vec<&str> = result.shorts.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(short_ids, ["s2", "s3"]);
    assert_eq!(result.total_fetched, 8);
}

#[tokio::test]
async fn single_live_slot_with_viewer_tiebreak() {
    let mut platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(&uploads(CH_A), vec![vec!["v1"]])
        .with_video(make_video("v1", 100));
    platform
        .live_ids
        .insert(CH_A.to_string(), vec!["live1".to_string(), "live2".to_string()]);

    // live1 has more total views but an unknown viewer figure; live2's known
    // viewer count must win the slot.
    let mut live1 = make_video("live1", 9_000);
    live1.is_live = true;
    live1.live_broadcast_state = LiveBroadcastState::Live;
    let mut live2 = make_video("live2", 5_000);
    live2.is_live = true;
    live2.live_broadcast_state = LiveBroadcastState::Live;
    live2.live_viewers = Some(100);
    platform = platform.with_video(live1).with_video(live2);

    let (orchestrator, _, _) = build(platform, options(), 10_000);
    let result = orchestrator
        .fetch_channel_content(CH_A, 10, 10, false, false)
        .await
        .unwrap();

    assert_eq!(result.live_videos.len(), 1);
    assert_eq!(result.live_videos[0].id, "live2");
    // The live slot is a separate surface; live items still rank in the
    // regular list by views.
    let video_ids: Vec<&str> = result.videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(video_ids, ["live1", "live2", "v1"]);
}

#[tokio::test]
async fn playlist_fallback_runs_without_search() {
    let platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(&uploads(CH_A), vec![vec!["v1", "v2"]])
        .with_video(make_video("v1", 10))
        .with_video(make_video("v2", 20));

    let (orchestrator, platform, _) = build(platform, options(), 10_000);
    orchestrator
        .fetch_channel_content(CH_A, 5, 5, false, false)
        .await
        .unwrap();

    assert_eq!(platform.call_count("popular_video_ids"), 0);
    assert!(platform.call_count("playlist_video_ids") >= 1);
}

#[tokio::test]
async fn sufficient_search_haul_skips_playlist() {
    let mut platform = MockPlatform::new().with_channel(make_channel(CH_A));
    platform.popular_pages.insert(
        CH_A.to_string(),
        vec![vec!["v1".to_string(), "v2".to_string(), "s1".to_string(), "s2".to_string()]],
    );
    platform = platform
        .with_playlist(&uploads(CH_A), vec![vec!["v1", "v2", "s1", "s2"]])
        .with_video(make_video("v1", 100))
        .with_video(make_video("v2", 50));
    for id in ["s1", "s2"] {
        let mut short = make_video(id, 10);
        short.duration_seconds = 30;
        short.is_short = true;
        platform = platform.with_video(short);
    }

    let mut opts = options();
    opts.use_search_api = true;
    let (orchestrator, platform, _) = build(platform, opts, 10_000);
    orchestrator
        .fetch_channel_content(CH_A, 2, 2, false, false)
        .await
        .unwrap();

    // Both category caps were met by search, so the playlist path stays idle.
    assert!(platform.call_count("popular_video_ids") >= 1);
    assert_eq!(platform.call_count("playlist_video_ids"), 0);
}

#[tokio::test]
async fn playlist_fills_category_search_left_short() {
    let mut platform = MockPlatform::new().with_channel(make_channel(CH_A));
    // Search delivers plenty of regular videos but not a single short.
    platform.popular_pages.insert(
        CH_A.to_string(),
        vec![vec!["v1".to_string(), "v2".to_string(), "v3".to_string(), "v4".to_string()]],
    );
    platform = platform
        .with_playlist(&uploads(CH_A), vec![vec!["v1", "v2", "v3", "v4", "s1", "s2"]])
        .with_video(make_video("v1", 400))
        .with_video(make_video("v2", 300))
        .with_video(make_video("v3", 200))
        .with_video(make_video("v4", 100));
    for (id, views) in [("s1", 20u64), ("s2", 40)] {
        let mut short = make_video(id, views);
        short.duration_seconds = 30;
        short.is_short = true;
        platform = platform.with_video(short);
    }

    let mut opts = options();
    opts.use_search_api = true;
    let (orchestrator, platform, _) = build(platform, opts, 10_000);
    let result = orchestrator
        .fetch_channel_content(CH_A, 2, 2, false, false)
        .await
        .unwrap();

    assert!(platform.call_count("playlist_video_ids") >= 1);
    let short_ids: Vec<&str> = result.shorts.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(short_ids, ["s2", "s1"]);
}

#[tokio::test]
async fn batch_isolates_one_bad_reference() {
    let platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_channel(make_channel(CH_B))
        .with_playlist(&uploads(CH_A), vec![vec!["a1"]])
        .with_playlist(&uploads(CH_B), vec![vec!["b1"]])
        .with_video(make_video("a1", 10))
        .with_video(make_video("b1", 20));

    let (orchestrator, _, _) = build(platform, options(), 100_000);
    let refs = vec![CH_A.to_string(), "@no.such.channel".to_string(), CH_B.to_string()];
    let report = orchestrator.analyze_channels(&refs, 5, 5, false, false).await;

    assert_eq!(report.total_processed, 2);
    assert_eq!(report.total_failed, 1);
    assert_eq!(report.errors[0].channel_ref, "@no.such.channel");
    assert!(!report.errors[0].quota_exceeded);
    assert!(report.errors[0].message.contains("@no.such.channel"));
}

#[tokio::test]
async fn exhausted_budget_is_flagged_not_mislabeled() {
    let platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(&uploads(CH_A), vec![vec!["v1"]])
        .with_video(make_video("v1", 10));

    // Nothing is affordable, so even the 1-unit calls get denied.
    let (orchestrator, _, _) = build(platform, options(), 0);
    let report = orchestrator
        .analyze_channels(&[CH_A.to_string()], 5, 5, false, false)
        .await;

    assert_eq!(report.total_processed, 0);
    assert_eq!(report.total_failed, 1);
    assert!(report.errors[0].quota_exceeded);
}

#[tokio::test]
async fn real_time_refresh_updates_trending_selection_only() {
    let now = Utc::now();
    let mut v1 = make_video("v1", 10);
    v1.published_at = Some(now - Duration::hours(2));
    let mut v2 = make_video("v2", 500);
    v2.published_at = Some(now - Duration::hours(2));

    let platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(&uploads(CH_A), vec![vec!["v1", "v2"]])
        .with_video(v1)
        .with_video(v2)
        .with_refreshed(make_video("v1", 9_999));

    let (orchestrator, platform, _) = build(platform, options(), 10_000);
    let result = orchestrator
        .fetch_channel_content(CH_A, 5, 5, true, false)
        .await
        .unwrap();

    // v1's refreshed count re-scores it past v2 in the trending list.
    assert_eq!(result.trending_videos[0].id, "v1");
    assert_eq!(result.trending_videos[0].view_count, 9_999);
    // The view-ranked list is outside the refresh scope and keeps the
    // figures it was fetched with.
    assert_eq!(result.videos[0].id, "v2");
    assert_eq!(result.videos[0].view_count, 500);
    // Initial details plus the refresh pass.
    assert!(platform.call_count("video_details") >= 2);
}

#[tokio::test]
async fn refresh_skipped_unless_requested() {
    let platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(&uploads(CH_A), vec![vec!["v1", "v2"]])
        .with_video(make_video("v1", 10))
        .with_video(make_video("v2", 500))
        .with_refreshed(make_video("v1", 9_999));

    let (orchestrator, platform, _) = build(platform, options(), 10_000);
    let result = orchestrator
        .fetch_channel_content(CH_A, 5, 5, false, false)
        .await
        .unwrap();

    assert_eq!(result.videos[0].id, "v2");
    assert_eq!(platform.call_count("video_details"), 1);
}

#[tokio::test]
async fn refresh_drops_streams_that_ended() {
    let mut platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(&uploads(CH_A), vec![vec!["v1"]])
        .with_video(make_video("v1", 10));
    platform.live_ids.insert(CH_A.to_string(), vec!["live1".to_string()]);

    let mut live = make_video("live1", 1_000);
    live.is_live = true;
    live.live_broadcast_state = LiveBroadcastState::Live;
    live.live_viewers = Some(50);
    platform = platform.with_video(live);

    // By refresh time the broadcast has ended.
    let mut ended = make_video("live1", 1_000);
    ended.is_live = false;
    ended.live_broadcast_state = LiveBroadcastState::None;
    ended.live_viewers = None;
    platform = platform.with_refreshed(ended);

    let (orchestrator, _, _) = build(platform, options(), 10_000);
    let result = orchestrator
        .fetch_channel_content(CH_A, 5, 5, false, true)
        .await
        .unwrap();

    assert!(result.live_videos.is_empty());
}

#[tokio::test]
async fn trending_includes_fresh_low_view_item() {
    let now = Utc::now();
    let mut platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(
            &uploads(CH_A),
            vec![vec!["old1", "old2", "old3", "old4", "old5", "fresh"]],
        );
    for (i, id) in ["old1", "old2", "old3", "old4", "old5"].iter().enumerate() {
        let mut v = make_video(id, 1_000_000 - i as u64);
        v.published_at = Some(now - Duration::days(60));
        platform = platform.with_video(v);
    }
    let mut fresh = make_video("fresh", 1_000);
    fresh.published_at = Some(now - Duration::hours(2));
    platform = platform.with_video(fresh);

    let (orchestrator, _, _) = build(platform, options(), 10_000);
    let result = orchestrator
        .fetch_channel_content(CH_A, 5, 5, false, false)
        .await
        .unwrap();

    // The newcomer loses the view-count cut but must still surface as
    // trending.
    assert!(result.videos.iter().all(|v| v.id != "fresh"));
    assert!(result.trending_videos.iter().any(|v| v.id == "fresh"));
}

#[tokio::test]
async fn channel_search_caps_result_count() {
    let (orchestrator, platform, _) = build(MockPlatform::new(), options(), 10_000);
    orchestrator.search_channels("lofi", 50).await.unwrap();

    assert!(platform.calls().contains(&"find_channels:lofi:20".to_string()));
}

#[tokio::test]
async fn scrape_fallback_serves_without_api_key() {
    let mut scraper = MockScraper::new();
    scraper
        .videos
        .insert(CH_A.to_string(), vec![make_video("sv1", 7)]);
    let scraper = Arc::new(scraper);

    let store = Arc::new(MemoryStore::new());
    let gate = Arc::new(ApiGate::new(
        QuotaTracker::new(store.clone(), 10_000, 8_000, 8),
        RateLimiter::new(store.clone(), 1_000, 10_000),
    ));
    let cache = Arc::new(ResponseCache::new(store, CacheTtls::default(), true));
    let orchestrator = FetchOrchestrator::new(
        None,
        Some(scraper),
        gate.clone(),
        cache,
        FetchOptions {
            use_search_api: false,
            use_scraping_fallback: true,
            live_top_k: 1,
        },
    );

    let result = orchestrator
        .fetch_channel_content(CH_A, 5, 5, false, false)
        .await
        .unwrap();
    assert_eq!(result.videos.len(), 1);
    assert_eq!(result.videos[0].id, "sv1");
    assert_eq!(gate.status().await.unwrap().used, 0);
}

#[tokio::test]
async fn empty_channel_reports_no_content() {
    let platform = MockPlatform::new()
        .with_channel(make_channel(CH_A))
        .with_playlist(&uploads(CH_A), vec![vec![]]);

    let (orchestrator, _, _) = build(platform, options(), 10_000);
    let err = orchestrator
        .fetch_channel_content(CH_A, 5, 5, false, false)
        .await
        .unwrap_err();
    assert!(matches!(err, TrendLensError::NoContent(_)));
}
