use std::sync::Arc;

use clap::{Parser, Subcommand};
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use trendlens_common::Config;
use trendlens_engine::{
    ApiGate, CacheStore, CounterStore, FetchOptions, FetchOrchestrator, MemoryStore,
    PageOrchestrator, PostgresStore, QuotaTracker, RateLimiter, ResponseCache,
};
use trendlens_engine::traits::{ChannelScraper, VideoPlatform};
use trendlens_scraper::{InstagramScraper, YouTubeScraper};
use youtube_data_client::YouTubeDataClient;

#[derive(Parser)]
#[command(name = "trendlens", about = "Quota-aware trending-content analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one or more channel references (URLs, ids, or @handles)
    Channels {
        refs: Vec<String>,
        #[arg(long, default_value_t = 10)]
        max_videos: usize,
        #[arg(long, default_value_t = 10)]
        max_shorts: usize,
        /// Refresh the trending selection with fresh, un-cached statistics
        #[arg(long)]
        real_time_trending: bool,
        /// Refresh the live selection with fresh, un-cached statistics
        #[arg(long)]
        real_time_live: bool,
    },
    /// Analyze one or more Instagram page references
    Pages {
        refs: Vec<String>,
        #[arg(long, default_value_t = 12)]
        max_posts: usize,
        #[arg(long, default_value_t = 12)]
        max_reels: usize,
    },
    /// Search channels by name
    Search {
        query: String,
        #[arg(long, default_value_t = 10)]
        max_results: u32,
    },
    /// Show the current daily quota budget
    Quota,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_redacted();

    let (counters, cache_store): (Arc<dyn CounterStore>, Arc<dyn CacheStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = PgPool::connect(url).await?;
                PostgresStore::migrate(&pool).await?;
                let store = Arc::new(PostgresStore::new(pool));
                (store.clone(), store)
            }
            None => {
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    let gate = Arc::new(ApiGate::new(
        QuotaTracker::new(
            counters.clone(),
            config.daily_quota_limit,
            config.quota_warning_threshold,
            config.quota_reset_hour_utc,
        ),
        RateLimiter::new(
            counters,
            config.max_requests_per_second,
            config.max_requests_per_minute,
        ),
    ));
    let cache = Arc::new(ResponseCache::new(
        cache_store,
        config.cache_ttls.clone(),
        config.cache_enabled,
    ));

    let platform: Option<Arc<dyn VideoPlatform>> = config
        .youtube_api_key
        .as_ref()
        .map(|key| {
            Arc::new(YouTubeDataClient::new(key, config.request_timeout)) as Arc<dyn VideoPlatform>
        });
    let scraper: Option<Arc<dyn ChannelScraper>> = config.use_scraping_fallback.then(|| {
        Arc::new(YouTubeScraper::new(config.request_timeout)) as Arc<dyn ChannelScraper>
    });

    let orchestrator = FetchOrchestrator::new(
        platform,
        scraper,
        gate,
        cache,
        FetchOptions::from(&config),
    );

    match cli.command {
        Command::Channels {
            refs,
            max_videos,
            max_shorts,
            real_time_trending,
            real_time_live,
        } => {
            let report = orchestrator
                .analyze_channels(&refs, max_videos, max_shorts, real_time_trending, real_time_live)
                .await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Pages {
            refs,
            max_posts,
            max_reels,
        } => {
            let pages =
                PageOrchestrator::new(Arc::new(InstagramScraper::new(config.request_timeout)));
            let report = pages.analyze_pages(&refs, max_posts, max_reels).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Search { query, max_results } => {
            let results = orchestrator.search_channels(&query, max_results).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Quota => {
            let status = orchestrator.quota_status().await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
