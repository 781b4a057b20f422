//! Channel reference resolution. Accepts every URL shape users paste plus
//! raw ids and @handles, and turns each into a canonical channel id while
//! spending as little quota as possible: free paths first, the 100-unit
//! search calls last.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;

use trendlens_common::TrendLensError;
use youtube_data_client::QuotaCost;

use crate::budget::ApiGate;
use crate::traits::{ChannelScraper, VideoPlatform};

type Result<T> = std::result::Result<T, TrendLensError>;

/// A parsed channel reference. Each form has its own resolution path and
/// cost profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Canonical UC... id. Resolution is free.
    Id(String),
    /// /user/Name or /c/Name. One channels.list call.
    LegacyUsername(String),
    /// @handle, with or without a URL around it.
    Handle(String),
    /// Anything else; treated as a search query.
    Query(String),
}

fn id_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/channel/(UC[a-zA-Z0-9_-]{22})").expect("valid regex"))
}

fn bare_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^UC[a-zA-Z0-9_-]{22}$").expect("valid regex"))
}

fn legacy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(?:c|user)/([A-Za-z0-9_.-]+)").expect("valid regex"))
}

fn handle_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@([A-Za-z0-9_.-]+)").expect("valid regex"))
}

/// Classify a raw channel reference. Never fails; an unrecognized string
/// becomes a search query.
pub fn parse_channel_ref(input: &str) -> ChannelRef {
    let trimmed = input.trim();

    if let Some(caps) = id_url_re().captures(trimmed) {
        return ChannelRef::Id(caps[1].to_string());
    }
    if bare_id_re().is_match(trimmed) {
        return ChannelRef::Id(trimmed.to_string());
    }
    if let Some(caps) = legacy_re().captures(trimmed) {
        return ChannelRef::LegacyUsername(caps[1].to_string());
    }
    if let Some(caps) = handle_re().captures(trimmed) {
        return ChannelRef::Handle(caps[1].to_string());
    }
    ChannelRef::Query(trimmed.to_string())
}

/// One step in the handle resolution chain, with its quota cost declared
/// up front so the admission check runs before dispatch.
struct ResolveStrategy {
    name: &'static str,
    cost: u64,
    kind: StrategyKind,
}

enum StrategyKind {
    ScrapeHandlePage,
    SearchQuery(String),
}

fn handle_strategies(handle: &str, use_scraping: bool) -> Vec<ResolveStrategy> {
    let mut strategies = Vec::new();
    if use_scraping {
        strategies.push(ResolveStrategy {
            name: "scrape_handle_page",
            cost: 0,
            kind: StrategyKind::ScrapeHandlePage,
        });
    }
    for (name, query) in [
        ("search_handle_url", format!("youtube.com/@{handle}")),
        ("search_at_handle", format!("@{handle}")),
        ("search_bare_handle", handle.to_string()),
    ] {
        strategies.push(ResolveStrategy {
            name,
            cost: QuotaCost::SEARCH_LIST,
            kind: StrategyKind::SearchQuery(query),
        });
    }
    strategies
}

pub struct ChannelResolver {
    platform: Option<Arc<dyn VideoPlatform>>,
    scraper: Option<Arc<dyn ChannelScraper>>,
    gate: Arc<ApiGate>,
    use_scraping: bool,
}

impl ChannelResolver {
    pub fn new(
        platform: Option<Arc<dyn VideoPlatform>>,
        scraper: Option<Arc<dyn ChannelScraper>>,
        gate: Arc<ApiGate>,
        use_scraping: bool,
    ) -> Self {
        Self {
            platform,
            scraper,
            gate,
            use_scraping,
        }
    }

    /// Resolve any supported reference to a canonical channel id.
    pub async fn resolve(&self, reference: &str) -> Result<String> {
        match parse_channel_ref(reference) {
            ChannelRef::Id(id) => Ok(id),
            ChannelRef::LegacyUsername(username) => self.resolve_legacy(reference, &username).await,
            ChannelRef::Handle(handle) => self.resolve_handle(reference, &handle).await,
            ChannelRef::Query(query) => self.resolve_handle(reference, &query).await,
        }
    }

    async fn resolve_legacy(&self, reference: &str, username: &str) -> Result<String> {
        let Some(platform) = &self.platform else {
            return Err(TrendLensError::Resolution(reference.to_string()));
        };
        self.gate.acquire(QuotaCost::CHANNELS_LIST).await?;
        match platform.channel_by_legacy_username(username).await? {
            Some(about) => Ok(about.channel_id),
            None => Err(TrendLensError::Resolution(reference.to_string())),
        }
    }

    async fn resolve_handle(&self, reference: &str, handle: &str) -> Result<String> {
        for strategy in handle_strategies(handle, self.use_scraping) {
            match self.try_strategy(&strategy, handle).await {
                Ok(Some(channel_id)) => {
                    tracing::info!(
                        handle,
                        channel_id,
                        strategy = strategy.name,
                        cost = strategy.cost,
                        "Channel reference resolved"
                    );
                    return Ok(channel_id);
                }
                Ok(None) => continue,
                // Budget denial aborts the chain; the remaining strategies
                // are at least as expensive.
                Err(e) if e.is_quota() => return Err(e),
                Err(e) => {
                    tracing::debug!(
                        handle,
                        strategy = strategy.name,
                        error = %e,
                        "Resolution strategy failed, trying next"
                    );
                }
            }
        }
        Err(TrendLensError::Resolution(reference.to_string()))
    }

    async fn try_strategy(&self, strategy: &ResolveStrategy, handle: &str) -> Result<Option<String>> {
        match &strategy.kind {
            StrategyKind::ScrapeHandlePage => match &self.scraper {
                Some(scraper) => scraper.resolve_handle(handle).await,
                None => Ok(None),
            },
            StrategyKind::SearchQuery(query) => {
                let Some(platform) = &self.platform else {
                    return Ok(None);
                };
                self.gate.acquire(strategy.cost).await?;
                let candidates = platform.find_channels(query, 5).await?;
                Ok(pick_candidate(handle, &candidates))
            }
        }
    }
}

/// Rank search candidates: exact custom-URL match beats a title containing
/// the handle, which beats blindly taking the first result.
fn pick_candidate(
    handle: &str,
    candidates: &[trendlens_common::ChannelSummary],
) -> Option<String> {
    let wanted = format!("@{}", handle.to_lowercase());
    if let Some(hit) = candidates
        .iter()
        .find(|c| c.custom_url.to_lowercase() == wanted)
    {
        return Some(hit.channel_id.clone());
    }
    let lower = handle.to_lowercase();
    if let Some(hit) = candidates
        .iter()
        .find(|c| c.name.to_lowercase().contains(&lower))
    {
        return Some(hit.channel_id.clone());
    }
    candidates
        .iter()
        .find(|c| !c.channel_id.is_empty())
        .map(|c| c.channel_id.clone())
}
