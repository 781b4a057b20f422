pub mod error;
pub mod instagram;
pub mod youtube;

pub use error::{Result, ScrapeError};
pub use instagram::InstagramScraper;
pub use youtube::{ScrapedChannel, ScrapedVideoRef, ScrapedVideoStats, YouTubeScraper};

use std::time::Duration;

use rand::prelude::IndexedRandom;

/// Realistic desktop user agents, rotated per request to avoid tripping
/// anti-scraping defenses.
pub(crate) const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Fixed inter-request delay applied after every page fetch.
pub(crate) const REQUEST_DELAY: Duration = Duration::from_millis(1000);

pub(crate) fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Fetch a page with a rotated identity, returning None on non-2xx status.
/// Applies the fixed delay after the request completes.
pub(crate) async fn fetch_page(
    client: &reqwest::Client,
    url: &str,
    delay: Duration,
) -> Result<Option<String>> {
    let resp = client
        .get(url)
        .header("User-Agent", random_user_agent())
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?;

    let status = resp.status();
    let body = if status.is_success() {
        Some(resp.text().await?)
    } else {
        tracing::debug!(url, status = status.as_u16(), "Scrape fetch non-success");
        None
    };

    tokio::time::sleep(delay).await;
    Ok(body)
}
