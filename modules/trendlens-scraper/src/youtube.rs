//! Best-effort scraping of public YouTube pages. Implements the same
//! logical operations as the paid API client at zero quota cost: handle
//! resolution, channel info, video listing, per-video stats. Completeness
//! is not guaranteed; every extraction failure degrades to "no data".

use std::time::Duration;

use regex::Regex;
use std::sync::OnceLock;

use trendlens_common::parse_count;

use crate::{error::Result, fetch_page, REQUEST_DELAY};

#[derive(Debug, Clone)]
pub struct ScrapedChannel {
    pub channel_id: String,
    pub name: String,
    pub subscriber_count: u64,
    pub view_count: u64,
    pub thumbnail: String,
}

#[derive(Debug, Clone)]
pub struct ScrapedVideoRef {
    pub video_id: String,
    pub title: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone)]
pub struct ScrapedVideoStats {
    pub video_id: String,
    pub view_count: u64,
    pub like_count: u64,
    pub published_at: String,
}

pub struct YouTubeScraper {
    client: reqwest::Client,
    delay: Duration,
}

fn channel_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""channelId":"(UC[a-zA-Z0-9_-]{22})""#).expect("valid regex"))
}

fn canonical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<link rel="canonical" href="https://www\.youtube\.com/channel/(UC[a-zA-Z0-9_-]{22})""#)
            .expect("valid regex")
    })
}

fn external_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""externalId":"(UC[a-zA-Z0-9_-]{22})""#).expect("valid regex"))
}

impl YouTubeScraper {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            delay: REQUEST_DELAY,
        }
    }

    #[cfg(test)]
    fn without_delay(mut self) -> Self {
        self.delay = Duration::ZERO;
        self
    }

    /// Resolve an @handle to a channel id by scraping the channel page.
    /// Tries the canonical link, then the page-metadata external id, then
    /// the first channel-id literal anywhere in the page source.
    pub async fn resolve_handle(&self, handle: &str) -> Result<Option<String>> {
        let url = format!("https://www.youtube.com/@{handle}");
        let Some(html) = fetch_page(&self.client, &url, self.delay).await? else {
            return Ok(None);
        };

        for re in [canonical_re(), external_id_re(), channel_id_re()] {
            if let Some(caps) = re.captures(&html) {
                let channel_id = caps[1].to_string();
                tracing::info!(handle, channel_id, "Resolved handle via page scrape");
                return Ok(Some(channel_id));
            }
        }

        tracing::debug!(handle, "No channel id found in handle page");
        Ok(None)
    }

    /// Scrape channel name, subscriber/view counts, and avatar from the
    /// public about page.
    pub async fn channel_about(&self, channel_id: &str) -> Result<Option<ScrapedChannel>> {
        let url = format!("https://www.youtube.com/channel/{channel_id}/about");
        let Some(html) = fetch_page(&self.client, &url, self.delay).await? else {
            return Ok(None);
        };

        let name = extract_meta(&html, "og:title")
            .map(|t| t.trim_end_matches(" - YouTube").trim().to_string())
            .unwrap_or_default();
        if name.is_empty() {
            return Ok(None);
        }

        let subscriber_count = first_capture(
            &html,
            &[
                r#"(\d+\.?\d*[KMB]?)\s*subscribers"#,
                r#""subscriberCountText":\s*"([^"]+)""#,
            ],
        )
        .map(|t| parse_count(&t))
        .unwrap_or(0);

        let view_count = first_capture(
            &html,
            &[r#""viewCount":\s*"(\d+)""#, r#"(\d+\.?\d*[KMB]?)\s*views"#],
        )
        .map(|t| parse_count(&t))
        .unwrap_or(0);

        Ok(Some(ScrapedChannel {
            channel_id: channel_id.to_string(),
            name,
            subscriber_count,
            view_count,
            thumbnail: extract_meta(&html, "og:image").unwrap_or_default(),
        }))
    }

    /// List recent video ids from the channel's videos tab. Titles and view
    /// counts are not reliably present here; callers fetch stats per video.
    pub async fn channel_video_ids(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> Result<Vec<ScrapedVideoRef>> {
        let url = format!("https://www.youtube.com/channel/{channel_id}/videos");
        let Some(html) = fetch_page(&self.client, &url, self.delay).await? else {
            return Ok(Vec::new());
        };

        static VIDEO_ID_RE: OnceLock<Regex> = OnceLock::new();
        let re = VIDEO_ID_RE
            .get_or_init(|| Regex::new(r#""videoId":"([a-zA-Z0-9_-]{11})""#).expect("valid regex"));

        let mut seen = std::collections::HashSet::new();
        let mut videos = Vec::new();
        for caps in re.captures_iter(&html) {
            let id = caps[1].to_string();
            if seen.insert(id.clone()) {
                videos.push(ScrapedVideoRef {
                    thumbnail: format!("https://i.ytimg.com/vi/{id}/hqdefault.jpg"),
                    video_id: id,
                    title: String::new(),
                });
                if videos.len() >= max_results {
                    break;
                }
            }
        }

        tracing::info!(channel_id, count = videos.len(), "Scraped video list");
        Ok(videos)
    }

    /// Scrape a single watch page for view/like counts and upload date.
    pub async fn video_stats(&self, video_id: &str) -> Result<Option<ScrapedVideoStats>> {
        let url = format!("https://www.youtube.com/watch?v={video_id}");
        let Some(html) = fetch_page(&self.client, &url, self.delay).await? else {
            return Ok(None);
        };

        let view_count = first_capture(
            &html,
            &[
                r#""viewCount":\s*"(\d+)""#,
                r#"(\d{1,3}(?:,\d{3})*)\s*views"#,
            ],
        )
        .map(|t| parse_count(&t))
        .unwrap_or(0);

        let like_count = first_capture(&html, &[r#""likeCount":\s*"(\d+)""#])
            .map(|t| parse_count(&t))
            .unwrap_or(0);

        let published_at =
            first_capture(&html, &[r#""uploadDate":\s*"([^"]+)""#]).unwrap_or_default();

        Ok(Some(ScrapedVideoStats {
            video_id: video_id.to_string(),
            view_count,
            like_count,
            published_at,
        }))
    }
}

/// First capture group of the first pattern that matches.
fn first_capture(html: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(html) {
            return Some(caps[1].to_string());
        }
    }
    None
}

fn extract_meta(html: &str, property: &str) -> Option<String> {
    let pattern = format!(
        r#"<meta property="{}" content="([^"]*)""#,
        regex::escape(property)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(html).map(|c| c[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_link_extracts_channel_id() {
        let html = r#"<link rel="canonical" href="https://www.youtube.com/channel/UCBoLezq04tdd45n5gG4dOng">"#;
        let caps = canonical_re().captures(html).unwrap();
        assert_eq!(&caps[1], "UCBoLezq04tdd45n5gG4dOng");
    }

    #[test]
    fn page_source_channel_id_pattern() {
        let html = r#"{"channelId":"UC0XCrZT2-n_Yyj4gAePKekg","stuff":1}"#;
        let caps = channel_id_re().captures(html).unwrap();
        assert_eq!(&caps[1], "UC0XCrZT2-n_Yyj4gAePKekg");
    }

    #[test]
    fn meta_and_count_extraction() {
        let html = r#"<meta property="og:title" content="Some Channel - YouTube">
            <p>1.2M subscribers</p> "viewCount": "123456""#;
        assert_eq!(
            extract_meta(html, "og:title").as_deref(),
            Some("Some Channel - YouTube")
        );
        assert_eq!(
            first_capture(html, &[r#"(\d+\.?\d*[KMB]?)\s*subscribers"#]).as_deref(),
            Some("1.2M")
        );
    }

    #[test]
    fn scraper_builds_without_delay() {
        // Construction only; network paths are covered by engine mocks.
        let _ = YouTubeScraper::new(Duration::from_secs(10)).without_delay();
    }
}
