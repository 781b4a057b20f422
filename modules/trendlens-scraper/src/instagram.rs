//! Best-effort scraping of public Instagram profile pages. Instagram has
//! no sanctioned free API for this data, so everything here is extracted
//! from embedded page JSON and meta tags and may come back empty.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use trendlens_common::{parse_count, InstaMediaItem, InstaMediaKind, PageProfile};

use crate::{error::Result, fetch_page, REQUEST_DELAY};

/// URL path segments that are site features rather than usernames.
const RESERVED_SEGMENTS: &[&str] = &["p", "reel", "reels", "stories", "explore", "accounts", "direct"];

pub struct InstagramScraper {
    client: reqwest::Client,
    delay: Duration,
}

impl InstagramScraper {
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

    /// Pull the username out of a profile URL, or accept a bare username.
    /// Post/reel/story URLs carry no username and resolve to `None`.
    pub fn extract_username(page_ref: &str) -> Option<String> {
        let trimmed = page_ref.trim().trim_start_matches('@');
        if !trimmed.contains('/') && !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }

        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"instagram\.com/([A-Za-z0-9_.]+)").expect("valid regex")
        });
        let caps = re.captures(trimmed)?;
        let segment = caps[1].to_string();
        if RESERVED_SEGMENTS.contains(&segment.as_str()) {
            return None;
        }
        Some(segment)
    }

    /// Scrape follower count, name, and bio from the profile page.
    pub async fn page_info(&self, username: &str) -> Result<Option<PageProfile>> {
        let url = format!("https://www.instagram.com/{username}/");
        let Some(html) = fetch_page(&self.client, &url, self.delay).await? else {
            return Ok(None);
        };

        let followers = first_capture(
            &html,
            &[
                r#""edge_followed_by":\{"count":(\d+)\}"#,
                r#"([\d,.]+[KMB]?)\s*Followers"#,
            ],
        )
        .map(|t| parse_count(&t))
        .unwrap_or(0);

        let full_name = first_capture(&html, &[r#""full_name":"([^"]*)""#]).unwrap_or_default();
        let profile_pic =
            first_capture(&html, &[r#""profile_pic_url":"([^"]*)""#]).unwrap_or_default();
        let following = first_capture(&html, &[r#""edge_follow":\{"count":(\d+)\}"#])
            .map(|t| parse_count(&t))
            .unwrap_or(0);
        let posts = first_capture(
            &html,
            &[r#""edge_owner_to_timeline_media":\{"count":(\d+)"#],
        )
        .map(|t| parse_count(&t))
        .unwrap_or(0);
        let is_verified = html.contains(r#""is_verified":true"#);

        Ok(Some(PageProfile {
            username: username.to_string(),
            full_name,
            profile_picture: profile_pic.replace("\\u0026", "&"),
            follower_count: followers,
            following_count: following,
            post_count: posts,
            is_verified,
        }))
    }

    /// Scrape recent posts and reels from the embedded timeline JSON.
    /// Returns whatever subset the page exposes, up to `limit` items.
    pub async fn recent_media(&self, username: &str, limit: usize) -> Result<Vec<InstaMediaItem>> {
        let url = format!("https://www.instagram.com/{username}/");
        let Some(html) = fetch_page(&self.client, &url, self.delay).await? else {
            return Ok(Vec::new());
        };

        static NODE_RE: OnceLock<Regex> = OnceLock::new();
        let re = NODE_RE.get_or_init(|| {
            Regex::new(
                r#"(?s)"shortcode":"([A-Za-z0-9_-]+)".{0,4000}?"edge_liked_by":\{"count":(\d+)\}.{0,2000}?"edge_media_to_comment":\{"count":(\d+)\}"#,
            )
            .expect("valid regex")
        });
        static VIDEO_RE: OnceLock<Regex> = OnceLock::new();
        let video_re = VIDEO_RE
            .get_or_init(|| Regex::new(r#""is_video":(true|false)"#).expect("valid regex"));

        let mut items = Vec::new();
        for caps in re.captures_iter(&html) {
            let shortcode = caps[1].to_string();
            let like_count: u64 = caps[2].parse().unwrap_or(0);
            let comment_count: u64 = caps[3].parse().unwrap_or(0);
            // Classify by the nearest is_video flag after the shortcode.
            let tail = &html[caps.get(0).map(|m| m.start()).unwrap_or(0)..];
            let kind = match video_re.captures(tail) {
                Some(v) if &v[1] == "true" => InstaMediaKind::Reel,
                _ => InstaMediaKind::Post,
            };
            items.push(InstaMediaItem {
                thumbnail: format!("https://www.instagram.com/p/{shortcode}/media/?size=m"),
                shortcode,
                kind,
                like_count,
                comment_count,
                view_count: None,
                taken_at: None,
                caption: String::new(),
            });
            if items.len() >= limit {
                break;
            }
        }

        tracing::info!(username, count = items.len(), "Scraped recent media");
        Ok(items)
    }
}

fn first_capture(html: &str, patterns: &[&str]) -> Option<String> {
    for pattern in patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(html) {
            return Some(caps[1].to_string());
        }
    }
    None
}
