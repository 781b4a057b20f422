//! Instagram page analysis. No quota budget applies here; the source is
//! rate-limited at the scraper level and everything is best-effort.

use std::sync::Arc;

use trendlens_common::{
    InstaMediaItem, InstaMediaKind, PageBatchReport, PageFailure, PageProfile, PageResult,
    TrendLensError,
};
use trendlens_scraper::InstagramScraper;

use crate::traits::PageSource;

type Result<T> = std::result::Result<T, TrendLensError>;

/// Batch ceiling on pages per request, matching the channel batch cap.
pub const MAX_PAGES_PER_BATCH: usize = 10;

/// How many media items to pull before the engagement cut.
const MEDIA_FETCH_LIMIT: usize = 60;

pub struct PageOrchestrator {
    source: Arc<dyn PageSource>,
}

impl PageOrchestrator {
    pub fn new(source: Arc<dyn PageSource>) -> Self {
        Self { source }
    }

    /// Fetch a page's profile and its top posts and reels by engagement.
    pub async fn fetch_page_content(
        &self,
        page_ref: &str,
        max_posts: usize,
        max_reels: usize,
    ) -> Result<PageResult> {
        let username = InstagramScraper::extract_username(page_ref)
            .ok_or_else(|| TrendLensError::PageResolution(page_ref.to_string()))?;
        tracing::info!(page_ref, username, "Fetching page content");

        let profile = self.source.page_info(&username).await?;
        let media = self.source.recent_media(&username, MEDIA_FETCH_LIMIT).await?;

        if profile.is_none() && media.is_empty() {
            return Err(TrendLensError::NoContent(username));
        }
        let profile = profile.unwrap_or_else(|| PageProfile::placeholder(&username));

        let total_fetched = media.len();
        let (posts, reels) = rank_media(media, max_posts, max_reels);

        Ok(PageResult {
            page_ref: page_ref.to_string(),
            profile,
            posts,
            reels,
            total_fetched,
        })
    }

    /// Analyze up to [`MAX_PAGES_PER_BATCH`] pages with per-page error
    /// isolation.
    pub async fn analyze_pages(
        &self,
        page_refs: &[String],
        max_posts: usize,
        max_reels: usize,
    ) -> PageBatchReport {
        let refs = &page_refs[..page_refs.len().min(MAX_PAGES_PER_BATCH)];
        if refs.len() < page_refs.len() {
            tracing::warn!(
                requested = page_refs.len(),
                accepted = refs.len(),
                "Batch truncated to the per-request page cap"
            );
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for page_ref in refs {
            match self.fetch_page_content(page_ref, max_posts, max_reels).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    tracing::warn!(page_ref, error = %e, "Page analysis failed");
                    errors.push(PageFailure {
                        page_ref: page_ref.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        PageBatchReport {
            total_processed: results.len(),
            total_failed: errors.len(),
            results,
            errors,
        }
    }
}

/// Split media by kind and keep the top of each by engagement, descending.
/// The sort is stable so equal engagement keeps fetch order.
fn rank_media(
    media: Vec<InstaMediaItem>,
    max_posts: usize,
    max_reels: usize,
) -> (Vec<InstaMediaItem>, Vec<InstaMediaItem>) {
    let mut posts = Vec::new();
    let mut reels = Vec::new();
    for item in media {
        match item.kind {
            InstaMediaKind::Post => posts.push(item),
            InstaMediaKind::Reel => reels.push(item),
        }
    }
    posts.sort_by(|a, b| b.engagement().cmp(&a.engagement()));
    reels.sort_by(|a, b| b.engagement().cmp(&a.engagement()));
    posts.truncate(max_posts);
    reels.truncate(max_reels);
    (posts, reels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockPageSource;

    fn media(shortcode: &str, kind: InstaMediaKind, likes: u64, comments: u64) -> InstaMediaItem {
        InstaMediaItem {
            shortcode: shortcode.to_string(),
            caption: String::new(),
            thumbnail: String::new(),
            kind,
            like_count: likes,
            comment_count: comments,
            view_count: None,
            taken_at: None,
        }
    }

    #[test]
    fn media_ranked_by_engagement() {
        let items = vec![
            media("a", InstaMediaKind::Post, 10, 1),
            media("b", InstaMediaKind::Post, 5, 20),
            media("c", InstaMediaKind::Reel, 100, 0),
            media("d", InstaMediaKind::Post, 3, 3),
        ];
        let (posts, reels) = rank_media(items, 2, 5);
        let post_codes: Vec<&str> = posts.iter().map(|m| m.shortcode.as_str()).collect();
        assert_eq!(post_codes, ["b", "a"]);
        assert_eq!(reels.len(), 1);
        assert_eq!(reels[0].shortcode, "c");
    }

    #[tokio::test]
    async fn missing_page_is_an_isolated_failure() {
        let mut source = MockPageSource::default();
        source.profiles.insert(
            "realpage".to_string(),
            PageProfile::placeholder("realpage"),
        );
        source.media.insert(
            "realpage".to_string(),
            vec![media("x", InstaMediaKind::Post, 1, 1)],
        );
        let orchestrator = PageOrchestrator::new(Arc::new(source));

        let report = orchestrator
            .analyze_pages(
                &["realpage".to_string(), "ghostpage".to_string()],
                10,
                10,
            )
            .await;
        assert_eq!(report.total_processed, 1);
        assert_eq!(report.total_failed, 1);
        assert_eq!(report.errors[0].page_ref, "ghostpage");
    }

    #[tokio::test]
    async fn profile_placeholder_when_only_media_found() {
        let mut source = MockPageSource::default();
        source.media.insert(
            "mediaonly".to_string(),
            vec![media("x", InstaMediaKind::Reel, 2, 2)],
        );
        let orchestrator = PageOrchestrator::new(Arc::new(source));

        let result = orchestrator
            .fetch_page_content("https://www.instagram.com/mediaonly/", 5, 5)
            .await
            .unwrap();
        assert_eq!(result.profile.username, "mediaonly");
        assert_eq!(result.reels.len(), 1);
    }
}
