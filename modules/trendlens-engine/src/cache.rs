//! Namespaced response cache. Every cacheable upstream call is keyed by a
//! hash of its parameters and held for a TTL chosen per namespace, so the
//! expensive fetch paths are skipped entirely on a warm hit.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use trendlens_common::{CacheTtls, TrendLensError};

use crate::store::CacheStore;

type Result<T> = std::result::Result<T, TrendLensError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    ChannelInfo,
    ChannelVideos,
    VideoStatistics,
    PlaylistItems,
    TrendingVideos,
    LiveVideos,
}

impl CacheNamespace {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheNamespace::ChannelInfo => "channel_info",
            CacheNamespace::ChannelVideos => "channel_videos",
            CacheNamespace::VideoStatistics => "video_statistics",
            CacheNamespace::PlaylistItems => "playlist_items",
            CacheNamespace::TrendingVideos => "trending_videos",
            CacheNamespace::LiveVideos => "live_videos",
        }
    }

    fn ttl(self, ttls: &CacheTtls) -> Duration {
        match self {
            CacheNamespace::ChannelInfo => ttls.channel_info,
            CacheNamespace::ChannelVideos => ttls.channel_videos,
            CacheNamespace::VideoStatistics => ttls.video_statistics,
            CacheNamespace::PlaylistItems => ttls.playlist_items,
            CacheNamespace::TrendingVideos => ttls.trending_videos,
            CacheNamespace::LiveVideos => ttls.live_videos,
        }
    }
}

pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    ttls: CacheTtls,
    enabled: bool,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, ttls: CacheTtls, enabled: bool) -> Self {
        Self { store, ttls, enabled }
    }

    fn key_for<K: Serialize>(namespace: CacheNamespace, key: &K) -> Result<String> {
        let bytes = serde_json::to_vec(key)
            .map_err(|e| TrendLensError::Store(format!("cache key serialization: {e}")))?;
        Ok(format!(
            "{}:{}",
            namespace.as_str(),
            hex::encode(Sha256::digest(&bytes))
        ))
    }

    pub async fn get<K, T>(&self, namespace: CacheNamespace, key: &K) -> Result<Option<T>>
    where
        K: Serialize,
        T: DeserializeOwned,
    {
        if !self.enabled {
            return Ok(None);
        }
        let cache_key = Self::key_for(namespace, key)?;
        let Some(payload) = self.store.get(&cache_key).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&payload) {
            Ok(value) => {
                tracing::debug!(namespace = namespace.as_str(), "Cache hit");
                Ok(Some(value))
            }
            Err(e) => {
                // Stale shape from an older build; treat as a miss.
                tracing::debug!(namespace = namespace.as_str(), error = %e, "Cache payload unreadable");
                Ok(None)
            }
        }
    }

    pub async fn set<K, T>(&self, namespace: CacheNamespace, key: &K, value: &T) -> Result<()>
    where
        K: Serialize,
        T: Serialize,
    {
        if !self.enabled {
            return Ok(());
        }
        let cache_key = Self::key_for(namespace, key)?;
        let payload = serde_json::to_vec(value)
            .map_err(|e| TrendLensError::Store(format!("cache serialization: {e}")))?;
        self.store
            .set(&cache_key, &payload, namespace.ttl(&self.ttls))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cache() -> ResponseCache {
        ResponseCache::new(Arc::new(MemoryStore::new()), CacheTtls::default(), true)
    }

    #[tokio::test]
    async fn hit_after_set() {
        let cache = cache();
        let key = ("channel", "UCabc");
        cache
            .set(CacheNamespace::ChannelInfo, &key, &vec![1u32, 2, 3])
            .await
            .unwrap();
        let got: Option<Vec<u32>> = cache.get(CacheNamespace::ChannelInfo, &key).await.unwrap();
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn namespaces_do_not_collide() {
        let cache = cache();
        let key = "UCabc";
        cache
            .set(CacheNamespace::ChannelInfo, &key, &"info")
            .await
            .unwrap();
        let other: Option<String> = cache.get(CacheNamespace::LiveVideos, &key).await.unwrap();
        assert_eq!(other, None);
    }

    #[tokio::test]
    async fn disabled_cache_never_hits() {
        let store = Arc::new(MemoryStore::new());
        let writer = ResponseCache::new(store.clone(), CacheTtls::default(), true);
        writer
            .set(CacheNamespace::VideoStatistics, &"vid", &42u64)
            .await
            .unwrap();

        let bypass = ResponseCache::new(store, CacheTtls::default(), false);
        let got: Option<u64> = bypass
            .get(CacheNamespace::VideoStatistics, &"vid")
            .await
            .unwrap();
        assert_eq!(got, None);
    }
}
