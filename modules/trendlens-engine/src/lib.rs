//! Quota-aware trending-content engine: budget and rate admission, channel
//! reference resolution, multi-source fetch orchestration, ranking, and a
//! TTL response cache, over pluggable storage and source backends.

pub mod budget;
pub mod cache;
pub mod instagram;
pub mod orchestrator;
pub mod ranking;
pub mod resolver;
pub mod store;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use budget::{ApiGate, QuotaTracker, RateLimiter};
pub use cache::{CacheNamespace, ResponseCache};
pub use instagram::PageOrchestrator;
pub use orchestrator::{FetchOptions, FetchOrchestrator};
pub use resolver::{parse_channel_ref, ChannelRef, ChannelResolver};
pub use store::{CacheStore, CounterStore, MemoryStore, PostgresStore};
