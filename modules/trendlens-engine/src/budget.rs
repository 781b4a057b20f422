//! Daily API budget tracking and outbound request rate limiting.
//!
//! Both are thin policies over [`CounterStore::incr_with_ceiling`], so a
//! shared Postgres store gives every instance the same view of the budget.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, TimeZone, Utc};

use trendlens_common::{BudgetStatus, TrendLensError};

use crate::store::CounterStore;

type Result<T> = std::result::Result<T, TrendLensError>;

/// Keeps the cumulative unit spend for the current quota day and refuses
/// reservations that would cross the daily limit.
pub struct QuotaTracker {
    store: Arc<dyn CounterStore>,
    daily_limit: u64,
    warning_threshold: u64,
    reset_hour_utc: u32,
}

impl QuotaTracker {
    pub fn new(
        store: Arc<dyn CounterStore>,
        daily_limit: u64,
        warning_threshold: u64,
        reset_hour_utc: u32,
    ) -> Self {
        Self {
            store,
            daily_limit,
            warning_threshold,
            reset_hour_utc: reset_hour_utc % 24,
        }
    }

    fn day_key(&self) -> String {
        format!("quota:daily:{}", Utc::now().format("%Y-%m-%d"))
    }

    /// Counter TTL: time until the next reset hour, plus an hour of grace
    /// so a reservation made just before reset still counts against the
    /// closing window.
    fn window_ttl(&self) -> Duration {
        let now = Utc::now();
        let today_reset = Utc
            .with_ymd_and_hms(
                now.year(),
                now.month(),
                now.day(),
                self.reset_hour_utc,
                0,
                0,
            )
            .single()
            .unwrap_or(now);
        let next_reset = if today_reset > now {
            today_reset
        } else {
            today_reset + chrono::Duration::days(1)
        };
        let until_reset = (next_reset - now).num_seconds().max(0) as u64;
        Duration::from_secs(until_reset + 3_600)
    }

    pub async fn used(&self) -> Result<u64> {
        self.store.get(&self.day_key()).await
    }

    /// Peek without reserving. A true answer can still race with another
    /// caller; use [`reserve`](Self::reserve) to actually claim units.
    pub async fn can_reserve(&self, cost: u64) -> Result<bool> {
        Ok(self.used().await?.saturating_add(cost) <= self.daily_limit)
    }

    /// Claim `cost` units, or fail with `BudgetExceeded`. The check and the
    /// spend are one store operation.
    pub async fn reserve(&self, cost: u64) -> Result<u64> {
        let key = self.day_key();
        match self
            .store
            .incr_with_ceiling(&key, cost, Some(self.daily_limit), self.window_ttl())
            .await?
        {
            Some(used) => {
                if used >= self.warning_threshold {
                    tracing::warn!(
                        used,
                        limit = self.daily_limit,
                        "Daily quota above warning threshold"
                    );
                }
                tracing::debug!(cost, used, "Reserved quota units");
                Ok(used)
            }
            None => {
                let used = self.store.get(&key).await?;
                Err(TrendLensError::BudgetExceeded {
                    used,
                    limit: self.daily_limit,
                })
            }
        }
    }

    pub async fn status(&self) -> Result<BudgetStatus> {
        Ok(BudgetStatus::new(self.used().await?, self.daily_limit))
    }
}

/// Caps outbound request dispatch per second and per minute. Counters are
/// recorded after dispatch, matching how the upstream measures.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max_per_second: u64,
    max_per_minute: u64,
}

impl RateLimiter {
    // Key TTLs slightly outlive their window so a clock-edge read never
    // sees a counter vanish mid-check.
    const SECOND_TTL: Duration = Duration::from_secs(2);
    const MINUTE_TTL: Duration = Duration::from_secs(61);

    pub fn new(store: Arc<dyn CounterStore>, max_per_second: u64, max_per_minute: u64) -> Self {
        Self {
            store,
            max_per_second,
            max_per_minute,
        }
    }

    fn second_key(&self) -> String {
        format!("rate:second:{}", Utc::now().timestamp())
    }

    fn minute_key(&self) -> String {
        format!("rate:minute:{}", Utc::now().format("%Y-%m-%d-%H-%M"))
    }

    pub async fn can_make_request(&self) -> Result<bool> {
        let per_second = self.store.get(&self.second_key()).await?;
        let per_minute = self.store.get(&self.minute_key()).await?;
        Ok(per_second < self.max_per_second && per_minute < self.max_per_minute)
    }

    /// Count a dispatched request against both windows.
    pub async fn record_request(&self) -> Result<()> {
        self.store
            .incr_with_ceiling(&self.second_key(), 1, None, Self::SECOND_TTL)
            .await?;
        self.store
            .incr_with_ceiling(&self.minute_key(), 1, None, Self::MINUTE_TTL)
            .await?;
        Ok(())
    }

    /// Block briefly when a window is saturated. One short sleep and one
    /// re-check; still saturated after that is an error, not a longer wait.
    pub async fn wait_if_needed(&self) -> Result<()> {
        if self.can_make_request().await? {
            return Ok(());
        }
        tracing::debug!("Rate limit window saturated, backing off");
        tokio::time::sleep(Duration::from_secs(1)).await;
        if self.can_make_request().await? {
            return Ok(());
        }
        Err(TrendLensError::RateLimited)
    }
}

/// Admission control for one paid API call: wait out the rate windows,
/// reserve the quota units, count the dispatch.
pub struct ApiGate {
    quota: QuotaTracker,
    rate: RateLimiter,
}

impl ApiGate {
    pub fn new(quota: QuotaTracker, rate: RateLimiter) -> Self {
        Self { quota, rate }
    }

    /// Fails with `BudgetExceeded` or `RateLimited` before any network
    /// traffic happens, so a denied call costs nothing upstream.
    pub async fn acquire(&self, cost: u64) -> Result<()> {
        self.rate.wait_if_needed().await?;
        self.quota.reserve(cost).await?;
        self.rate.record_request().await?;
        Ok(())
    }

    pub async fn can_afford(&self, cost: u64) -> Result<bool> {
        self.quota.can_reserve(cost).await
    }

    pub async fn status(&self) -> Result<BudgetStatus> {
        self.quota.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn tracker(limit: u64) -> QuotaTracker {
        QuotaTracker::new(Arc::new(MemoryStore::new()), limit, limit * 8 / 10, 8)
    }

    #[tokio::test]
    async fn reserve_denies_over_limit() {
        let t = tracker(150);
        assert_eq!(t.reserve(100).await.unwrap(), 100);
        assert_eq!(t.reserve(50).await.unwrap(), 150);
        let err = t.reserve(1).await.unwrap_err();
        assert!(err.is_quota());
        assert_eq!(t.used().await.unwrap(), 150);
    }

    #[tokio::test]
    async fn partial_budget_left_blocks_expensive_op() {
        let t = tracker(1_000);
        t.reserve(950).await.unwrap();
        assert!(!t.can_reserve(100).await.unwrap());
        assert!(t.can_reserve(50).await.unwrap());
        assert!(t.reserve(100).await.is_err());
        // The denied reservation spent nothing.
        assert_eq!(t.used().await.unwrap(), 950);
    }

    #[tokio::test]
    async fn concurrent_reserves_never_exceed_limit() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let t = Arc::new(QuotaTracker::new(store, 1_000, 800, 8));

        let mut handles = Vec::new();
        for _ in 0..30 {
            let t = Arc::clone(&t);
            handles.push(tokio::spawn(async move { t.reserve(100).await.is_ok() }));
        }
        let mut accepted = 0u64;
        for h in handles {
            if h.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 10);
        assert_eq!(t.used().await.unwrap(), 1_000);
    }

    #[tokio::test]
    async fn rate_limiter_saturates_minute_window() {
        let store: Arc<dyn CounterStore> = Arc::new(MemoryStore::new());
        let limiter = RateLimiter::new(store, 100, 3);

        for _ in 0..3 {
            assert!(limiter.can_make_request().await.unwrap());
            limiter.record_request().await.unwrap();
        }
        assert!(!limiter.can_make_request().await.unwrap());
    }

    #[tokio::test]
    async fn quota_status_reflects_usage() {
        let t = tracker(10_000);
        t.reserve(9_100).await.unwrap();
        let status = t.status().await.unwrap();
        assert_eq!(status.used, 9_100);
        assert_eq!(status.remaining, 900);
        assert_eq!(status.level, trendlens_common::QuotaLevel::Critical);
    }
}
