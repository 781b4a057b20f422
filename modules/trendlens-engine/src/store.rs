//! Storage backends for quota counters and the response cache.
//!
//! The budget tracker and rate limiter both reduce to one primitive: an
//! atomic increment with an optional ceiling. The in-memory backend serves
//! single-process deployments; the Postgres backend shares counters across
//! instances so concurrent workers observe one budget.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::PgPool;

use trendlens_common::TrendLensError;

type Result<T> = std::result::Result<T, TrendLensError>;

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically add `amount` to the counter at `key`, unless the result
    /// would exceed `ceiling`. Returns the new value, or `None` when the
    /// increment was denied. Expired counters restart from zero. The check
    /// and the increment are one operation; two callers racing on the last
    /// units cannot both win.
    async fn incr_with_ceiling(
        &self,
        key: &str,
        amount: u64,
        ceiling: Option<u64>,
        ttl: Duration,
    ) -> Result<Option<u64>>;

    /// Current counter value; 0 for missing or expired keys.
    async fn get(&self, key: &str) -> Result<u64>;
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
}

// --- In-memory backend ---

struct CounterEntry {
    value: u64,
    expires_at: Instant,
}

struct CacheEntry {
    payload: Vec<u8>,
    expires_at: Instant,
}

/// Process-local store. Counters are only as shared as the process, which
/// is fine for a single instance or for tests.
#[derive(Default)]
pub struct MemoryStore {
    counters: Mutex<HashMap<String, CounterEntry>>,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn incr_with_ceiling(
        &self,
        key: &str,
        amount: u64,
        ceiling: Option<u64>,
        ttl: Duration,
    ) -> Result<Option<u64>> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| TrendLensError::Store("counter lock poisoned".into()))?;
        let now = Instant::now();

        let current = match counters.get(key) {
            Some(entry) if entry.expires_at > now => entry.value,
            _ => 0,
        };
        let next = current.saturating_add(amount);
        if ceiling.is_some_and(|c| next > c) {
            return Ok(None);
        }

        // Keep the original expiry while the window is still open.
        let expires_at = match counters.get(key) {
            Some(entry) if entry.expires_at > now => entry.expires_at,
            _ => now + ttl,
        };
        counters.insert(key.to_string(), CounterEntry { value: next, expires_at });
        Ok(Some(next))
    }

    async fn get(&self, key: &str) -> Result<u64> {
        let counters = self
            .counters
            .lock()
            .map_err(|_| TrendLensError::Store("counter lock poisoned".into()))?;
        Ok(match counters.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => entry.value,
            _ => 0,
        })
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| TrendLensError::Store("cache lock poisoned".into()))?;
        Ok(match cache.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.payload.clone()),
            _ => None,
        })
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| TrendLensError::Store("cache lock poisoned".into()))?;
        cache.insert(
            key.to_string(),
            CacheEntry {
                payload: value.to_vec(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

// --- Postgres backend ---

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the counter and cache tables if they do not exist yet.
    pub async fn migrate(pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quota_counters (
                key TEXT PRIMARY KEY,
                value BIGINT NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(store_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS response_cache (
                cache_key TEXT PRIMARY KEY,
                payload BYTEA NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(store_err)?;

        Ok(())
    }

    /// Drop expired cache rows. Called opportunistically; correctness never
    /// depends on it because reads filter on expiry.
    pub async fn evict_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM response_cache WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CounterStore for PostgresStore {
    async fn incr_with_ceiling(
        &self,
        key: &str,
        amount: u64,
        ceiling: Option<u64>,
        ttl: Duration,
    ) -> Result<Option<u64>> {
        // The conflict WHERE clause only guards the update path, so the
        // fresh-insert case is checked here. Expired rows restart from
        // `amount`, which this same check bounds.
        if ceiling.is_some_and(|c| amount > c) {
            return Ok(None);
        }

        // Single-statement upsert so the ceiling check and the increment
        // commit together. An expired row restarts from the new amount.
        // No row returned means the WHERE clause rejected the increment.
        let row: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO quota_counters (key, value, expires_at)
            VALUES ($1, $2, NOW() + make_interval(secs => $3))
            ON CONFLICT (key) DO UPDATE SET
                value = CASE
                    WHEN quota_counters.expires_at <= NOW() THEN EXCLUDED.value
                    ELSE quota_counters.value + EXCLUDED.value
                END,
                expires_at = CASE
                    WHEN quota_counters.expires_at <= NOW() THEN EXCLUDED.expires_at
                    ELSE quota_counters.expires_at
                END
            WHERE quota_counters.expires_at <= NOW()
               OR $4::BIGINT IS NULL
               OR quota_counters.value + EXCLUDED.value <= $4
            RETURNING value
            "#,
        )
        .bind(key)
        .bind(amount as i64)
        .bind(ttl.as_secs_f64())
        .bind(ceiling.map(|c| c as i64))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.map(|(v,)| v as u64))
    }

    async fn get(&self, key: &str) -> Result<u64> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT value FROM quota_counters WHERE key = $1 AND expires_at > NOW()")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        Ok(row.map(|(v,)| v as u64).unwrap_or(0))
    }
}

#[async_trait]
impl CacheStore for PostgresStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(
            "SELECT payload FROM response_cache WHERE cache_key = $1 AND expires_at > NOW()",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(|(p,)| p))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO response_cache (cache_key, payload, expires_at)
            VALUES ($1, $2, NOW() + make_interval(secs => $3))
            ON CONFLICT (cache_key) DO UPDATE SET
                payload = EXCLUDED.payload,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

fn store_err(e: sqlx::Error) -> TrendLensError {
    TrendLensError::Store(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_counter_respects_ceiling() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);

        assert_eq!(
            store.incr_with_ceiling("k", 4, Some(10), ttl).await.unwrap(),
            Some(4)
        );
        assert_eq!(
            store.incr_with_ceiling("k", 6, Some(10), ttl).await.unwrap(),
            Some(10)
        );
        assert_eq!(
            store.incr_with_ceiling("k", 1, Some(10), ttl).await.unwrap(),
            None
        );
        assert_eq!(CounterStore::get(&store, "k").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn memory_counter_expires() {
        let store = MemoryStore::new();
        store
            .incr_with_ceiling("k", 5, None, Duration::ZERO)
            .await
            .unwrap();
        // Zero TTL is already expired; next read and increment see 0.
        assert_eq!(CounterStore::get(&store, "k").await.unwrap(), 0);
        assert_eq!(
            store
                .incr_with_ceiling("k", 3, Some(4), Duration::from_secs(60))
                .await
                .unwrap(),
            Some(3)
        );
    }

    #[tokio::test]
    async fn memory_cache_roundtrip_and_expiry() {
        let store = MemoryStore::new();
        store
            .set("a", b"payload", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            CacheStore::get(&store, "a").await.unwrap().as_deref(),
            Some(&b"payload"[..])
        );

        store.set("b", b"gone", Duration::ZERO).await.unwrap();
        assert_eq!(CacheStore::get(&store, "b").await.unwrap(), None);
    }
}
