//! In-memory cache store backed by moka.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use moka::Expiry;
use moka::future::Cache as MokaCache;

use super::{CacheConfig, CacheEntry, CacheError, CacheStore};

/// Evicts an entry once it has been stale for longer than the grace period.
///
/// Liveness is still decided by the reader; this only bounds how long dead
/// entries occupy memory.
struct StaleGrace {
    grace: Duration,
}

impl StaleGrace {
    fn time_to_evict(&self, entry: &CacheEntry) -> Option<Duration> {
        let expires_at = entry.expires_at?;
        let remaining = expires_at.saturating_sub(Utc::now().timestamp()).max(0);
        Some(Duration::from_secs(remaining as u64) + self.grace)
    }
}

impl Expiry<String, CacheEntry> for StaleGrace {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        self.time_to_evict(value)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.time_to_evict(value)
    }
}

/// Bounded in-memory store.
#[derive(Clone)]
pub struct MemoryStore {
    entries: MokaCache<String, CacheEntry>,
}

impl MemoryStore {
    /// Create a new store with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(StaleGrace {
                grace: config.stale_grace,
            })
            .build();

        Self { entries }
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        Ok(self.entries.get(key).await)
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn invalidate_all(&self) -> Result<(), CacheError> {
        self.entries.invalidate_all();
        Ok(())
    }
}
