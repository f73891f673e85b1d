//! Key-value cache for raw MBTA responses.
//!
//! The cache is passive: entries carry their own expiry and the reader
//! decides whether an entry is still live. Stores keep stale entries around
//! for a grace period so a `304 Not Modified` can reuse the old body.
//!
//! Key layout:
//!
//! ```text
//! mbta:{path}                  response body, expires after the fetch TTL
//! mbta:{path}:last-modified    Last-Modified header value, never expires
//! mbta:stop:names              derived stop id -> name index
//! ```

mod clock;
mod disk;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use disk::DiskStore;
pub use memory::MemoryStore;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix shared by every key this crate writes.
pub const KEY_PREFIX: &str = "mbta:";

/// Cache key for the body of `path`.
pub fn body_key(path: &str) -> String {
    format!("{KEY_PREFIX}{path}")
}

/// Cache key for the Last-Modified value of `path`.
pub fn last_modified_key(path: &str) -> String {
    format!("{KEY_PREFIX}{path}:last-modified")
}

/// Errors from a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A cached value and when it stops being live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    /// Unix timestamp (seconds) after which the entry is stale. `None` never expires.
    pub expires_at: Option<i64>,
}

impl CacheEntry {
    /// An entry that never expires.
    pub fn permanent(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// An entry that expires at the given instant.
    pub fn expiring(value: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at: Some(at.timestamp()),
        }
    }

    /// Whether the entry is still live at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|at| now.timestamp() < at)
    }
}

/// Cache backend.
///
/// `get` returns entries whether or not they are live; callers check
/// [`CacheEntry::is_live`] against their own clock.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    async fn set(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;

    /// Remove a key. Succeeds whether or not the key existed.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    async fn invalidate_all(&self) -> Result<(), CacheError>;
}

/// Configuration for the cache store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of in-memory entries.
    pub max_capacity: u64,

    /// How long a stale entry is kept for revalidation before it is dropped.
    pub stale_grace: Duration,

    /// Persist entries to this JSON file instead of keeping them in memory only.
    pub path: Option<PathBuf>,
}

impl CacheConfig {
    /// Set the capacity.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Persist entries to a file.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1000,
            stale_grace: Duration::from_secs(24 * 60 * 60),
            path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn key_layout() {
        assert_eq!(body_key("/stops"), "mbta:/stops");
        assert_eq!(last_modified_key("/stops"), "mbta:/stops:last-modified");
    }

    #[test]
    fn expiring_entry_liveness() {
        let entry = CacheEntry::expiring("body", at(1_000));
        assert!(entry.is_live(at(999)));
        assert!(!entry.is_live(at(1_000)));
        assert!(!entry.is_live(at(5_000)));
    }

    #[test]
    fn permanent_entry_is_always_live() {
        let entry = CacheEntry::permanent("Tue, 15 Oct 2024 12:00:00 GMT");
        assert!(entry.is_live(at(253_402_300_799)));
        assert!(entry.is_live(DateTime::<Utc>::MAX_UTC));
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.max_capacity, 1000);
        assert_eq!(config.stale_grace, Duration::from_secs(86400));
        assert!(config.path.is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Body keys are the prefix plus the path, nothing else
        #[test]
        fn body_key_is_prefixed_path(path in "/[a-z\\[\\]=&?0-9/]{0,40}") {
            let key = body_key(&path);
            prop_assert!(key.starts_with(KEY_PREFIX));
            prop_assert_eq!(&key[KEY_PREFIX.len()..], path.as_str());
        }

        /// The last-modified key extends the body key, so the two never collide
        #[test]
        fn last_modified_key_extends_body_key(path in "/[a-z0-9/]{0,40}") {
            let body = body_key(&path);
            let modified = last_modified_key(&path);
            prop_assert_ne!(&body, &modified);
            prop_assert_eq!(modified, format!("{body}:last-modified"));
        }
    }
}
