//! Cached, conditional fetching of MBTA API paths.
//!
//! `fetch` returns a live cached body without touching the network. Once the
//! body has expired it revalidates with `If-Modified-Since`, reusing the old
//! body on `304 Not Modified`. Concurrent misses on one path share a single
//! upstream request.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{debug, error, warn};

use crate::cache::{CacheEntry, CacheStore, Clock, body_key, last_modified_key};
use crate::mbta::{FetchError, Upstream, UpstreamRequest, UpstreamResponse};

/// Default freshness window for a fetched body.
pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

/// Configuration for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// TTL used by [`CachedFetcher::fetch_default`].
    pub default_ttl: Duration,

    /// Extra attempts after a retryable failure.
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further attempt.
    pub retry_backoff: Duration,
}

impl FetchConfig {
    /// Set the retry policy.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            max_retries: 1,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

type SharedFetch = Shared<BoxFuture<'static, Result<String, FetchError>>>;

struct Inner {
    upstream: Arc<dyn Upstream>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    config: FetchConfig,
    /// Upstream requests currently running, keyed by body cache key.
    in_flight: Mutex<HashMap<String, SharedFetch>>,
}

/// MBTA fetcher with a cache in front of it.
///
/// Cheap to clone; clones share the cache and the in-flight registry.
#[derive(Clone)]
pub struct CachedFetcher {
    inner: Arc<Inner>,
}

impl CachedFetcher {
    /// Create a fetcher over the given upstream, store and clock.
    pub fn new(
        upstream: Arc<dyn Upstream>,
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        config: FetchConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                upstream,
                store,
                clock,
                config,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The cache store behind this fetcher.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.inner.store
    }

    /// The clock used for expiry.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Fetch `path` with the configured default TTL.
    pub async fn fetch_default(&self, path: &str) -> Result<String, FetchError> {
        self.fetch(path, self.inner.config.default_ttl).await
    }

    /// Fetch `path`, serving it from cache while it is younger than `ttl`.
    pub async fn fetch(&self, path: &str, ttl: Duration) -> Result<String, FetchError> {
        let path = normalize_path(path);
        let key = body_key(&path);

        if let Some(entry) = self.inner.read(&key).await
            && entry.is_live(self.inner.clock.now())
        {
            debug!(path = %path, "MBTA cache hit");
            return Ok(entry.value);
        }

        let pending = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(|e| e.into_inner());

            match in_flight.get(&key) {
                Some(pending) => {
                    debug!(path = %path, "Joining in-flight MBTA request");
                    pending.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    let registry_key = key.clone();
                    let pending = async move {
                        let result = inner.refresh(&path, ttl).await;
                        inner
                            .in_flight
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .remove(&registry_key);
                        result
                    }
                    .boxed()
                    .shared();
                    in_flight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }
}

impl Inner {
    /// Go to the network for `path` and update the cache.
    async fn refresh(&self, path: &str, ttl: Duration) -> Result<String, FetchError> {
        let key = body_key(path);
        let modified_key = last_modified_key(path);

        // A fetch that finished between our miss and joining the registry
        // has already stored a live body
        if let Some(entry) = self.read(&key).await
            && entry.is_live(self.clock.now())
        {
            debug!(path = %path, "MBTA body refreshed by a concurrent fetch");
            return Ok(entry.value);
        }

        let since = match self.read(&modified_key).await {
            Some(entry) => entry.value,
            None => http_date(self.clock.now()),
        };

        let conditional = UpstreamRequest {
            path: path.to_string(),
            if_modified_since: Some(since),
        };

        let response = match self.send(&conditional).await {
            Ok(response) => response,
            Err(e) => {
                error!(path = %path, error = %e, "Error accessing the MBTA API");
                return Err(e);
            }
        };

        let response = if response.is_not_modified() {
            if let Some(previous) = self.read(&key).await {
                debug!(path = %path, "MBTA body not modified, reusing cached copy");
                self.store_response(path, ttl, response.last_modified, &previous.value)
                    .await;
                return Ok(previous.value);
            }

            // Nothing to revalidate against, so ask again without the condition
            warn!(path = %path, "Not modified but no cached body; refetching unconditionally");
            let unconditional = UpstreamRequest {
                path: path.to_string(),
                if_modified_since: None,
            };
            match self.send(&unconditional).await {
                Ok(response) if !response.is_not_modified() => response,
                Ok(_) => {
                    let err = FetchError::Api {
                        status: 304,
                        message: "not modified, but nothing is cached".to_string(),
                    };
                    error!(path = %path, error = %err, "Error accessing the MBTA API");
                    return Err(err);
                }
                Err(e) => {
                    error!(path = %path, error = %e, "Error accessing the MBTA API");
                    return Err(e);
                }
            }
        } else {
            response
        };

        let UpstreamResponse {
            last_modified,
            body,
            ..
        } = response;
        self.store_response(path, ttl, last_modified, &body).await;

        Ok(body)
    }

    /// Send a request, retrying retryable failures with exponential backoff.
    async fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            match self.upstream.get(request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let backoff = self.config.retry_backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    warn!(
                        path = %request.path,
                        attempt,
                        error = %e,
                        "Retrying MBTA request"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn store_response(
        &self,
        path: &str,
        ttl: Duration,
        last_modified: Option<String>,
        body: &str,
    ) {
        if let Some(last_modified) = last_modified {
            self.write(&last_modified_key(path), CacheEntry::permanent(last_modified))
                .await;
        }

        let expires = expiry_after(self.clock.now(), ttl);
        self.write(&body_key(path), CacheEntry::expiring(body, expires))
            .await;
    }

    /// Read a key, treating store failures as a miss.
    async fn read(&self, key: &str) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Write a key, logging store failures.
    async fn write(&self, key: &str, entry: CacheEntry) {
        if let Err(e) = self.store.set(key, entry).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }
}

/// Ensure a path starts with `/`, so `routes` and `/routes` share a cache entry.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Format a time as an RFC 1123 HTTP date.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
