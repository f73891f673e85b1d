//! Stop id → stop name lookup.
//!
//! Built from the `/stops` endpoint. Both the raw body and the derived map
//! are cached for a day, each with its own expiry.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::fetcher::CachedFetcher;
use crate::mbta::{Document, FetchError, StopAttributes};

/// API path listing every stop.
pub const STOPS_PATH: &str = "/stops";

/// Cache key for the derived index.
pub const STOP_NAMES_KEY: &str = "mbta:stop:names";

/// How long both the raw stops body and the derived index stay fresh.
pub const STOP_INDEX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Stop names keyed by stop id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopIndex {
    names: HashMap<String, String>,
}

impl StopIndex {
    /// Build the index from a decoded `/stops` document.
    ///
    /// Stops without a name are skipped.
    pub fn from_document(doc: &Document<StopAttributes>) -> Self {
        let names = doc
            .data
            .iter()
            .filter_map(|stop| {
                stop.attributes
                    .name
                    .as_ref()
                    .map(|name| (stop.id.clone(), name.clone()))
            })
            .collect();

        Self { names }
    }

    /// Build the index from a raw `/stops` body.
    pub fn from_body(body: &str) -> Result<Self, FetchError> {
        let doc = Document::parse(body).map_err(|e| FetchError::Json {
            message: e.to_string(),
        })?;
        Ok(Self::from_document(&doc))
    }

    /// Load the index, from cache when possible.
    ///
    /// A failed fetch or an unparseable body is an error and nothing is
    /// cached, so the next call tries again.
    pub async fn load(fetcher: &CachedFetcher) -> Result<Self, FetchError> {
        let now = fetcher.clock().now();

        match fetcher.store().get(STOP_NAMES_KEY).await {
            Ok(Some(entry)) if entry.is_live(now) => {
                match serde_json::from_str::<StopIndex>(&entry.value) {
                    Ok(index) => {
                        debug!(stops = index.len(), "Stop index cache hit");
                        return Ok(index);
                    }
                    Err(e) => warn!(error = %e, "Discarding undecodable stop index"),
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Stop index cache read failed"),
        }

        let body = fetcher.fetch(STOPS_PATH, STOP_INDEX_TTL).await?;
        let index = Self::from_body(&body)?;

        if index.is_empty() {
            warn!("MBTA returned no stops; not caching the empty index");
            return Ok(index);
        }

        let expires = fetcher.clock().now() + chrono::Duration::seconds(STOP_INDEX_TTL.as_secs() as i64);
        match serde_json::to_string(&index) {
            Ok(json) => {
                if let Err(e) = fetcher
                    .store()
                    .set(STOP_NAMES_KEY, CacheEntry::expiring(json, expires))
                    .await
                {
                    warn!(error = %e, "Stop index cache write failed");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode stop index"),
        }

        debug!(stops = index.len(), "Built stop index");
        Ok(index)
    }

    /// Look up a stop name by id.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// The stop name, or a placeholder naming the unknown id.
    pub fn name_or_unknown(&self, id: &str) -> String {
        match self.get(id) {
            Some(name) => name.to_string(),
            None => format!("Unknown stop ({id})"),
        }
    }

    /// Number of stops in the index.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
