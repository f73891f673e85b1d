//! Server configuration from environment variables.
//!
//! | Variable              | Default                   |
//! |-----------------------|---------------------------|
//! | `MBTA_API_KEY`        | unset (anonymous access)  |
//! | `MBTA_BASE_URL`       | `https://api-v3.mbta.com` |
//! | `MBTA_TIMEOUT_SECS`   | `10`                      |
//! | `MBTA_CACHE_PATH`     | unset (memory only)       |
//! | `MBTA_CACHE_CAPACITY` | `1000`                    |
//! | `MBTA_LISTEN_ADDR`    | `127.0.0.1:3000`          |
//! | `MBTA_STATIC_DIR`     | `static`                  |

use std::net::SocketAddr;
use std::str::FromStr;

use crate::cache::CacheConfig;
use crate::fetcher::FetchConfig;
use crate::mbta::MbtaConfig;

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_DIR: &str = "static";

/// A variable was set to something unusable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value for {key}: {value:?}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

/// Everything `main` needs to start the server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub static_dir: String,
    pub mbta: MbtaConfig,
    pub cache: CacheConfig,
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary lookup (for testing).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Blank values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut mbta = MbtaConfig::new();
        if let Some(key) = get("MBTA_API_KEY") {
            mbta = mbta.with_api_key(key);
        }
        if let Some(url) = get("MBTA_BASE_URL") {
            mbta = mbta.with_base_url(url);
        }
        if let Some(secs) = parse(&get, "MBTA_TIMEOUT_SECS")? {
            mbta = mbta.with_timeout(secs);
        }

        let mut cache = CacheConfig::default();
        if let Some(path) = get("MBTA_CACHE_PATH") {
            cache = cache.with_path(path);
        }
        if let Some(capacity) = parse(&get, "MBTA_CACHE_CAPACITY")? {
            cache = cache.with_max_capacity(capacity);
        }

        let listen_addr = match parse(&get, "MBTA_LISTEN_ADDR")? {
            Some(addr) => addr,
            None => DEFAULT_LISTEN_ADDR.parse().map_err(|_| ConfigError {
                key: "MBTA_LISTEN_ADDR",
                value: DEFAULT_LISTEN_ADDR.to_string(),
            })?,
        };

        Ok(Self {
            listen_addr,
            static_dir: get("MBTA_STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string()),
            mbta,
            cache,
            fetch: FetchConfig::default(),
        })
    }
}

fn parse<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError { key, value })
        })
        .transpose()
}
