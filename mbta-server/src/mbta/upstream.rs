//! The seam between the cached fetcher and whatever answers HTTP requests.

use async_trait::async_trait;

use super::error::FetchError;

/// A GET request against the MBTA API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    /// Path relative to the API base URL, always starting with `/`.
    pub path: String,

    /// Value for the `If-Modified-Since` header, if the request is conditional.
    pub if_modified_since: Option<String>,
}

/// A response the fetcher knows how to handle: a 2xx or a 304.
///
/// Other statuses are reported as [`FetchError`] by the implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub last_modified: Option<String>,
    pub body: String,
}

impl UpstreamResponse {
    /// Whether the server answered "304 Not Modified".
    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}

/// Something that can perform GET requests against the MBTA API.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, FetchError>;
}
