//! Application state for the web layer.

use std::sync::Arc;

use crate::api::MbtaApi;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Cached MBTA lookups
    pub api: Arc<MbtaApi>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(api: MbtaApi) -> Self {
        Self { api: Arc::new(api) }
    }
}
