//! Route table and schedule lookups for display.
//!
//! Ties the fetcher, the stop index and the view mappers together. Upstream
//! failures never escape from here: they become an empty body, which the
//! mappers turn into an error or "no data" state, plus a notice for the user.
//! Stop names are only loaded when there is a schedule to show.

use serde::Serialize;
use tracing::error;

use crate::fetcher::CachedFetcher;
use crate::mbta::FetchError;
use crate::route_id::RouteId;
use crate::stops::StopIndex;
use crate::views::{RouteTableView, ScheduleView, route_table, schedule_records, schedule_view};

/// API path listing every route.
pub const ROUTES_PATH: &str = "/routes";

/// Notice shown whenever an upstream request failed.
pub const FETCH_NOTICE: &str = "An error occurred while accessing the MBTA.";

/// A view plus the notices raised while building it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub content: T,
    pub notices: Vec<String>,
}

/// Collects user-facing notices for one page.
#[derive(Debug, Default)]
struct Notices(Vec<String>);

impl Notices {
    fn add(&mut self, message: &str) {
        if !self.0.iter().any(|m| m == message) {
            self.0.push(message.to_string());
        }
    }
}

/// MBTA lookups for the web layer.
#[derive(Clone)]
pub struct MbtaApi {
    fetcher: CachedFetcher,
}

impl MbtaApi {
    pub fn new(fetcher: CachedFetcher) -> Self {
        Self { fetcher }
    }

    /// All routes, grouped by fare class.
    pub async fn route_table(&self) -> Page<RouteTableView> {
        let mut notices = Notices::default();
        let body = self.fetch_or_empty(ROUTES_PATH, &mut notices).await;

        Page {
            content: route_table(&body),
            notices: notices.0,
        }
    }

    /// Upcoming schedule for one route, with stop names resolved.
    pub async fn route_schedule(&self, route_id: &RouteId) -> Page<ScheduleView> {
        let mut notices = Notices::default();
        let body = self
            .fetch_or_empty(&route_id.schedules_path(), &mut notices)
            .await;

        // No point resolving names for a schedule we can't show
        let Some(records) = schedule_records(&body, route_id.as_str()) else {
            return Page {
                content: ScheduleView::unavailable(),
                notices: notices.0,
            };
        };

        let index = match self.stop_index().await {
            Ok(index) => index,
            Err(e) => {
                error!(error = %e, "Failed to load MBTA stop names");
                notices.add(FETCH_NOTICE);
                StopIndex::default()
            }
        };

        Page {
            content: schedule_view(&records, route_id.as_str(), &index),
            notices: notices.0,
        }
    }

    /// Load the stop index (cached for a day).
    pub async fn stop_index(&self) -> Result<StopIndex, FetchError> {
        StopIndex::load(&self.fetcher).await
    }

    /// Fetch with the default TTL, degrading a failure to an empty body.
    ///
    /// The fetcher has already logged the failure.
    async fn fetch_or_empty(&self, path: &str, notices: &mut Notices) -> String {
        match self.fetcher.fetch_default(path).await {
            Ok(body) => body,
            Err(_) => {
                notices.add(FETCH_NOTICE);
                String::new()
            }
        }
    }
}
