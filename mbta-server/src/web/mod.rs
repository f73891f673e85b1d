//! Web layer for the MBTA route browser.
//!
//! Serves the route table and per-route schedules as HTML or JSON.

mod routes;
mod state;
pub mod templates;

pub use routes::{AppError, ErrorResponse, create_router};
pub use state::AppState;
