//! MBTA v3 API client.
//!
//! This module provides an HTTP client for the public MBTA v3 API, which
//! serves routes, stops and schedules as JSON:API documents.
//!
//! Key characteristics of the API:
//! - Responses carry `Last-Modified`, and the server honours
//!   `If-Modified-Since` with `304 Not Modified`
//! - An API key is optional; without one requests are more tightly rate limited

mod client;
mod error;
#[cfg(test)]
pub mod mock;
mod types;
mod upstream;

pub use client::{DEFAULT_BASE_URL, MbtaClient, MbtaConfig};
pub use error::FetchError;
pub use types::{
    Document, Links, Relationship, Relationships, Resource, ResourceIdentifier, RouteAttributes,
    ScheduleAttributes, StopAttributes,
};
pub use upstream::{Upstream, UpstreamRequest, UpstreamResponse};
