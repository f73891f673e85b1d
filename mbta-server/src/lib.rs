//! MBTA route and schedule server.
//!
//! Fetches routes, stops and schedules from the MBTA v3 API through a
//! revalidating cache and renders them as browsable pages.

pub mod api;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod mbta;
pub mod route_id;
pub mod stops;
pub mod views;
pub mod web;
