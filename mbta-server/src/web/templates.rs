//! Askama templates for the web frontend.

use askama::Template;

use crate::api::Page;
use crate::views::{RouteGroup, RouteTableView, ScheduleStop, ScheduleView};

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// All routes, one table per fare class.
#[derive(Template)]
#[template(path = "routes.html")]
pub struct RouteTableTemplate {
    pub groups: Vec<RouteGroup>,
    pub message: Option<String>,
    pub notices: Vec<String>,
}

impl RouteTableTemplate {
    pub fn from_page(page: &Page<RouteTableView>) -> Self {
        Self {
            groups: page.content.groups().to_vec(),
            message: page.content.message().map(str::to_string),
            notices: page.notices.clone(),
        }
    }
}

/// One route's upcoming schedule.
#[derive(Template)]
#[template(path = "schedule.html")]
pub struct ScheduleTemplate {
    pub route_id: String,
    pub heading: Option<String>,
    pub stops: Vec<ScheduleStop>,
    pub message: Option<String>,
    pub notices: Vec<String>,
}

impl ScheduleTemplate {
    pub fn from_page(route_id: &str, page: &Page<ScheduleView>) -> Self {
        Self {
            route_id: route_id.to_string(),
            heading: page.content.heading().map(str::to_string),
            stops: page.content.stops().to_vec(),
            message: page.content.message().map(str::to_string),
            notices: page.notices.clone(),
        }
    }
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}
