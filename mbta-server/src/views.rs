//! Display records built from MBTA API bodies.
//!
//! These are pure functions of the raw body: nothing here touches the
//! network or the cache, and a bad body becomes an explicit "no data" or
//! "error" state rather than a failure.

use std::collections::HashMap;

use chrono::DateTime;
use serde::Serialize;
use tracing::warn;

use crate::mbta::{Document, Resource, RouteAttributes, ScheduleAttributes};
use crate::stops::StopIndex;

/// Shown when the route list can't be displayed.
pub const ROUTES_ERROR: &str = "An error occurred while accessing routes.";

/// Shown when a route has no upcoming schedule.
pub const NO_SCHEDULE: &str = "No upcoming schedule is currently available for this route.";

/// Group heading for routes without a fare class.
const UNCLASSIFIED: &str = "Other";

const DEFAULT_COLOR: &str = "FFFFFF";
const DEFAULT_TEXT_COLOR: &str = "000000";

/// One route in the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub id: String,
    pub name: String,
    /// Link to this route's schedule page.
    pub link: String,
    /// Background color, 6 hex digits without `#`.
    pub color: String,
    /// Text color, 6 hex digits without `#`.
    pub text_color: String,
}

impl RouteSummary {
    fn from_resource(route: &Resource<RouteAttributes>) -> Self {
        let attrs = &route.attributes;
        let name = attrs
            .long_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(attrs.short_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(&route.id)
            .to_string();

        let link = match &route.links.self_link {
            Some(path) => format!("/mbta{path}"),
            None => format!("/mbta/routes/{}", route.id),
        };

        Self {
            id: route.id.clone(),
            name,
            link,
            color: hex_color(attrs.color.as_deref(), DEFAULT_COLOR),
            text_color: hex_color(attrs.text_color.as_deref(), DEFAULT_TEXT_COLOR),
        }
    }

    /// Inline style for the route's row.
    pub fn style(&self) -> String {
        format!(
            "background-color: #{};color: #{};",
            self.color, self.text_color
        )
    }

    /// Inline style for the route's link.
    pub fn link_style(&self) -> String {
        format!("color: #{};", self.text_color)
    }
}

/// Routes sharing a fare class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteGroup {
    pub fare_class: String,
    pub routes: Vec<RouteSummary>,
}

/// The route table page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteTableView {
    Groups { groups: Vec<RouteGroup> },
    Error { message: String },
}

impl RouteTableView {
    fn error() -> Self {
        RouteTableView::Error {
            message: ROUTES_ERROR.to_string(),
        }
    }

    /// Groups to display; empty in the error state.
    pub fn groups(&self) -> &[RouteGroup] {
        match self {
            RouteTableView::Groups { groups } => groups,
            RouteTableView::Error { .. } => &[],
        }
    }

    /// The error message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            RouteTableView::Groups { .. } => None,
            RouteTableView::Error { message } => Some(message),
        }
    }
}

/// Build the route table from a raw `/routes` body.
///
/// Groups appear in the order their fare class is first seen; routes keep
/// their input order within a group.
pub fn route_table(body: &str) -> RouteTableView {
    let doc: Document<RouteAttributes> = match Document::parse(body) {
        Ok(doc) => doc,
        Err(e) => {
            if !body.is_empty() {
                warn!(error = %e, "Malformed MBTA routes payload");
            }
            return RouteTableView::error();
        }
    };

    if doc.data.is_empty() {
        return RouteTableView::error();
    }

    let mut groups: Vec<RouteGroup> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for route in &doc.data {
        let fare_class = route
            .attributes
            .fare_class
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| UNCLASSIFIED.to_string());

        let idx = *positions.entry(fare_class.clone()).or_insert_with(|| {
            groups.push(RouteGroup {
                fare_class,
                routes: Vec::new(),
            });
            groups.len() - 1
        });

        groups[idx].routes.push(RouteSummary::from_resource(route));
    }

    RouteTableView::Groups { groups }
}

/// One stop on a route's schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleStop {
    pub name: String,
    pub arrival_time: Option<String>,
    pub departure_time: Option<String>,
}

/// The schedule page for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleView {
    Available {
        heading: String,
        stops: Vec<ScheduleStop>,
    },
    Unavailable {
        message: String,
    },
}

impl ScheduleView {
    /// The "no upcoming schedule" state.
    pub fn unavailable() -> Self {
        ScheduleView::Unavailable {
            message: NO_SCHEDULE.to_string(),
        }
    }

    pub fn heading(&self) -> Option<&str> {
        match self {
            ScheduleView::Available { heading, .. } => Some(heading),
            ScheduleView::Unavailable { .. } => None,
        }
    }

    pub fn stops(&self) -> &[ScheduleStop] {
        match self {
            ScheduleView::Available { stops, .. } => stops,
            ScheduleView::Unavailable { .. } => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ScheduleView::Available { .. } => None,
            ScheduleView::Unavailable { message } => Some(message),
        }
    }
}

/// Build a route's schedule from a raw `/schedules` body.
///
/// Records keep the order they were received in. Stop ids missing from
/// `index` are shown with a placeholder name.
pub fn route_schedule(body: &str, route_id: &str, index: &StopIndex) -> ScheduleView {
    match schedule_records(body, route_id) {
        Some(doc) => schedule_view(&doc, route_id, index),
        None => ScheduleView::unavailable(),
    }
}

/// Decode a `/schedules` body, or `None` when it has nothing to show.
pub fn schedule_records(body: &str, route_id: &str) -> Option<Document<ScheduleAttributes>> {
    match Document::parse(body) {
        Ok(doc) if doc.data.is_empty() => None,
        Ok(doc) => Some(doc),
        Err(e) => {
            if !body.is_empty() {
                warn!(route = route_id, error = %e, "Malformed MBTA schedules payload");
            }
            None
        }
    }
}

/// Build a route's schedule from decoded records.
pub fn schedule_view(
    doc: &Document<ScheduleAttributes>,
    route_id: &str,
    index: &StopIndex,
) -> ScheduleView {
    let Some(first) = doc.data.first() else {
        return ScheduleView::unavailable();
    };

    let heading_route = first.relationships.route_id().unwrap_or(route_id);
    let heading = format!("Upcoming schedule for {heading_route} route");

    let stops = doc
        .data
        .iter()
        .map(|schedule| ScheduleStop {
            name: schedule
                .relationships
                .stop_id()
                .map(|id| index.name_or_unknown(id))
                .unwrap_or_else(|| "Unknown stop".to_string()),
            arrival_time: schedule.attributes.arrival_time.as_deref().map(display_time),
            departure_time: schedule
                .attributes
                .departure_time
                .as_deref()
                .map(display_time),
        })
        .collect();

    ScheduleView::Available { heading, stops }
}

/// `HH:MM` for an RFC 3339 timestamp; anything else is shown as given.
fn display_time(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(t) => t.format("%H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Keep a color only if it is exactly 6 hex digits.
fn hex_color(raw: Option<&str>, fallback: &str) -> String {
    raw.map(|c| c.trim_start_matches('#'))
        .filter(|c| c.len() == 6 && c.chars().all(|ch| ch.is_ascii_hexdigit()))
        .unwrap_or(fallback)
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(id: &str, name: &str, fare_class: &str) -> String {
        format!(
            r#"{{"id": "{id}", "type": "route",
                "attributes": {{"long_name": "{name}", "fare_class": "{fare_class}",
                                "color": "FFC72C", "text_color": "000000"}},
                "links": {{"self": "/routes/{id}"}}}}"#
        )
    }

    fn routes_body(routes: &[String]) -> String {
        format!(r#"{{"data": [{}]}}"#, routes.join(","))
    }

    fn schedule(stop: &str, arrival: &str, departure: &str) -> String {
        format!(
            r#"{{"id": "s-{stop}", "type": "schedule",
                "attributes": {{"arrival_time": {arrival}, "departure_time": {departure}}},
                "relationships": {{
                    "route": {{"data": {{"id": "Red", "type": "route"}}}},
                    "stop": {{"data": {{"id": "{stop}", "type": "stop"}}}}
                }}}}"#
        )
    }

    fn stop_index() -> StopIndex {
        StopIndex::from_body(
            r#"{"data": [
                {"id": "1", "attributes": {"name": "Park St"}},
                {"id": "2", "attributes": {"name": "Downtown"}}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn routes_sharing_fare_class_form_one_group_in_order() {
        let body = routes_body(&[
            route("1", "Harvard - Nubian", "Local Bus"),
            route("Red", "Red Line", "Rapid Transit"),
            route("47", "Central Sq - Broadway", "Local Bus"),
        ]);

        let view = route_table(&body);
        let groups = view.groups();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].fare_class, "Local Bus");
        let names: Vec<&str> = groups[0].routes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Harvard - Nubian", "Central Sq - Broadway"]);
        assert_eq!(groups[1].fare_class, "Rapid Transit");
        assert_eq!(groups[1].routes[0].id, "Red");
    }

    #[test]
    fn route_summary_link_and_styles() {
        let view = route_table(&routes_body(&[route("Red", "Red Line", "Rapid Transit")]));
        let summary = &view.groups()[0].routes[0];

        assert_eq!(summary.link, "/mbta/routes/Red");
        assert_eq!(summary.style(), "background-color: #FFC72C;color: #000000;");
        assert_eq!(summary.link_style(), "color: #000000;");
    }

    #[test]
    fn route_without_links_or_names_falls_back() {
        let body = r#"{"data": [{"id": "CR-Fitchburg", "attributes": {
            "long_name": "", "short_name": null, "fare_class": null,
            "color": "not-a-color;}", "text_color": null}}]}"#;

        let view = route_table(body);
        let group = &view.groups()[0];
        let summary = &group.routes[0];

        assert_eq!(group.fare_class, "Other");
        assert_eq!(summary.name, "CR-Fitchburg");
        assert_eq!(summary.link, "/mbta/routes/CR-Fitchburg");
        assert_eq!(summary.color, DEFAULT_COLOR);
        assert_eq!(summary.text_color, DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn empty_or_broken_routes_are_an_error_state() {
        for body in ["", r#"{"data": []}"#, "<html>Bad Gateway</html>"] {
            let view = route_table(body);
            assert_eq!(view.message(), Some(ROUTES_ERROR), "body: {body}");
            assert!(view.groups().is_empty());
        }
    }

    #[test]
    fn schedule_preserves_order_and_resolves_names() {
        let body = format!(
            r#"{{"data": [{}, {}]}}"#,
            schedule("2", "null", r#""2024-10-15T08:05:00-04:00""#),
            schedule("1", r#""2024-10-15T08:12:00-04:00""#, "null"),
        );

        let view = route_schedule(&body, "Red", &stop_index());

        assert_eq!(view.heading(), Some("Upcoming schedule for Red route"));
        let stops = view.stops();
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].name, "Downtown");
        assert_eq!(stops[0].arrival_time, None);
        assert_eq!(stops[0].departure_time.as_deref(), Some("08:05"));
        assert_eq!(stops[1].name, "Park St");
        assert_eq!(stops[1].arrival_time.as_deref(), Some("08:12"));
    }

    #[test]
    fn unknown_stop_uses_placeholder() {
        let body = format!(r#"{{"data": [{}]}}"#, schedule("place-nowhere", "null", "null"));

        let view = route_schedule(&body, "Red", &stop_index());

        assert_eq!(view.stops()[0].name, "Unknown stop (place-nowhere)");
    }

    #[test]
    fn empty_schedule_is_unavailable_not_empty_list() {
        let view = route_schedule(r#"{"data": []}"#, "Red", &stop_index());

        assert_eq!(
            view,
            ScheduleView::Unavailable {
                message: NO_SCHEDULE.to_string()
            }
        );
        assert!(view.heading().is_none());
    }

    #[test]
    fn schedule_records_only_when_there_is_something_to_show() {
        assert!(schedule_records("", "Red").is_none());
        assert!(schedule_records("{not json", "Red").is_none());
        assert!(schedule_records(r#"{"data": []}"#, "Red").is_none());

        let body = format!(r#"{{"data": [{}]}}"#, schedule("1", "null", "null"));
        assert_eq!(schedule_records(&body, "Red").unwrap().data.len(), 1);
    }

    #[test]
    fn failed_fetch_body_is_unavailable() {
        let view = route_schedule("", "Red", &StopIndex::default());
        assert_eq!(view.message(), Some(NO_SCHEDULE));
    }

    #[test]
    fn heading_falls_back_to_requested_route() {
        let body = r#"{"data": [{"id": "s", "attributes": {"arrival_time": null, "departure_time": null}}]}"#;
        let view = route_schedule(body, "Orange", &stop_index());

        assert_eq!(view.heading(), Some("Upcoming schedule for Orange route"));
        assert_eq!(view.stops()[0].name, "Unknown stop");
    }

    #[test]
    fn non_rfc3339_time_is_shown_verbatim() {
        assert_eq!(display_time("soon"), "soon");
        assert_eq!(display_time("2024-10-15T23:59:00-04:00"), "23:59");
    }

    #[test]
    fn views_serialize_with_status_tag() {
        let json = serde_json::to_value(route_table("")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], ROUTES_ERROR);
    }
}
