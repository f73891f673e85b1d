//! MBTA v3 API response DTOs.
//!
//! The API speaks JSON:API: every payload is a `data` array of resource
//! objects with `id`, `attributes`, `relationships` and `links`. Only the
//! fields the views need are modelled; everything else is ignored.

use serde::Deserialize;

/// A JSON:API collection document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document<A> {
    /// Resource objects. A missing `data` member reads as empty.
    #[serde(default = "Vec::new")]
    pub data: Vec<Resource<A>>,
}

impl<A: for<'de> Deserialize<'de>> Document<A> {
    /// Decode a raw response body.
    ///
    /// An empty body (what a failed fetch degrades to) is an error, not an
    /// empty document, so callers can tell "no data" from "no response".
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}

/// A single JSON:API resource object.
#[derive(Debug, Clone, Deserialize)]
pub struct Resource<A> {
    pub id: String,

    pub attributes: A,

    #[serde(default)]
    pub relationships: Relationships,

    #[serde(default)]
    pub links: Links,
}

/// Resource links.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    /// Path of this resource on the API, e.g. `/routes/Red`.
    #[serde(rename = "self")]
    pub self_link: Option<String>,
}

/// The relationships the views follow.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Relationships {
    pub route: Option<Relationship>,
    pub stop: Option<Relationship>,
}

impl Relationships {
    /// Id of the related route, if present.
    pub fn route_id(&self) -> Option<&str> {
        self.route.as_ref().and_then(Relationship::id)
    }

    /// Id of the related stop, if present.
    pub fn stop_id(&self) -> Option<&str> {
        self.stop.as_ref().and_then(Relationship::id)
    }
}

/// A to-one relationship.
#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    pub data: Option<ResourceIdentifier>,
}

impl Relationship {
    fn id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.id.as_str())
    }
}

/// Resource linkage. Only the id is followed.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceIdentifier {
    pub id: String,
}

/// Attributes of a `/routes` resource.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteAttributes {
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    /// Fare grouping, e.g. "Local Bus" or "Rapid Transit".
    pub fare_class: Option<String>,
    /// Route color as hex without `#`.
    pub color: Option<String>,
    /// Text color as hex without `#`.
    pub text_color: Option<String>,
}

/// Attributes of a `/stops` resource.
#[derive(Debug, Clone, Deserialize)]
pub struct StopAttributes {
    pub name: Option<String>,
}

/// Attributes of a `/schedules` resource.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleAttributes {
    /// ISO 8601 datetime, null at the first stop of a trip.
    pub arrival_time: Option<String>,
    /// ISO 8601 datetime, null at the last stop of a trip.
    pub departure_time: Option<String>,
}
