//! Route identifier type.

use std::fmt;

/// Longest route id accepted.
const MAX_LEN: usize = 64;

/// Error returned when parsing an invalid route id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid route id: {reason}")]
pub struct InvalidRouteId {
    reason: &'static str,
}

/// An MBTA route id such as `Red`, `CR-Fitchburg` or `741`.
///
/// Route ids are interpolated into API paths, so only ASCII letters, digits,
/// `-`, `_` and `.` are accepted. Any `RouteId` is safe to put in a URL.
///
/// # Examples
///
/// ```
/// use mbta_server::route_id::RouteId;
///
/// let red = RouteId::parse("Red").unwrap();
/// assert_eq!(red.as_str(), "Red");
///
/// assert!(RouteId::parse("").is_err());
/// assert!(RouteId::parse("Red&filter[stop]=1").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RouteId(String);

impl RouteId {
    /// Parse a route id.
    pub fn parse(s: &str) -> Result<Self, InvalidRouteId> {
        if s.is_empty() {
            return Err(InvalidRouteId {
                reason: "must not be empty",
            });
        }

        if s.len() > MAX_LEN {
            return Err(InvalidRouteId {
                reason: "must be at most 64 characters",
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        {
            return Err(InvalidRouteId {
                reason: "must be ASCII letters, digits, '-', '_' or '.'",
            });
        }

        Ok(RouteId(s.to_string()))
    }

    /// Returns the route id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// API path for the next 50 scheduled stops on this route.
    pub fn schedules_path(&self) -> String {
        format!("/schedules?page[limit]=50&filter[route]={}", self.0)
    }
}

impl fmt::Debug for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RouteId({})", self.0)
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
