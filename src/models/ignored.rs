use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an unmatched coordinate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointSource {
    TripStart,
    TripEnd,
    ClockIn,
    ClockOut,
}

impl EndpointSource {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EndpointSource::TripStart => "trip_start",
            EndpointSource::TripEnd => "trip_end",
            EndpointSource::ClockIn => "clock_in",
            EndpointSource::ClockOut => "clock_out",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "trip_start" => Some(EndpointSource::TripStart),
            "trip_end" => Some(EndpointSource::TripEnd),
            "clock_in" => Some(EndpointSource::ClockIn),
            "clock_out" => Some(EndpointSource::ClockOut),
            _ => None,
        }
    }
}

/// An admin dismissal of a suggested location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IgnoredCluster {
    pub id: i64,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    /// Occurrence count at dismissal time; the suggestion resurfaces above it.
    pub occurrence_count: i64,
    pub dismissed_at: DateTime<Utc>,
}

/// An admin dismissal of a single unmatched endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IgnoredEndpoint {
    pub source: EndpointSource,
    pub source_id: i64,
    pub dismissed_at: DateTime<Utc>,
}
