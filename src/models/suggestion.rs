use super::ignored::EndpointSource;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One unmatched coordinate feeding the location suggester.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    pub source: EndpointSource,
    /// Trip id for trip endpoints, shift id for clock events.
    pub source_id: i64,
    pub employee_id: String,
    pub employee_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub at: DateTime<Utc>,
    pub address: Option<String>,
}

/// A recurring unmatched place surfaced as a geofence candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSuggestion {
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub occurrence_count: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub employee_names: Vec<String>,
    pub address_samples: Vec<String>,
}
