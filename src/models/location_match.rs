use serde::Serialize;

/// Cached result of matching one stored GPS point against the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMatch {
    pub point_id: String,
    pub location_id: i64,
    pub distance_m: f64,
    pub confidence: f64,
}
