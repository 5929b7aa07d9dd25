use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stop: a contiguous run of low-speed fixes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationaryCluster {
    pub id: i64,
    pub shift_id: i64,
    pub employee_id: String,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub centroid_accuracy: f64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub gps_point_count: i64,
    pub gps_gap_seconds: i64,
    pub gps_gap_count: i64,
    pub matched_location_id: Option<i64>,
}
