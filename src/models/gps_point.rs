use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single GPS fix captured by a device during a shift.
///
/// `id` is the client-generated idempotency id: re-uploading a batch never
/// creates duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub id: String,
    pub shift_id: i64,
    pub employee_id: String,
    #[serde(default)]
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub is_mocked: bool,
}

impl GpsPoint {
    /// Check if the point has usable coordinates and accuracy.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && self.accuracy_m.is_finite()
            && self.accuracy_m >= 0.0
    }

    /// Seconds elapsed from `earlier` to this point (negative if out of order).
    pub fn seconds_since(&self, earlier: &GpsPoint) -> i64 {
        (self.captured_at - earlier.captured_at).num_seconds()
    }

    /// Same as [`seconds_since`](Self::seconds_since) at millisecond precision.
    pub fn elapsed_secs(&self, earlier: &GpsPoint) -> f64 {
        (self.captured_at - earlier.captured_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Outcome of storing a batch of points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub failed_ids: Vec<String>,
}
