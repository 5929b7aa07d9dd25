use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shift boundaries as provided by the time-tracking collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: i64,
    pub employee_id: String,
    #[serde(default)]
    pub employee_name: String,
    pub clocked_in_at: DateTime<Utc>,
    #[serde(default)]
    pub clocked_out_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clock_in_lat: Option<f64>,
    #[serde(default)]
    pub clock_in_lon: Option<f64>,
    #[serde(default)]
    pub clock_in_accuracy: Option<f64>,
    #[serde(default)]
    pub clock_out_lat: Option<f64>,
    #[serde(default)]
    pub clock_out_lon: Option<f64>,
    #[serde(default)]
    pub clock_out_accuracy: Option<f64>,
}

/// A clock-in or clock-out coordinate with its accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub at: DateTime<Utc>,
}

impl Shift {
    pub fn is_active(&self) -> bool {
        self.clocked_out_at.is_none()
    }

    /// Name shown in suggestion summaries; falls back to the employee id.
    pub fn display_name(&self) -> &str {
        if self.employee_name.trim().is_empty() {
            &self.employee_id
        } else {
            &self.employee_name
        }
    }

    pub fn clock_in_fix(&self) -> Option<ClockFix> {
        Some(ClockFix {
            latitude: self.clock_in_lat?,
            longitude: self.clock_in_lon?,
            accuracy_m: self.clock_in_accuracy.unwrap_or(0.0),
            at: self.clocked_in_at,
        })
    }

    pub fn clock_out_fix(&self) -> Option<ClockFix> {
        Some(ClockFix {
            latitude: self.clock_out_lat?,
            longitude: self.clock_out_lon?,
            accuracy_m: self.clock_out_accuracy.unwrap_or(0.0),
            at: self.clocked_out_at?,
        })
    }
}
