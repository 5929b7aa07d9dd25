use super::match_method::{Endpoint, MatchMethod};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    #[default]
    Business,
    Personal,
}

impl Classification {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Classification::Business => "business",
            Classification::Personal => "personal",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "business" => Some(Classification::Business),
            "personal" => Some(Classification::Personal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Driving,
    Walking,
    Cycling,
    Transit,
    Other,
}

impl TransportMode {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TransportMode::Driving => "driving",
            TransportMode::Walking => "walking",
            TransportMode::Cycling => "cycling",
            TransportMode::Transit => "transit",
            TransportMode::Other => "other",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "driving" => Some(TransportMode::Driving),
            "walking" => Some(TransportMode::Walking),
            "cycling" => Some(TransportMode::Cycling),
            "transit" => Some(TransportMode::Transit),
            "other" => Some(TransportMode::Other),
            _ => None,
        }
    }
}

/// Role of the employee in a detected carpool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarpoolRole {
    #[default]
    Solo,
    Driver,
    Passenger,
}

impl CarpoolRole {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CarpoolRole::Solo => "solo",
            CarpoolRole::Driver => "driver",
            CarpoolRole::Passenger => "passenger",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "solo" => Some(CarpoolRole::Solo),
            "driver" => Some(CarpoolRole::Driver),
            "passenger" => Some(CarpoolRole::Passenger),
            _ => None,
        }
    }
}

/// A vehicle trip derived from one shift's GPS stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub shift_id: i64,
    pub employee_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub start_lat: f64,
    pub start_lon: f64,
    pub start_accuracy: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub end_accuracy: f64,
    /// Straight-line distance with the road correction factor applied.
    pub distance_km: f64,
    /// Road distance from map matching, filled in later when available.
    pub road_distance_km: Option<f64>,
    pub duration_minutes: i64,
    pub classification: Classification,
    pub transport_mode: TransportMode,
    pub carpool_role: CarpoolRole,
    pub confidence_score: f64,
    pub gps_point_count: i64,
    pub low_accuracy_point_count: i64,
    pub has_gps_gap: bool,
    pub start_location_id: Option<i64>,
    pub end_location_id: Option<i64>,
    pub start_match_method: MatchMethod,
    pub end_match_method: MatchMethod,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
}

impl Trip {
    /// Distance used for reimbursement: road distance when known.
    pub fn billable_distance_km(&self) -> f64 {
        self.road_distance_km.unwrap_or(self.distance_km)
    }

    pub fn endpoint_coords(&self, endpoint: Endpoint) -> (f64, f64, f64) {
        match endpoint {
            Endpoint::Start => (self.start_lat, self.start_lon, self.start_accuracy),
            Endpoint::End => (self.end_lat, self.end_lon, self.end_accuracy),
        }
    }

    pub fn endpoint_method(&self, endpoint: Endpoint) -> MatchMethod {
        match endpoint {
            Endpoint::Start => self.start_match_method,
            Endpoint::End => self.end_match_method,
        }
    }

    pub fn endpoint_time(&self, endpoint: Endpoint) -> DateTime<Utc> {
        match endpoint {
            Endpoint::Start => self.started_at,
            Endpoint::End => self.ended_at,
        }
    }
}
