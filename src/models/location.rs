use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Office,
    Building,
    Vendor,
    Home,
    Gaz,
    CafeRestaurant,
    Other,
}

impl LocationType {
    /// Convert enum → DB string
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LocationType::Office => "office",
            LocationType::Building => "building",
            LocationType::Vendor => "vendor",
            LocationType::Home => "home",
            LocationType::Gaz => "gaz",
            LocationType::CafeRestaurant => "cafe_restaurant",
            LocationType::Other => "other",
        }
    }

    /// Convert DB string → enum
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "office" => Some(LocationType::Office),
            "building" => Some(LocationType::Building),
            "vendor" => Some(LocationType::Vendor),
            "home" => Some(LocationType::Home),
            "gaz" => Some(LocationType::Gaz),
            "cafe_restaurant" => Some(LocationType::CafeRestaurant),
            "other" => Some(LocationType::Other),
            _ => None,
        }
    }

    /// Helper: accept CLI input in any case, with '-' or '_'.
    pub fn from_code(code: &str) -> Option<Self> {
        LocationType::from_db_str(&code.trim().to_lowercase().replace('-', "_"))
    }
}

/// A named place defined by a circular geofence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub kind: LocationType,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub active: bool,
}

/// Fields supplied when creating or editing a location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    pub name: String,
    pub kind: LocationType,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub active: bool,
}

impl Location {
    /// True when the geofence geometry or activity differs from `other`.
    pub fn zone_changed(&self, other: &Location) -> bool {
        self.latitude != other.latitude
            || self.longitude != other.longitude
            || self.radius_m != other.radius_m
            || self.active != other.active
    }
}
