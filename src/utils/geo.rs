//! Geodesy helpers: great-circle distance, speeds, search boxes and
//! accuracy-weighted centroids.

use rstar::AABB;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (mean).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance in meters between two coordinates.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Speed in km/h for `distance_m` covered in `seconds`; None when no time elapsed.
pub fn speed_kmh(distance_m: f64, seconds: f64) -> Option<f64> {
    if seconds <= 0.0 {
        return None;
    }
    Some(distance_m / seconds * 3.6)
}

/// Weight of a fix in a centroid: inversely proportional to its uncertainty.
pub fn accuracy_weight(accuracy_m: f64) -> f64 {
    1.0 / accuracy_m.max(0.1)
}

/// Bounding box (in `[lon, lat]` order) containing every point within
/// `radius_m` of the center. Slightly padded so the haversine check that
/// follows is always the deciding filter.
pub fn search_envelope(lat: f64, lon: f64, radius_m: f64) -> AABB<[f64; 2]> {
    let padded = radius_m * 1.1 + 1.0;
    let d_lat = padded / METERS_PER_DEGREE;
    let cos_lat = lat.to_radians().cos().abs().max(1e-6);
    let d_lon = (padded / (METERS_PER_DEGREE * cos_lat)).min(180.0);
    AABB::from_corners([lon - d_lon, lat - d_lat], [lon + d_lon, lat + d_lat])
}

/// Incremental accuracy-weighted mean position.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedCentroid {
    sum_weight: f64,
    sum_lat: f64,
    sum_lon: f64,
    count: usize,
}

impl WeightedCentroid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, lat: f64, lon: f64, accuracy_m: f64) {
        let w = accuracy_weight(accuracy_m);
        self.sum_weight += w;
        self.sum_lat += lat * w;
        self.sum_lon += lon * w;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// `(lat, lon, accuracy)` where accuracy is the weighted mean accuracy of
    /// the members (their harmonic mean). None when empty.
    pub fn finish(&self) -> Option<(f64, f64, f64)> {
        if self.count == 0 || self.sum_weight <= 0.0 {
            return None;
        }
        Some((
            self.sum_lat / self.sum_weight,
            self.sum_lon / self.sum_weight,
            self.count as f64 / self.sum_weight,
        ))
    }
}
