//! Geofence matching against the active Location registry.
//!
//! A coordinate matches a location when its great-circle distance to the
//! center is within `radius_m + accuracy_m`. The nearest candidate wins; equal
//! distances go to the lower location id.

use crate::db::locations::list_locations;
use crate::errors::AppResult;
use crate::models::location::Location;
use crate::utils::geo::{haversine_m, search_envelope};
use rstar::{AABB, RTree, RTreeObject};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct IndexedLocation {
    idx: usize,
    lat: f64,
    lon: f64,
}

impl RTreeObject for IndexedLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

/// Winning candidate of a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchHit {
    pub location_id: i64,
    pub distance_m: f64,
    /// Effective radius: geofence radius plus the fix accuracy.
    pub buffered_radius_m: f64,
}

impl MatchHit {
    /// 1 at the center, falling linearly to 0 at the edge of the buffered radius.
    pub fn confidence(&self) -> f64 {
        if self.buffered_radius_m <= 0.0 {
            return 1.0;
        }
        (1.0 - self.distance_m / self.buffered_radius_m).clamp(0.0, 1.0)
    }
}

/// Spatial index over the active locations.
#[derive(Debug)]
pub struct GeofenceIndex {
    locations: Vec<Location>,
    tree: RTree<IndexedLocation>,
    max_radius_m: f64,
}

impl GeofenceIndex {
    /// Index the active locations among `locations`.
    pub fn new(locations: impl IntoIterator<Item = Location>) -> Self {
        let locations: Vec<Location> = locations.into_iter().filter(|l| l.active).collect();
        let entries = locations
            .iter()
            .enumerate()
            .map(|(idx, l)| IndexedLocation {
                idx,
                lat: l.latitude,
                lon: l.longitude,
            })
            .collect();
        let max_radius_m = locations.iter().map(|l| l.radius_m).fold(0.0, f64::max);

        Self {
            locations,
            tree: RTree::bulk_load(entries),
            max_radius_m,
        }
    }

    /// Index the registry as currently stored.
    pub fn load(conn: &Connection) -> AppResult<Self> {
        Ok(Self::new(list_locations(conn, true)?))
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// An active location by id.
    pub fn location(&self, id: i64) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn find(&self, lat: f64, lon: f64, accuracy_m: f64) -> Option<MatchHit> {
        if self.is_empty() || !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        let accuracy = if accuracy_m.is_finite() {
            accuracy_m.max(0.0)
        } else {
            0.0
        };

        let envelope = search_envelope(lat, lon, self.max_radius_m + accuracy);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|entry| {
                let loc = &self.locations[entry.idx];
                let distance_m = haversine_m(lat, lon, loc.latitude, loc.longitude);
                let buffered = loc.radius_m + accuracy;
                (distance_m <= buffered).then_some((loc.id, distance_m, buffered))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(location_id, distance_m, buffered_radius_m)| MatchHit {
                location_id,
                distance_m,
                buffered_radius_m,
            })
    }

    /// The matched location id, if any.
    pub fn match_point(&self, lat: f64, lon: f64, accuracy_m: f64) -> Option<i64> {
        self.find(lat, lon, accuracy_m).map(|hit| hit.location_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::LocationType;

    fn loc(id: i64, lat: f64, lon: f64, radius_m: f64) -> Location {
        Location {
            id,
            name: format!("L{id}"),
            kind: LocationType::Office,
            latitude: lat,
            longitude: lon,
            radius_m,
            active: true,
        }
    }

    #[test]
    fn accuracy_buffer_extends_the_fence() {
        let index = GeofenceIndex::new(vec![loc(1, 45.5, -73.6, 50.0)]);
        // ~89 m north of the center
        let lat = 45.5008;
        assert_eq!(index.match_point(lat, -73.6, 10.0), None);
        assert_eq!(index.match_point(lat, -73.6, 40.0), Some(1));
        assert_eq!(index.match_point(lat, -73.6, 400.0), Some(1));
    }

    #[test]
    fn nearest_wins_and_ties_go_to_lower_id() {
        let index = GeofenceIndex::new(vec![
            loc(2, 45.5, -73.6, 100.0),
            loc(1, 45.5, -73.6, 100.0),
            loc(3, 45.5005, -73.6, 100.0),
        ]);
        assert_eq!(index.match_point(45.5, -73.6, 5.0), Some(1));
        assert_eq!(index.match_point(45.5005, -73.6, 5.0), Some(3));
    }

    #[test]
    fn inactive_locations_are_ignored() {
        let mut inactive = loc(1, 45.5, -73.6, 100.0);
        inactive.active = false;
        let index = GeofenceIndex::new(vec![inactive]);
        assert!(index.is_empty());
        assert_eq!(index.match_point(45.5, -73.6, 5.0), None);
    }
}
