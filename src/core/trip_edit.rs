//! Admin edits on derived trips: endpoint overrides and annotations.

use crate::core::matcher::GeofenceIndex;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::{locations, trips};
use crate::errors::{AppError, AppResult};
use crate::models::match_method::{Endpoint, MatchMethod};
use crate::models::trip::{CarpoolRole, Classification, TransportMode, Trip};
use crate::utils::formatting::location_ref;

/// Fields owned by downstream collaborators. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct TripAnnotation {
    pub classification: Option<Classification>,
    pub transport_mode: Option<TransportMode>,
    pub carpool_role: Option<CarpoolRole>,
    pub road_distance_km: Option<f64>,
    pub start_address: Option<String>,
    pub end_address: Option<String>,
}

impl TripAnnotation {
    pub fn is_empty(&self) -> bool {
        self.classification.is_none()
            && self.transport_mode.is_none()
            && self.carpool_role.is_none()
            && self.road_distance_km.is_none()
            && self.start_address.is_none()
            && self.end_address.is_none()
    }
}

fn endpoint_name(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Start => "start",
        Endpoint::End => "end",
    }
}

/// Pin an endpoint to a location (or to none). Automatic re-matching leaves
/// it alone from then on.
pub fn override_endpoint(
    pool: &mut DbPool,
    trip_id: i64,
    endpoint: Endpoint,
    location_id: Option<i64>,
) -> AppResult<Trip> {
    pool.with_transaction(|tx| {
        trips::load_trip(tx, trip_id)?.ok_or(AppError::TripNotFound(trip_id))?;
        if let Some(id) = location_id {
            locations::get_location(tx, id)?.ok_or(AppError::LocationNotFound(id))?;
        }

        trips::set_endpoint_location(tx, trip_id, endpoint, location_id, MatchMethod::Manual)?;
        ttlog(
            tx,
            "override",
            &format!("trip {trip_id}"),
            &format!("{} -> {}", endpoint_name(endpoint), location_ref(location_id)),
        )?;
        trips::load_trip(tx, trip_id)?.ok_or(AppError::TripNotFound(trip_id))
    })
}

/// Hand an endpoint back to the matcher and match it against the current registry.
pub fn reset_endpoint(pool: &mut DbPool, trip_id: i64, endpoint: Endpoint) -> AppResult<Trip> {
    pool.with_transaction(|tx| {
        let trip = trips::load_trip(tx, trip_id)?.ok_or(AppError::TripNotFound(trip_id))?;
        let index = GeofenceIndex::load(tx)?;
        let (lat, lon, acc) = trip.endpoint_coords(endpoint);
        let location_id = index.match_point(lat, lon, acc);

        trips::set_endpoint_location(tx, trip_id, endpoint, location_id, MatchMethod::Auto)?;
        ttlog(
            tx,
            "override_reset",
            &format!("trip {trip_id}"),
            &format!("{} -> {} (auto)", endpoint_name(endpoint), location_ref(location_id)),
        )?;
        trips::load_trip(tx, trip_id)?.ok_or(AppError::TripNotFound(trip_id))
    })
}

pub fn annotate_trip(pool: &mut DbPool, trip_id: i64, ann: &TripAnnotation) -> AppResult<Trip> {
    if let Some(km) = ann.road_distance_km.filter(|km| !km.is_finite() || *km < 0.0) {
        return Err(AppError::InvalidValue {
            field: "road distance",
            value: km.to_string(),
        });
    }

    pool.with_transaction(|tx| {
        let mut trip = trips::load_trip(tx, trip_id)?.ok_or(AppError::TripNotFound(trip_id))?;

        if let Some(c) = ann.classification {
            trip.classification = c;
        }
        if let Some(m) = ann.transport_mode {
            trip.transport_mode = m;
        }
        if let Some(r) = ann.carpool_role {
            trip.carpool_role = r;
        }
        if ann.road_distance_km.is_some() {
            trip.road_distance_km = ann.road_distance_km;
        }
        if ann.start_address.is_some() {
            trip.start_address = ann.start_address.clone();
        }
        if ann.end_address.is_some() {
            trip.end_address = ann.end_address.clone();
        }

        trips::update_annotations(tx, &trip)?;
        ttlog(
            tx,
            "annotate",
            &format!("trip {trip_id}"),
            &format!(
                "{} / {} / {}",
                trip.classification.to_db_str(),
                trip.transport_mode.to_db_str(),
                trip.carpool_role.to_db_str()
            ),
        )?;
        Ok(trip)
    })
}
