//! Shift recomputation: the transactional delete-then-insert of derived rows.

use crate::config::Config;
use crate::core::location_match::refresh_shift;
use crate::core::matcher::GeofenceIndex;
use crate::core::segmentation::{segment_stops, segment_trips, usable_points};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::{clusters, points, shifts, trips};
use crate::errors::{AppError, AppResult};
use crate::models::match_method::Endpoint;
use crate::models::trip::Trip;
use log::{info, warn};
use serde::Serialize;

/// What one recompute produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShiftRecompute {
    pub shift_id: i64,
    pub points_total: usize,
    pub points_used: usize,
    pub trips: usize,
    pub stops: usize,
    pub matched_points: usize,
    pub carried_overrides: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillReport {
    pub succeeded: Vec<ShiftRecompute>,
    pub failed: Vec<(i64, String)>,
}

/// Copy manual work from the previous run onto a freshly derived trip.
///
/// Annotations follow a trip whose endpoints kept their timestamps; manual
/// endpoint overrides follow the endpoint timestamp alone.
fn carry_over(previous: &[Trip], trip: &mut Trip) -> usize {
    let mut carried = 0;

    if let Some(old) = previous
        .iter()
        .find(|o| o.started_at == trip.started_at && o.ended_at == trip.ended_at)
    {
        trip.classification = old.classification;
        trip.transport_mode = old.transport_mode;
        trip.carpool_role = old.carpool_role;
        trip.road_distance_km = old.road_distance_km;
        trip.start_address = old.start_address.clone();
        trip.end_address = old.end_address.clone();
    }

    for endpoint in [Endpoint::Start, Endpoint::End] {
        let at = trip.endpoint_time(endpoint);
        let manual = previous.iter().find(|o| {
            o.endpoint_time(endpoint) == at && o.endpoint_method(endpoint).is_manual()
        });
        if let Some(old) = manual {
            match endpoint {
                Endpoint::Start => {
                    trip.start_location_id = old.start_location_id;
                    trip.start_match_method = old.start_match_method;
                }
                Endpoint::End => {
                    trip.end_location_id = old.end_location_id;
                    trip.end_match_method = old.end_match_method;
                }
            }
            carried += 1;
        }
    }

    carried
}

/// Re-run segmentation and matching for one closed shift, replacing its
/// trips, stops and memo rows. Reads and writes share one transaction, so a
/// concurrent registry edit is either fully seen or fully excluded.
pub fn recompute_shift(
    pool: &mut DbPool,
    cfg: &Config,
    shift_id: i64,
) -> AppResult<ShiftRecompute> {
    let outcome = pool.with_transaction(|tx| {
        let shift = shifts::get_shift(tx, shift_id)?.ok_or(AppError::ShiftNotFound(shift_id))?;
        if shift.is_active() {
            return Err(AppError::ShiftStillActive(shift_id));
        }

        let pts = points::load_points_for_shift(tx, shift_id)?;
        let index = GeofenceIndex::load(tx)?;

        let mut new_trips = segment_trips(&pts, &cfg.segmentation);
        let mut new_stops = segment_stops(&pts, &cfg.segmentation, &cfg.stops);

        for t in &mut new_trips {
            t.start_location_id = index.match_point(t.start_lat, t.start_lon, t.start_accuracy);
            t.end_location_id = index.match_point(t.end_lat, t.end_lon, t.end_accuracy);
        }
        for s in &mut new_stops {
            s.matched_location_id =
                index.match_point(s.centroid_lat, s.centroid_lon, s.centroid_accuracy);
        }

        let mut outcome = ShiftRecompute {
            shift_id,
            points_total: pts.len(),
            points_used: usable_points(&pts, &cfg.segmentation).len(),
            trips: new_trips.len(),
            stops: new_stops.len(),
            ..Default::default()
        };

        let previous = trips::load_trips_for_shift(tx, shift_id)?;
        for t in &mut new_trips {
            outcome.carried_overrides += carry_over(&previous, t);
        }

        trips::delete_trips_for_shift(tx, shift_id)?;
        clusters::delete_clusters_for_shift(tx, shift_id)?;

        for t in &new_trips {
            trips::insert_trip(tx, t)?;
        }
        for s in &new_stops {
            clusters::insert_cluster(tx, s)?;
        }

        outcome.matched_points = refresh_shift(tx, &index, &pts, &cfg.segmentation, shift_id)?;

        ttlog(
            tx,
            "recompute",
            &format!("shift {shift_id}"),
            &format!(
                "{} trips, {} stops from {}/{} points",
                outcome.trips, outcome.stops, outcome.points_used, outcome.points_total
            ),
        )?;
        Ok(outcome)
    })?;

    info!("shift {shift_id}: {} trips, {} stops", outcome.trips, outcome.stops);
    Ok(outcome)
}

/// Recompute every closed shift independently. A failing shift is reported
/// and the others still run.
pub fn backfill(pool: &mut DbPool, cfg: &Config) -> AppResult<BackfillReport> {
    let mut report = BackfillReport::default();

    for shift_id in shifts::list_closed_shift_ids(&pool.conn)? {
        match recompute_shift(pool, cfg, shift_id) {
            Ok(r) => report.succeeded.push(r),
            Err(e) => {
                warn!("backfill: shift {shift_id} failed: {e}");
                report.failed.push((shift_id, e.to_string()));
            }
        }
    }

    Ok(report)
}
