//! The per-point match memo. Derived from points and the registry; safe to
//! drop and rebuild at any time.

use crate::config::SegmentationConfig;
use crate::core::matcher::GeofenceIndex;
use crate::core::segmentation::usable_points;
use crate::db::{matches, points};
use crate::errors::AppResult;
use crate::models::gps_point::GpsPoint;
use crate::models::location::Location;
use crate::models::location_match::LocationMatch;
use crate::utils::geo::search_envelope;
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Pure matching of one point; None when it falls outside every geofence.
pub fn match_for_point(index: &GeofenceIndex, p: &GpsPoint) -> Option<LocationMatch> {
    index
        .find(p.latitude, p.longitude, p.accuracy_m)
        .map(|hit| LocationMatch {
            point_id: p.id.clone(),
            location_id: hit.location_id,
            distance_m: hit.distance_m,
            confidence: hit.confidence(),
        })
}

/// Rewrite the memo rows of one shift's points. Returns the number of matched points.
pub fn refresh_shift(
    conn: &Connection,
    index: &GeofenceIndex,
    shift_points: &[GpsPoint],
    cfg: &SegmentationConfig,
    shift_id: i64,
) -> AppResult<usize> {
    matches::delete_for_shift(conn, shift_id)?;

    let mut matched = 0;
    for p in usable_points(shift_points, cfg) {
        if let Some(m) = match_for_point(index, p) {
            matches::upsert_match(conn, &m)?;
            matched += 1;
        }
    }
    Ok(matched)
}

/// Re-derive the memo rows touched by a change to one location: points that
/// matched it before, and points around its current geofence.
pub fn refresh_for_location(
    conn: &Connection,
    index: &GeofenceIndex,
    cfg: &SegmentationConfig,
    location_id: i64,
    zone: Option<&Location>,
) -> AppResult<usize> {
    let previous = points::load_points_matched_to(conn, location_id)?;
    let mut candidates: BTreeMap<String, GpsPoint> =
        previous.into_iter().map(|p| (p.id.clone(), p)).collect();

    if let Some(loc) = zone.filter(|l| l.active) {
        let env = search_envelope(loc.latitude, loc.longitude, loc.radius_m + cfg.max_accuracy_m);
        let [min_lon, min_lat] = env.lower();
        let [max_lon, max_lat] = env.upper();
        for p in points::load_points_in_box(conn, min_lat, max_lat, min_lon, max_lon)? {
            candidates.entry(p.id.clone()).or_insert(p);
        }
    }

    let candidates: Vec<GpsPoint> = candidates.into_values().collect();
    let mut changed = 0;
    for p in &candidates {
        let usable = !usable_points(std::slice::from_ref(p), cfg).is_empty();
        match match_for_point(index, p).filter(|_| usable) {
            Some(m) => matches::upsert_match(conn, &m)?,
            None => {
                matches::delete_match(conn, &p.id)?;
            }
        }
        changed += 1;
    }
    Ok(changed)
}

/// Rebuild the whole memo from scratch.
pub fn rebuild_all(
    conn: &Connection,
    index: &GeofenceIndex,
    cfg: &SegmentationConfig,
    shift_ids: &[i64],
) -> AppResult<usize> {
    matches::delete_all(conn)?;
    let mut matched = 0;
    for &shift_id in shift_ids {
        let pts = points::load_points_for_shift(conn, shift_id)?;
        matched += refresh_shift(conn, index, &pts, cfg, shift_id)?;
    }
    Ok(matched)
}
