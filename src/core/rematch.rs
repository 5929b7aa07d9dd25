//! Re-matching of stored trip endpoints and stops after a registry change.

use crate::config::Config;
use crate::core::location_match::refresh_for_location;
use crate::core::matcher::GeofenceIndex;
use crate::db::{clusters, trips};
use crate::errors::AppResult;
use crate::models::location::Location;
use crate::models::match_method::{Endpoint, MatchMethod};
use crate::utils::geo::search_envelope;
use log::debug;
use rusqlite::Connection;
use serde::Serialize;

/// Counts of endpoints and stops whose match changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RematchSummary {
    pub newly_matched_start: usize,
    pub newly_matched_end: usize,
    pub unmatched_start: usize,
    pub unmatched_end: usize,
    pub stops_matched: usize,
    pub stops_unmatched: usize,
}

impl RematchSummary {
    pub fn total(&self) -> usize {
        self.newly_matched_start
            + self.newly_matched_end
            + self.unmatched_start
            + self.unmatched_end
            + self.stops_matched
            + self.stops_unmatched
    }
}

/// Re-evaluate everything a change to `location_id` may affect.
///
/// `index` must already reflect the registry after the change; `zone` is the
/// location as it now stands (None once deleted). Automatic endpoints that
/// pointed at the location are matched again from scratch; automatic
/// endpoints without a location that now fall inside it are attached to it.
/// Manual endpoints are never touched.
pub fn rematch_location(
    conn: &Connection,
    cfg: &Config,
    index: &GeofenceIndex,
    location_id: i64,
    zone: Option<&Location>,
) -> AppResult<RematchSummary> {
    let mut summary = RematchSummary::default();
    let zone = zone.filter(|l| l.active);

    let bbox = zone.map(|l| {
        let env = search_envelope(
            l.latitude,
            l.longitude,
            l.radius_m + cfg.segmentation.max_accuracy_m,
        );
        let [min_lon, min_lat] = env.lower();
        let [max_lon, max_lat] = env.upper();
        (min_lat, max_lat, min_lon, max_lon)
    });

    for endpoint in [Endpoint::Start, Endpoint::End] {
        let mut lost = 0;
        for trip in trips::load_auto_matched(conn, endpoint, location_id)? {
            let (lat, lon, acc) = trip.endpoint_coords(endpoint);
            let now = index.match_point(lat, lon, acc);
            if now != Some(location_id) {
                trips::set_endpoint_location(conn, trip.id, endpoint, now, MatchMethod::Auto)?;
                lost += 1;
            }
        }

        let mut gained = 0;
        if let Some((min_lat, max_lat, min_lon, max_lon)) = bbox {
            for trip in
                trips::load_unmatched_in_box(conn, endpoint, min_lat, max_lat, min_lon, max_lon)?
            {
                let (lat, lon, acc) = trip.endpoint_coords(endpoint);
                if index.match_point(lat, lon, acc) == Some(location_id) {
                    trips::set_endpoint_location(
                        conn,
                        trip.id,
                        endpoint,
                        Some(location_id),
                        MatchMethod::Auto,
                    )?;
                    gained += 1;
                }
            }
        }

        match endpoint {
            Endpoint::Start => {
                summary.unmatched_start = lost;
                summary.newly_matched_start = gained;
            }
            Endpoint::End => {
                summary.unmatched_end = lost;
                summary.newly_matched_end = gained;
            }
        }
    }

    for stop in clusters::load_matched_to(conn, location_id)? {
        let now = index.match_point(stop.centroid_lat, stop.centroid_lon, stop.centroid_accuracy);
        if now != Some(location_id) {
            clusters::set_matched_location(conn, stop.id, now)?;
            summary.stops_unmatched += 1;
        }
    }

    if let Some((min_lat, max_lat, min_lon, max_lon)) = bbox {
        for stop in clusters::load_unmatched_in_box(conn, min_lat, max_lat, min_lon, max_lon)? {
            let now =
                index.match_point(stop.centroid_lat, stop.centroid_lon, stop.centroid_accuracy);
            if now == Some(location_id) {
                clusters::set_matched_location(conn, stop.id, now)?;
                summary.stops_matched += 1;
            }
        }
    }

    let memo = refresh_for_location(conn, index, &cfg.segmentation, location_id, zone)?;
    debug!("rematch location {location_id}: {summary:?}, {memo} memo rows refreshed");

    Ok(summary)
}
