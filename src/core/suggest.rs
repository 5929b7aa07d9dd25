//! Suggested locations: density clustering of recurring unmatched endpoints.
//!
//! Occurrences are sorted by `(at, source, source_id)` and clustered with
//! DBSCAN at `min_points = 1`, which reduces to connected components of the
//! "within `neighborhood_m`" graph. Clusters are numbered by their earliest
//! member. The summary and the drill-down both replay this exact pass, so a
//! drill-down always returns as many occurrences as the summary counted.

use crate::config::{Config, SuggestionConfig};
use crate::core::matcher::GeofenceIndex;
use crate::db::log::ttlog;
use crate::db::{ignored, shifts, trips};
use crate::errors::{AppError, AppResult};
use crate::models::ignored::{EndpointSource, IgnoredCluster};
use crate::models::shift::Shift;
use crate::models::suggestion::{ClusterSuggestion, Occurrence};
use crate::utils::geo::{WeightedCentroid, haversine_m, search_envelope};
use chrono::{DateTime, Duration, Utc};
use log::debug;
use rstar::{AABB, RTree, RTreeObject};
use rusqlite::Connection;
use std::collections::{BTreeSet, HashMap, VecDeque};

#[derive(Debug, Clone, Copy)]
struct IndexedOccurrence {
    idx: usize,
    lat: f64,
    lon: f64,
}

impl RTreeObject for IndexedOccurrence {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lon, self.lat])
    }
}

/// A cluster together with the occurrences it was built from.
#[derive(Debug, Clone)]
pub struct OccurrenceCluster {
    pub summary: ClusterSuggestion,
    pub members: Vec<Occurrence>,
}

fn load_shift<'a>(
    conn: &Connection,
    cache: &'a mut HashMap<i64, Option<Shift>>,
    id: i64,
) -> AppResult<Option<&'a Shift>> {
    if !cache.contains_key(&id) {
        cache.insert(id, shifts::get_shift(conn, id)?);
    }
    Ok(cache.get(&id).and_then(Option::as_ref))
}

/// Every unmatched coordinate of the trailing window, minus dismissed ones.
///
/// Trip endpoints count when their stored location is empty or no longer
/// active. Clock events count when precise enough and outside every active
/// geofence.
pub fn collect_occurrences(
    conn: &Connection,
    cfg: &SuggestionConfig,
    index: &GeofenceIndex,
    now: DateTime<Utc>,
) -> AppResult<Vec<Occurrence>> {
    let since = now - Duration::days(cfg.window_days);
    let dismissed = ignored::ignored_endpoint_keys(conn)?;
    let in_window = |at: &DateTime<Utc>| *at >= since && *at <= now;
    let unmatched = |loc: Option<i64>| loc.is_none_or(|id| index.location(id).is_none());

    let mut shift_cache: HashMap<i64, Option<Shift>> = HashMap::new();
    let mut out = Vec::new();

    for trip in trips::load_trips_since(conn, &since)? {
        let name = load_shift(conn, &mut shift_cache, trip.shift_id)?
            .map(|s| s.display_name().to_string())
            .unwrap_or_else(|| trip.employee_id.clone());

        let ends = [
            (
                EndpointSource::TripStart,
                trip.start_location_id,
                trip.start_lat,
                trip.start_lon,
                trip.start_accuracy,
                trip.started_at,
                &trip.start_address,
            ),
            (
                EndpointSource::TripEnd,
                trip.end_location_id,
                trip.end_lat,
                trip.end_lon,
                trip.end_accuracy,
                trip.ended_at,
                &trip.end_address,
            ),
        ];
        for (source, loc, lat, lon, acc, at, address) in ends {
            if !unmatched(loc) || !in_window(&at) || dismissed.contains(&(source, trip.id)) {
                continue;
            }
            out.push(Occurrence {
                source,
                source_id: trip.id,
                employee_id: trip.employee_id.clone(),
                employee_name: name.clone(),
                latitude: lat,
                longitude: lon,
                accuracy_m: acc,
                at,
                address: address.clone(),
            });
        }
    }

    for shift in shifts::list_shifts_since(conn, &(since - Duration::days(1)))? {
        let fixes = [
            (EndpointSource::ClockIn, shift.clock_in_fix()),
            (EndpointSource::ClockOut, shift.clock_out_fix()),
        ];
        for (source, fix) in fixes {
            let Some(fix) = fix else { continue };
            if fix.accuracy_m > cfg.clock_accuracy_max_m
                || !in_window(&fix.at)
                || dismissed.contains(&(source, shift.id))
                || index
                    .match_point(fix.latitude, fix.longitude, fix.accuracy_m)
                    .is_some()
            {
                continue;
            }
            out.push(Occurrence {
                source,
                source_id: shift.id,
                employee_id: shift.employee_id.clone(),
                employee_name: shift.display_name().to_string(),
                latitude: fix.latitude,
                longitude: fix.longitude,
                accuracy_m: fix.accuracy_m,
                at: fix.at,
                address: None,
            });
        }
    }

    out.sort_by(|a, b| {
        a.at.cmp(&b.at)
            .then(a.source.cmp(&b.source))
            .then(a.source_id.cmp(&b.source_id))
    });
    debug!("{} unmatched occurrences since {since}", out.len());
    Ok(out)
}

fn summarize(members: &[Occurrence], max_samples: usize) -> Option<ClusterSuggestion> {
    let mut centroid = WeightedCentroid::new();
    for m in members {
        centroid.add(m.latitude, m.longitude, m.accuracy_m);
    }
    let (lat, lon, _) = centroid.finish()?;

    let names: BTreeSet<String> = members.iter().map(|m| m.employee_name.clone()).collect();

    let mut samples: Vec<String> = Vec::new();
    for addr in members.iter().filter_map(|m| m.address.as_deref()) {
        let addr = addr.trim();
        if samples.len() >= max_samples {
            break;
        }
        if !addr.is_empty() && !samples.iter().any(|s| s == addr) {
            samples.push(addr.to_string());
        }
    }

    Some(ClusterSuggestion {
        centroid_lat: lat,
        centroid_lon: lon,
        occurrence_count: members.len(),
        first_seen: members.iter().map(|m| m.at).min()?,
        last_seen: members.iter().map(|m| m.at).max()?,
        employee_names: names.into_iter().collect(),
        address_samples: samples,
    })
}

/// Cluster sorted occurrences. Output order follows each cluster's earliest member.
pub fn cluster_occurrences(
    occurrences: Vec<Occurrence>,
    cfg: &SuggestionConfig,
) -> Vec<OccurrenceCluster> {
    let tree = RTree::bulk_load(
        occurrences
            .iter()
            .enumerate()
            .map(|(idx, o)| IndexedOccurrence {
                idx,
                lat: o.latitude,
                lon: o.longitude,
            })
            .collect(),
    );

    let mut visited = vec![false; occurrences.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for seed in 0..occurrences.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut group = vec![seed];
        let mut queue = VecDeque::from([seed]);

        while let Some(i) = queue.pop_front() {
            let o = &occurrences[i];
            let envelope = search_envelope(o.latitude, o.longitude, cfg.neighborhood_m);
            for n in tree.locate_in_envelope_intersecting(&envelope) {
                if visited[n.idx] {
                    continue;
                }
                if haversine_m(o.latitude, o.longitude, n.lat, n.lon) <= cfg.neighborhood_m {
                    visited[n.idx] = true;
                    group.push(n.idx);
                    queue.push_back(n.idx);
                }
            }
        }

        group.sort_unstable();
        groups.push(group);
    }

    groups
        .into_iter()
        .filter_map(|group| {
            let members: Vec<Occurrence> = group.iter().map(|&i| occurrences[i].clone()).collect();
            summarize(&members, cfg.max_address_samples)
                .map(|summary| OccurrenceCluster { summary, members })
        })
        .collect()
}

/// The full clustering pass shared by the summary and the drill-down.
pub fn replay(
    conn: &Connection,
    cfg: &Config,
    now: DateTime<Utc>,
) -> AppResult<Vec<OccurrenceCluster>> {
    let index = GeofenceIndex::load(conn)?;
    let occurrences = collect_occurrences(conn, &cfg.suggestions, &index, now)?;
    Ok(cluster_occurrences(occurrences, &cfg.suggestions))
}

/// True while a dismissal still hides the cluster: close to it and not grown past it.
fn is_suppressed(s: &ClusterSuggestion, dismissed: &[IgnoredCluster], radius_m: f64) -> bool {
    dismissed.iter().any(|d| {
        haversine_m(s.centroid_lat, s.centroid_lon, d.centroid_lat, d.centroid_lon) <= radius_m
            && s.occurrence_count as i64 <= d.occurrence_count
    })
}

/// Suggested locations with at least `min_occurrences` members, most frequent first.
pub fn suggest_locations(
    conn: &Connection,
    cfg: &Config,
    min_occurrences: usize,
    now: DateTime<Utc>,
) -> AppResult<Vec<ClusterSuggestion>> {
    let dismissed = ignored::list_ignored_clusters(conn)?;
    let mut out: Vec<ClusterSuggestion> = replay(conn, cfg, now)?
        .into_iter()
        .map(|c| c.summary)
        .filter(|s| s.occurrence_count >= min_occurrences.max(1))
        .filter(|s| !is_suppressed(s, &dismissed, cfg.suggestions.ignore_radius_m))
        .collect();

    out.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    Ok(out)
}

/// Members of the cluster whose centroid is nearest `(lat, lon)`, provided it
/// lies within `radius_m`. Empty otherwise.
pub fn get_cluster_occurrences(
    conn: &Connection,
    cfg: &Config,
    lat: f64,
    lon: f64,
    radius_m: f64,
    now: DateTime<Utc>,
) -> AppResult<Vec<Occurrence>> {
    let nearest = replay(conn, cfg, now)?
        .into_iter()
        .map(|c| {
            let d = haversine_m(lat, lon, c.summary.centroid_lat, c.summary.centroid_lon);
            (d, c)
        })
        .filter(|(d, _)| *d <= radius_m)
        .min_by(|a, b| a.0.total_cmp(&b.0));

    Ok(nearest.map(|(_, c)| c.members).unwrap_or_default())
}

/// Hide a suggestion until it grows past `occurrence_count`.
pub fn dismiss_cluster(
    conn: &Connection,
    lat: f64,
    lon: f64,
    occurrence_count: i64,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    if !lat.is_finite()
        || !(-90.0..=90.0).contains(&lat)
        || !lon.is_finite()
        || !(-180.0..=180.0).contains(&lon)
    {
        return Err(AppError::InvalidCoordinate(format!("{lat},{lon}")));
    }
    let id = ignored::insert_ignored_cluster(conn, lat, lon, occurrence_count, &now)?;
    ttlog(
        conn,
        "dismiss",
        &format!("cluster {id}"),
        &format!("{lat:.6},{lon:.6} at {occurrence_count} occurrences"),
    )?;
    Ok(id)
}

/// Stop feeding one endpoint into the suggester.
pub fn dismiss_endpoint(
    conn: &Connection,
    source: EndpointSource,
    source_id: i64,
    now: DateTime<Utc>,
) -> AppResult<()> {
    ignored::insert_ignored_endpoint(conn, source, source_id, &now)?;
    ttlog(
        conn,
        "dismiss",
        &format!("{} {source_id}", source.to_db_str()),
        "endpoint dismissed",
    )
}

/// Undo a cluster dismissal.
pub fn restore_cluster(conn: &Connection, id: i64) -> AppResult<()> {
    if ignored::delete_ignored_cluster(conn, id)? == 0 {
        return Err(AppError::InvalidValue {
            field: "dismissed cluster id",
            value: id.to_string(),
        });
    }
    ttlog(conn, "restore", &format!("cluster {id}"), "dismissal removed")
}
