use crate::models::stationary_cluster::StationaryCluster;
use crate::models::trip::Trip;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How a stop is presented on the day timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopClass {
    Matched { location_id: i64 },
    /// Unmatched stop between stops at two different locations.
    Travel,
    /// `at_boundary` marks stops without a neighbor on one side, where the
    /// travel rule cannot be applied.
    Unmatched { at_boundary: bool },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "segment", rename_all = "snake_case")]
pub enum Segment {
    Trip {
        trip_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        duration_minutes: i64,
        distance_km: f64,
        start_location_id: Option<i64>,
        end_location_id: Option<i64>,
    },
    Stop {
        stop_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        duration_minutes: i64,
        class: StopClass,
    },
}

impl Segment {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Segment::Trip { start, .. } | Segment::Stop { start, .. } => *start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            Segment::Trip { end, .. } | Segment::Stop { end, .. } => *end,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Gap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct Timeline {
    pub segments: Vec<Segment>,
    pub gaps: Vec<Gap>,
    pub total_trip_minutes: i64,
    pub total_stop_minutes: i64,
    pub total_km: f64,
}

/// Classify stops (in time order) with the travel-vs-unmatched rule.
pub fn classify_stops(stops: &[StationaryCluster]) -> Vec<StopClass> {
    stops
        .iter()
        .enumerate()
        .map(|(i, stop)| {
            if let Some(location_id) = stop.matched_location_id {
                return StopClass::Matched { location_id };
            }
            let before = i.checked_sub(1).and_then(|j| stops.get(j));
            let after = stops.get(i + 1);
            match (before, after) {
                (Some(b), Some(a)) => match (b.matched_location_id, a.matched_location_id) {
                    (Some(x), Some(y)) if x != y => StopClass::Travel,
                    _ => StopClass::Unmatched { at_boundary: false },
                },
                _ => StopClass::Unmatched { at_boundary: true },
            }
        })
        .collect()
}

pub fn build_timeline(trips: &[Trip], stops: &[StationaryCluster]) -> Timeline {
    if trips.is_empty() && stops.is_empty() {
        return Timeline::default();
    }

    // -----------------------------
    // Sort stops chronologically
    // -----------------------------
    let mut sorted_stops = stops.to_vec();
    sorted_stops.sort_by_key(|s| (s.started_at, s.id));
    let classes = classify_stops(&sorted_stops);

    let mut segments: Vec<Segment> = Vec::with_capacity(trips.len() + stops.len());
    let mut total_trip = 0;
    let mut total_stop = 0;
    let mut total_km = 0.0;

    for t in trips {
        total_trip += t.duration_minutes;
        total_km += t.billable_distance_km();
        segments.push(Segment::Trip {
            trip_id: t.id,
            start: t.started_at,
            end: t.ended_at,
            duration_minutes: t.duration_minutes,
            distance_km: t.billable_distance_km(),
            start_location_id: t.start_location_id,
            end_location_id: t.end_location_id,
        });
    }

    for (s, class) in sorted_stops.iter().zip(classes) {
        let minutes = s.duration_seconds / 60;
        total_stop += minutes;
        segments.push(Segment::Stop {
            stop_id: s.id,
            start: s.started_at,
            end: s.ended_at,
            duration_minutes: minutes,
            class,
        });
    }

    // Trips before stops on equal start: a stop begins where a trip ends.
    segments.sort_by_key(|seg| (seg.start(), matches!(seg, Segment::Stop { .. })));

    // -----------------------------
    // Compute GAPS between segments
    // -----------------------------
    let gaps = segments
        .windows(2)
        .filter_map(|w| {
            let start = w[0].end();
            let end = w[1].start();
            (end > start).then(|| Gap {
                start,
                end,
                duration_minutes: (end - start).num_minutes(),
            })
        })
        .collect();

    Timeline {
        segments,
        gaps,
        total_trip_minutes: total_trip,
        total_stop_minutes: total_stop,
        total_km,
    }
}
