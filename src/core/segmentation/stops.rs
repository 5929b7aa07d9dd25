//! Stop detection: runs of consecutive low-speed fixes.

use super::{IntervalKind, classify, usable_points};
use crate::config::{SegmentationConfig, StopConfig};
use crate::models::gps_point::GpsPoint;
use crate::models::stationary_cluster::StationaryCluster;
use crate::utils::geo::WeightedCentroid;

struct StopRun<'a> {
    first: &'a GpsPoint,
    last: &'a GpsPoint,
    centroid: WeightedCentroid,
    gap_seconds: i64,
    gap_count: i64,
}

impl<'a> StopRun<'a> {
    fn open(first: &'a GpsPoint) -> Self {
        let mut centroid = WeightedCentroid::new();
        centroid.add(first.latitude, first.longitude, first.accuracy_m);
        Self {
            first,
            last: first,
            centroid,
            gap_seconds: 0,
            gap_count: 0,
        }
    }

    fn extend(&mut self, p: &'a GpsPoint, seconds: i64, grace: i64) {
        self.centroid.add(p.latitude, p.longitude, p.accuracy_m);
        if seconds > grace {
            self.gap_seconds += seconds - grace;
            self.gap_count += 1;
        }
        self.last = p;
    }

    fn into_cluster(self, min_duration: i64) -> Option<StationaryCluster> {
        let duration = self.last.seconds_since(self.first);
        if duration <= 0 || duration < min_duration {
            return None;
        }
        let (lat, lon, accuracy) = self.centroid.finish()?;
        Some(StationaryCluster {
            id: 0,
            shift_id: self.first.shift_id,
            employee_id: self.first.employee_id.clone(),
            centroid_lat: lat,
            centroid_lon: lon,
            centroid_accuracy: accuracy,
            started_at: self.first.captured_at,
            ended_at: self.last.captured_at,
            duration_seconds: duration,
            gps_point_count: self.centroid.count() as i64,
            gps_gap_seconds: self.gap_seconds,
            gps_gap_count: self.gap_count,
            matched_location_id: None,
        })
    }
}

/// Group a shift's ordered points into stops.
///
/// A stop is a run of consecutive sub-stationary-speed intervals lasting at
/// least `stops.min_duration_seconds`. Signal gaps do not break a run as long
/// as the device did not move across them.
pub fn segment_stops(
    points: &[GpsPoint],
    seg: &SegmentationConfig,
    stops: &StopConfig,
) -> Vec<StationaryCluster> {
    let mut clusters = Vec::new();
    let mut prev: Option<&GpsPoint> = None;
    let mut run: Option<StopRun> = None;

    for cur in usable_points(points, seg) {
        let Some(p) = prev else {
            prev = Some(cur);
            continue;
        };

        let interval = classify(p, cur, seg);
        let still = match interval.kind {
            IntervalKind::Glitch => continue,
            IntervalKind::Stationary => true,
            IntervalKind::Gap => interval.speed_kmh < seg.stationary_speed_kmh,
            IntervalKind::Vehicle | IntervalKind::Transitional => false,
        };

        if still {
            run.get_or_insert_with(|| StopRun::open(p))
                .extend(cur, interval.seconds, stops.gap_grace_seconds);
        } else if let Some(done) = run.take() {
            clusters.extend(done.into_cluster(stops.min_duration_seconds));
        }

        prev = Some(cur);
    }

    if let Some(done) = run {
        clusters.extend(done.into_cluster(stops.min_duration_seconds));
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn fix(id: &str, lat: f64, secs: i64, accuracy_m: f64) -> GpsPoint {
        GpsPoint {
            id: id.into(),
            shift_id: 7,
            employee_id: "e7".into(),
            device_id: String::new(),
            latitude: lat,
            longitude: -73.6,
            accuracy_m,
            captured_at: Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
                + Duration::seconds(secs),
            speed: None,
            heading: None,
            altitude: None,
            is_mocked: false,
        }
    }

    #[test]
    fn short_pause_is_not_a_stop() {
        let points = vec![fix("a", 45.5, 0, 5.0), fix("b", 45.5, 120, 5.0)];
        let stops = segment_stops(&points, &SegmentationConfig::default(), &StopConfig::default());
        assert!(stops.is_empty());
    }

    #[test]
    fn gap_inside_stop_is_counted_after_grace() {
        let points = vec![
            fix("a", 45.5, 0, 5.0),
            fix("b", 45.5, 60, 5.0),
            fix("c", 45.5, 60 + 420, 5.0),
        ];
        let stops = segment_stops(&points, &SegmentationConfig::default(), &StopConfig::default());
        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].duration_seconds, 480);
        assert_eq!(stops[0].gps_gap_count, 1);
        assert_eq!(stops[0].gps_gap_seconds, 120);
        assert_eq!(stops[0].gps_point_count, 3);
    }

    #[test]
    fn centroid_favours_precise_fixes() {
        let points = vec![
            fix("a", 45.5000, 0, 2.0),
            fix("b", 45.5002, 120, 100.0),
            fix("c", 45.5000, 240, 2.0),
        ];
        let stops = segment_stops(&points, &SegmentationConfig::default(), &StopConfig::default());
        assert_eq!(stops.len(), 1);
        assert!((stops[0].centroid_lat - 45.5).abs() < 0.00001);
    }
}
