//! Segmentation of one shift's GPS stream into trips and stops.
//!
//! Both engines consume the same filtered stream and classify every
//! consecutive pair of fixes with [`classify`]: vehicle-speed intervals feed
//! trips, sub-stationary intervals feed stops.

pub mod stops;
pub mod trips;

pub use stops::segment_stops;
pub use trips::segment_trips;

use crate::config::SegmentationConfig;
use crate::models::gps_point::GpsPoint;
use crate::utils::geo::{haversine_m, speed_kmh};
use log::debug;

/// Speed class of the interval between two consecutive usable fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalKind {
    /// Out-of-order timestamps or an impossible speed: the later fix is dropped.
    Glitch,
    /// No fix for longer than the signal-loss threshold.
    Gap,
    Vehicle,
    Transitional,
    Stationary,
}

#[derive(Debug, Clone, Copy)]
pub struct Interval {
    pub kind: IntervalKind,
    pub distance_m: f64,
    pub seconds: i64,
    /// Implied speed; 0 when no time elapsed.
    pub speed_kmh: f64,
}

/// Drop fixes that must never influence a segment: too inaccurate, mocked,
/// or with unusable coordinates.
pub fn usable_points<'a>(points: &'a [GpsPoint], cfg: &SegmentationConfig) -> Vec<&'a GpsPoint> {
    let kept: Vec<&GpsPoint> = points
        .iter()
        .filter(|p| p.is_valid())
        .filter(|p| p.accuracy_m <= cfg.max_accuracy_m)
        .filter(|p| !(cfg.discard_mocked && p.is_mocked))
        .collect();

    if kept.len() != points.len() {
        debug!(
            "noise filter dropped {} of {} points",
            points.len() - kept.len(),
            points.len()
        );
    }
    kept
}

pub fn classify(prev: &GpsPoint, cur: &GpsPoint, cfg: &SegmentationConfig) -> Interval {
    let elapsed = cur.elapsed_secs(prev);
    let distance_m = haversine_m(prev.latitude, prev.longitude, cur.latitude, cur.longitude);
    let speed = speed_kmh(distance_m, elapsed);

    let kind = match speed {
        None => IntervalKind::Glitch,
        Some(_) if elapsed > cfg.gap_seconds as f64 => IntervalKind::Gap,
        Some(v) if v > cfg.max_speed_kmh => IntervalKind::Glitch,
        Some(v) if v >= cfg.vehicle_speed_kmh => IntervalKind::Vehicle,
        Some(v) if v >= cfg.stationary_speed_kmh => IntervalKind::Transitional,
        Some(_) => IntervalKind::Stationary,
    };

    Interval {
        kind,
        distance_m,
        seconds: cur.seconds_since(prev),
        speed_kmh: speed.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn fix(id: &str, lat: f64, secs: i64, accuracy_m: f64) -> GpsPoint {
        fix_ms(id, lat, secs * 1000, accuracy_m)
    }

    fn fix_ms(id: &str, lat: f64, millis: i64, accuracy_m: f64) -> GpsPoint {
        GpsPoint {
            id: id.into(),
            shift_id: 1,
            employee_id: "e1".into(),
            device_id: String::new(),
            latitude: lat,
            longitude: -73.5,
            accuracy_m,
            captured_at: Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap()
                + chrono::Duration::milliseconds(millis),
            speed: None,
            heading: None,
            altitude: None,
            is_mocked: false,
        }
    }

    #[test]
    fn filter_drops_inaccurate_and_mocked() {
        let cfg = SegmentationConfig::default();
        let mut mocked = fix("m", 45.0, 10, 5.0);
        mocked.is_mocked = true;
        let points = vec![fix("a", 45.0, 0, 5.0), fix("b", 45.0, 5, 250.0), mocked];
        let kept = usable_points(&points, &cfg);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn classify_speed_bands() {
        let cfg = SegmentationConfig::default();
        let a = fix("a", 45.0, 0, 5.0);
        // ~333 m in 30 s = 40 km/h
        assert_eq!(classify(&a, &fix("b", 45.003, 30, 5.0), &cfg).kind, IntervalKind::Vehicle);
        // ~111 m in 60 s = 6.7 km/h
        assert_eq!(
            classify(&a, &fix("c", 45.001, 60, 5.0), &cfg).kind,
            IntervalKind::Transitional
        );
        assert_eq!(classify(&a, &fix("d", 45.0, 60, 5.0), &cfg).kind, IntervalKind::Stationary);
        assert_eq!(classify(&a, &fix("e", 45.0, 0, 5.0), &cfg).kind, IntervalKind::Glitch);
        // ~11 km in 60 s
        assert_eq!(classify(&a, &fix("f", 45.1, 60, 5.0), &cfg).kind, IntervalKind::Glitch);
        assert_eq!(classify(&a, &fix("g", 45.0, 1200, 5.0), &cfg).kind, IntervalKind::Gap);
    }

    #[test]
    fn classify_uses_sub_second_elapsed_time() {
        let cfg = SegmentationConfig::default();
        let a = fix_ms("a", 45.0, 0, 5.0);
        // ~5 m in 1.5 s = 12 km/h
        let walk = classify(&a, &fix_ms("b", 45.000045, 1500, 5.0), &cfg);
        assert_eq!(walk.kind, IntervalKind::Transitional);
        assert!((walk.speed_kmh - 12.0).abs() < 0.1, "speed {}", walk.speed_kmh);
        // ~8.3 m in 0.9 s = 33 km/h
        let drive = classify(&a, &fix_ms("c", 45.0000745, 900, 5.0), &cfg);
        assert_eq!(drive.kind, IntervalKind::Vehicle);
        assert_eq!(drive.seconds, 0);
    }
}
