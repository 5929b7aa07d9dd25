use predicates::str::contains;
use rtriplogger::core::recompute::{backfill, recompute_shift};
use rtriplogger::core::segmentation::{segment_stops, segment_trips};
use rtriplogger::db::{clusters, trips};
use rtriplogger::errors::AppError;
use rtriplogger::models::gps_point::GpsPoint;
use rtriplogger::models::trip::Trip;
use rtriplogger::utils::geo::haversine_m;
use serde_json::Value;
use std::time::Duration;

mod common;
use common::*;

/// Degrees of latitude covering one meter.
const DEG_PER_M: f64 = 1.0 / 111_194.93;

fn without_ids(rows: Vec<Trip>) -> Vec<Trip> {
    rows.into_iter().map(|t| Trip { id: 0, ..t }).collect()
}

/// `count` fixes `step_m` apart, one every `every_ms` milliseconds.
fn steady(count: usize, step_m: f64, every_ms: i64) -> Vec<GpsPoint> {
    (0..count)
        .map(|i| {
            let mut p = fix(
                &format!("s{i}"),
                1,
                BASE_LAT + step_m * DEG_PER_M * i as f64,
                BASE_LON,
                5.0,
                0,
            );
            p.captured_at = at_ms(every_ms * i as i64);
            p
        })
        .collect()
}

fn corrected_km(pts: &[GpsPoint]) -> f64 {
    let meters: f64 = pts
        .windows(2)
        .map(|w| haversine_m(w[0].latitude, w[0].longitude, w[1].latitude, w[1].longitude))
        .sum();
    meters / 1000.0 * 1.3
}

#[test]
fn test_drive_then_park_end_to_end() {
    let db_path = setup_test_db("seg_e2e");
    init_db(&db_path);

    let shifts_file = temp_file("seg_e2e_shifts", &shifts_csv(&[shift(1, "e1", at(-600))]));
    let points_file = temp_file("seg_e2e_points", &points_csv(&drive_then_park(1, "p")));

    rti()
        .args(["--db", &db_path, "import", "--shifts", &shifts_file])
        .assert()
        .success()
        .stdout(contains("1 stored"));

    rti()
        .args(["--db", &db_path, "import", "--points", &points_file])
        .assert()
        .success()
        .stdout(contains("6 inserted"));

    rti()
        .args(["--db", &db_path, "segment", "--shift", "1"])
        .assert()
        .success()
        .stdout(contains("1 trips, 1 stops"));

    let out = rti()
        .args(["--db", &db_path, "list", "--shift", "1", "--json"])
        .output()
        .expect("run list");
    assert!(out.status.success());
    let listed: Value = serde_json::from_slice(&out.stdout).expect("trips json");
    let listed = listed.as_array().expect("array of trips");
    assert_eq!(listed.len(), 1);

    let trip = &listed[0];
    let km = trip["distance_km"].as_f64().unwrap();
    assert!((km - 1.56).abs() < 0.01, "distance {km}");
    assert_eq!(trip["duration_minutes"].as_i64(), Some(2));
    assert_eq!(trip["gps_point_count"].as_i64(), Some(5));
    assert_eq!(trip["has_gps_gap"].as_bool(), Some(false));
    assert_eq!(trip["start_match_method"].as_str(), Some("auto"));

    let out = rti()
        .args(["--db", &db_path, "list", "--shift", "1", "--stops", "--json"])
        .output()
        .expect("run list --stops");
    let stops: Value = serde_json::from_slice(&out.stdout).expect("stops json");
    let stops = stops.as_array().expect("array of stops");
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0]["started_at"], trip["ended_at"]);
    assert_eq!(stops[0]["duration_seconds"].as_i64(), Some(240));
}

#[test]
fn test_signal_gap_splits_trips() {
    let db_path = setup_test_db("seg_gap");
    let cfg = test_config(&db_path);

    let after_gap = |base: i64| -> Vec<GpsPoint> {
        (0..4)
            .map(|i| {
                fix(
                    &format!("b{i}"),
                    1,
                    BASE_LAT + STEP_300M * (10 + i) as f64,
                    BASE_LON,
                    5.0,
                    base + 1200 + 30 * i,
                )
            })
            .collect()
    };

    // 3 moving fixes right up to 20 minutes of silence, then 4 more
    let mut pts: Vec<_> = (0..3)
        .map(|i| fix(&format!("a{i}"), 1, BASE_LAT + STEP_300M * i as f64, BASE_LON, 5.0, 30 * i))
        .collect();
    pts.extend(after_gap(60));

    let found = segment_trips(&pts, &cfg.segmentation);
    assert_eq!(found.len(), 2);
    assert!(!found[0].has_gps_gap);
    assert_eq!(found[0].ended_at, at(60));
    assert!((found[0].distance_km - 0.78).abs() < 0.01);
    assert!(!found[1].has_gps_gap);
    assert_eq!(found[1].started_at, at(1260));
    assert_eq!(found[1].gps_point_count, 4);

    // same drive, but parked for a minute before the signal went
    let mut pts: Vec<_> = (0..3)
        .map(|i| fix(&format!("a{i}"), 1, BASE_LAT + STEP_300M * i as f64, BASE_LON, 5.0, 30 * i))
        .collect();
    pts.push(fix("a3", 1, BASE_LAT + STEP_300M * 2.0, BASE_LON, 5.0, 120));
    pts.extend(after_gap(120));

    let found = segment_trips(&pts, &cfg.segmentation);
    assert_eq!(found.len(), 2);
    assert!(found[0].has_gps_gap);
    assert_eq!(found[0].ended_at, at(120));
    assert_eq!(found[0].gps_point_count, 4);
    assert!((found[0].distance_km - 0.78).abs() < 0.01);
    assert!(!found[1].has_gps_gap);
}

#[test]
fn test_sub_second_sampling_keeps_speed_classes() {
    let db_path = setup_test_db("seg_sub_second");
    let cfg = test_config(&db_path);

    // 12 km/h walk sampled every 1.5 s never reaches vehicle speed
    let walk = steady(121, 5.0, 1500);
    assert!(segment_trips(&walk, &cfg.segmentation).is_empty());

    // 33 km/h drive sampled every 900 ms keeps every fix
    let drive = steady(140, 8.25, 900);
    let found = segment_trips(&drive, &cfg.segmentation);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].gps_point_count, 140);
    assert!((found[0].distance_km - corrected_km(&drive)).abs() < 1e-6);
}

#[test]
fn test_impossible_jump_neither_splits_nor_lengthens_a_trip() {
    let db_path = setup_test_db("seg_glitch");
    let cfg = test_config(&db_path);

    let clean = drive_then_park(1, "p");
    let mut noisy = clean.clone();
    // 5.5 km away 15 s after the second fix
    noisy.push(fix("jump", 1, BASE_LAT + 0.05, BASE_LON, 5.0, 45));
    noisy.sort_by_key(|p| p.captured_at);

    let expected = segment_trips(&clean, &cfg.segmentation);
    assert_eq!(expected.len(), 1);
    assert_eq!(segment_trips(&noisy, &cfg.segmentation), expected);
}

#[test]
fn test_short_pause_stays_inside_the_trip() {
    let db_path = setup_test_db("seg_short_pause");
    let cfg = test_config(&db_path);

    let paused_lat = BASE_LAT + STEP_300M * 2.0 + 2.0 * DEG_PER_M;
    let pts = vec![
        fix("a", 1, BASE_LAT, BASE_LON, 5.0, 0),
        fix("b", 1, BASE_LAT + STEP_300M, BASE_LON, 5.0, 30),
        fix("c", 1, BASE_LAT + STEP_300M * 2.0, BASE_LON, 5.0, 60),
        // crawls 2 m in a minute, then drives on
        fix("d", 1, paused_lat, BASE_LON, 5.0, 120),
        fix("e", 1, paused_lat + STEP_300M, BASE_LON, 5.0, 150),
        fix("f", 1, paused_lat + STEP_300M * 2.0, BASE_LON, 5.0, 180),
    ];

    let found = segment_trips(&pts, &cfg.segmentation);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].gps_point_count, 6);
    assert_eq!(found[0].ended_at, at(180));
    assert!((found[0].distance_km - corrected_km(&pts)).abs() < 1e-6);
}

#[test]
fn test_confidence_reflects_imprecise_fixes() {
    let db_path = setup_test_db("seg_confidence");
    let cfg = test_config(&db_path);

    let mut pts = drive_then_park(1, "p");
    pts[1].accuracy_m = 80.0;
    pts[3].accuracy_m = 80.0;

    let found = segment_trips(&pts, &cfg.segmentation);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].gps_point_count, 5);
    assert_eq!(found[0].low_accuracy_point_count, 2);
    assert!((found[0].confidence_score - 0.6).abs() < 1e-9);
}

#[test]
fn test_transactions_take_the_write_lock_up_front() {
    let db_path = setup_test_db("seg_write_lock");
    let mut pool = open(&db_path);

    let other_blocked = pool
        .with_transaction(|_tx| {
            let other = rusqlite::Connection::open(&db_path)?;
            other.busy_timeout(Duration::ZERO)?;
            Ok(other.execute_batch("BEGIN IMMEDIATE; ROLLBACK;").is_err())
        })
        .unwrap();
    assert!(other_blocked);
}

#[test]
fn test_recompute_is_idempotent() {
    let db_path = setup_test_db("seg_idempotent");
    let mut pool = open(&db_path);
    let cfg = test_config(&db_path);
    seed_shift(&pool, &shift(1, "e1", at(-600)), &drive_then_park(1, "p"));

    let first = recompute_shift(&mut pool, &cfg, 1).expect("first run");
    let trips_a = trips::load_trips_for_shift(&pool.conn, 1).unwrap();
    let stops_a = clusters::load_clusters_for_shift(&pool.conn, 1).unwrap();

    let second = recompute_shift(&mut pool, &cfg, 1).expect("second run");
    let trips_b = trips::load_trips_for_shift(&pool.conn, 1).unwrap();
    let stops_b = clusters::load_clusters_for_shift(&pool.conn, 1).unwrap();

    assert_eq!(first, second);
    assert_eq!(trips_a.len(), 1);
    assert_eq!(without_ids(trips_a), without_ids(trips_b));
    assert_eq!(stops_a.len(), stops_b.len());
    for (a, b) in stops_a.iter().zip(&stops_b) {
        assert_eq!((a.started_at, a.ended_at), (b.started_at, b.ended_at));
        assert_eq!(a.gps_point_count, b.gps_point_count);
    }
}

#[test]
fn test_imprecise_and_mocked_fixes_are_ignored() {
    let db_path = setup_test_db("seg_accuracy_floor");
    let cfg = test_config(&db_path);

    let clean = drive_then_park(1, "p");
    let mut noisy = clean.clone();
    noisy.push(fix("far-off", 1, BASE_LAT + 0.05, BASE_LON, 500.0, 45));
    let mut mocked = fix("mocked", 1, BASE_LAT - 0.05, BASE_LON, 5.0, 75);
    mocked.is_mocked = true;
    noisy.push(mocked);
    noisy.sort_by_key(|p| p.captured_at);

    let expected = segment_trips(&clean, &cfg.segmentation);
    let got = segment_trips(&noisy, &cfg.segmentation);
    assert_eq!(got, expected);
    assert_eq!(
        segment_stops(&noisy, &cfg.segmentation, &cfg.stops),
        segment_stops(&clean, &cfg.segmentation, &cfg.stops)
    );
}

#[test]
fn test_short_hop_is_not_a_trip() {
    let db_path = setup_test_db("seg_min_significance");
    let cfg = test_config(&db_path);

    // one 300 m interval: 0.39 km after correction, below the 0.5 km floor
    let pts = vec![
        fix("a", 1, BASE_LAT, BASE_LON, 5.0, 0),
        fix("b", 1, BASE_LAT + STEP_300M, BASE_LON, 5.0, 30),
        fix("c", 1, BASE_LAT + STEP_300M, BASE_LON, 5.0, 300),
    ];
    assert!(segment_trips(&pts, &cfg.segmentation).is_empty());
}

#[test]
fn test_active_shift_is_rejected() {
    let db_path = setup_test_db("seg_active_shift");
    let mut pool = open(&db_path);
    let cfg = test_config(&db_path);

    let mut open_shift = shift(1, "e1", at(-600));
    open_shift.clocked_out_at = None;
    seed_shift(&pool, &open_shift, &drive_then_park(1, "p"));

    let err = recompute_shift(&mut pool, &cfg, 1).unwrap_err();
    assert!(matches!(err, AppError::ShiftStillActive(1)));

    let err = recompute_shift(&mut pool, &cfg, 99).unwrap_err();
    assert!(matches!(err, AppError::ShiftNotFound(99)));
}

#[test]
fn test_backfill_covers_closed_shifts_only() {
    let db_path = setup_test_db("seg_backfill");
    let mut pool = open(&db_path);
    let cfg = test_config(&db_path);

    seed_shift(&pool, &shift(1, "e1", at(-600)), &drive_then_park(1, "p"));
    seed_shift(&pool, &shift(2, "e1", at(-600)), &drive_then_park(2, "q"));
    let mut open_shift = shift(3, "e1", at(-600));
    open_shift.clocked_out_at = None;
    seed_shift(&pool, &open_shift, &drive_then_park(3, "r"));

    let report = backfill(&mut pool, &cfg).expect("backfill");
    assert_eq!(report.succeeded.len(), 2);
    assert!(report.failed.is_empty());
    assert!(trips::load_trips_for_shift(&pool.conn, 3).unwrap().is_empty());
}

#[test]
fn test_timeline_lists_trip_then_stop() {
    let db_path = setup_test_db("seg_timeline");
    let mut pool = open(&db_path);
    let cfg = test_config(&db_path);
    seed_shift(&pool, &shift(1, "e1", at(-600)), &drive_then_park(1, "p"));
    recompute_shift(&mut pool, &cfg, 1).unwrap();
    drop(pool);

    let out = rti()
        .args(["--db", &db_path, "list", "--shift", "1", "--timeline", "--json"])
        .output()
        .expect("run list --timeline");
    assert!(out.status.success());
    let tl: Value = serde_json::from_slice(&out.stdout).expect("timeline json");
    let segments = tl["segments"].as_array().expect("segments");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["segment"].as_str(), Some("trip"));
    assert_eq!(segments[1]["segment"].as_str(), Some("stop"));
    assert_eq!(segments[1]["class"]["kind"].as_str(), Some("unmatched"));
    assert_eq!(segments[1]["class"]["at_boundary"].as_bool(), Some(true));
    assert!(tl["gaps"].as_array().unwrap().is_empty());
}
