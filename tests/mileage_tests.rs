use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use predicates::str::contains;
use rtriplogger::core::mileage::summarize;
use rtriplogger::db::pool::DbPool;
use rtriplogger::db::{rates, shifts, trips};
use rtriplogger::errors::AppError;
use rtriplogger::models::match_method::MatchMethod;
use rtriplogger::models::reimbursement_rate::ReimbursementRate;
use rtriplogger::models::trip::{CarpoolRole, Classification, TransportMode, Trip};

mod common;
use common::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn stored_trip(pool: &DbPool, started_at: DateTime<Utc>, km: f64, classification: Classification) {
    let trip = Trip {
        id: 0,
        shift_id: 1,
        employee_id: "e1".into(),
        started_at,
        ended_at: started_at + chrono::Duration::minutes(30),
        start_lat: BASE_LAT,
        start_lon: BASE_LON,
        start_accuracy: 5.0,
        end_lat: BASE_LAT + 0.1,
        end_lon: BASE_LON,
        end_accuracy: 5.0,
        distance_km: km,
        road_distance_km: None,
        duration_minutes: 30,
        classification,
        transport_mode: TransportMode::Driving,
        carpool_role: CarpoolRole::Solo,
        confidence_score: 1.0,
        gps_point_count: 10,
        low_accuracy_point_count: 0,
        has_gps_gap: false,
        start_location_id: None,
        end_location_id: None,
        start_match_method: MatchMethod::Auto,
        end_match_method: MatchMethod::Auto,
        start_address: None,
        end_address: None,
    };
    trips::insert_trip(&pool.conn, &trip).unwrap();
}

fn cra_rate(from: NaiveDate) -> ReimbursementRate {
    ReimbursementRate {
        id: 0,
        rate_per_km: 0.72,
        threshold_km: Some(5000.0),
        rate_after_threshold: Some(0.66),
        effective_from: from,
        effective_to: None,
    }
}

/// 4,900 km earlier in the year, then 300 business km and 50 personal km in March.
fn seeded(name: &str) -> (String, DbPool) {
    let db_path = setup_test_db(name);
    let pool = open(&db_path);
    shifts::upsert_shift(&pool.conn, &shift(1, "e1", noon(2026, 2, 1))).unwrap();
    stored_trip(&pool, noon(2026, 2, 10), 4900.0, Classification::Business);
    stored_trip(&pool, noon(2026, 3, 2), 300.0, Classification::Business);
    stored_trip(&pool, noon(2026, 3, 3), 50.0, Classification::Personal);
    (db_path, pool)
}

#[test]
fn test_tiered_reimbursement_crosses_threshold() {
    let (_, pool) = seeded("mil_tiers");
    rates::insert_rate(&pool.conn, &cra_rate(day(2026, 1, 1))).unwrap();

    let s = summarize(&pool.conn, "e1", day(2026, 3, 1), day(2026, 3, 31)).unwrap();
    assert_eq!(s.trip_count, 2);
    assert!((s.total_km - 350.0).abs() < 1e-9);
    assert!((s.business_km - 300.0).abs() < 1e-9);
    assert!((s.personal_km - 50.0).abs() < 1e-9);
    assert!((s.ytd_km_before - 4900.0).abs() < 1e-9);
    assert!((s.base_tier_km - 100.0).abs() < 1e-9);
    assert!((s.reduced_tier_km - 200.0).abs() < 1e-9);
    assert_eq!(s.base_amount, 72.0);
    assert_eq!(s.reduced_amount, 132.0);
    assert_eq!(s.reimbursement, 204.0);
    assert!(!s.no_rate);
}

#[test]
fn test_company_vehicle_days_are_not_reimbursed() {
    let (_, pool) = seeded("mil_vehicle_days");
    rates::insert_rate(&pool.conn, &cra_rate(day(2026, 1, 1))).unwrap();
    rates::add_company_vehicle_day(&pool.conn, "e1", day(2026, 3, 2)).unwrap();

    let s = summarize(&pool.conn, "e1", day(2026, 3, 1), day(2026, 3, 31)).unwrap();
    assert!((s.business_km - 300.0).abs() < 1e-9);
    assert_eq!(s.reimbursable_km, 0.0);
    assert_eq!(s.reimbursement, 0.0);
}

#[test]
fn test_missing_rate_is_flagged() {
    let (_, pool) = seeded("mil_no_rate");
    let s = summarize(&pool.conn, "e1", day(2026, 3, 1), day(2026, 3, 31)).unwrap();
    assert!(s.no_rate);
    assert_eq!(s.rate_id, None);
    assert_eq!(s.reimbursement, 0.0);
}

#[test]
fn test_future_rate_is_used_as_fallback() {
    let (_, pool) = seeded("mil_fallback");
    let id = rates::insert_rate(&pool.conn, &cra_rate(day(2027, 1, 1))).unwrap();
    let s = summarize(&pool.conn, "e1", day(2026, 3, 1), day(2026, 3, 31)).unwrap();
    assert_eq!(s.rate_id, Some(id));
    assert_eq!(s.reimbursement, 204.0);
}

#[test]
fn test_inverted_period_is_rejected() {
    let (_, pool) = seeded("mil_inverted");
    let err = summarize(&pool.conn, "e1", day(2026, 3, 31), day(2026, 3, 1)).unwrap_err();
    assert!(matches!(err, AppError::InvalidPeriod(_)));
}

#[test]
fn test_mileage_cli() {
    let (db_path, pool) = seeded("mil_cli");
    drop(pool);

    rti()
        .args([
            "--db", &db_path, "mileage", "--employee", "e1", "--from", "2026-03-01", "--to",
            "2026-03-31",
        ])
        .assert()
        .success()
        .stdout(contains("No reimbursement rate configured"));

    rti()
        .args([
            "--db", &db_path, "rate", "--add", "--per-km", "0.72", "--threshold", "5000",
            "--after", "0.66", "--from", "2026-01-01",
        ])
        .assert()
        .success()
        .stdout(contains("Rate 1 added"));

    rti()
        .args(["--db", &db_path, "rate", "--list"])
        .assert()
        .success()
        .stdout(contains("0.7200"));

    rti()
        .args([
            "--db", &db_path, "mileage", "--employee", "e1", "--from", "2026-03-01", "--to",
            "2026-03-31",
        ])
        .assert()
        .success()
        .stdout(contains("204.00"));

    rti()
        .args([
            "--db", &db_path, "mileage", "--employee", "e1", "--from", "2026-03-01", "--to",
            "2026-03-31", "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"reimbursement\": 204.0"));

    rti()
        .args(["--db", &db_path, "vehicle", "--employee", "e1", "--date", "2026-03-02"])
        .assert()
        .success();

    rti()
        .args([
            "--db", &db_path, "mileage", "--employee", "e1", "--from", "2026-03-01", "--to",
            "2026-03-31",
        ])
        .assert()
        .success()
        .stdout(contains("Reimbursement:   0.00"));

    rti()
        .args([
            "--db", &db_path, "mileage", "--employee", "e1", "--from", "2026-13-01", "--to",
            "2026-03-31",
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid date"));
}
