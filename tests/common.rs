#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rtriplogger::config::Config;
use rtriplogger::db::pool::DbPool;
use rtriplogger::db::{points, shifts};
use rtriplogger::models::gps_point::GpsPoint;
use rtriplogger::models::shift::Shift;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Degrees of latitude covering roughly 300 m.
pub const STEP_300M: f64 = 0.0027;

pub const BASE_LAT: f64 = 45.5;
pub const BASE_LON: f64 = -73.6;

pub fn rti() -> Command {
    cargo_bin_cmd!("rtriplogger")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtriplogger.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Write `content` to a temp file and return its path
pub fn temp_file(name: &str, content: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rtriplogger.csv", name));
    let p = path.to_string_lossy().to_string();
    fs::write(&p, content).expect("write temp file");
    p
}

/// `init` through the CLI, as a user would.
pub fn init_db(db_path: &str) {
    rti()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

pub fn test_config(db_path: &str) -> Config {
    Config {
        database: db_path.to_string(),
        ..Config::default()
    }
}

pub fn open(db_path: &str) -> DbPool {
    DbPool::open_initialized(db_path).expect("open test db")
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

pub fn at_ms(millis: i64) -> DateTime<Utc> {
    t0() + Duration::milliseconds(millis)
}

pub fn shift(id: i64, employee: &str, start: DateTime<Utc>) -> Shift {
    Shift {
        id,
        employee_id: employee.into(),
        employee_name: format!("Employee {employee}"),
        clocked_in_at: start,
        clocked_out_at: Some(start + Duration::hours(8)),
        clock_in_lat: None,
        clock_in_lon: None,
        clock_in_accuracy: None,
        clock_out_lat: None,
        clock_out_lon: None,
        clock_out_accuracy: None,
    }
}

pub fn fix(id: &str, shift_id: i64, lat: f64, lon: f64, accuracy_m: f64, secs: i64) -> GpsPoint {
    GpsPoint {
        id: id.into(),
        shift_id,
        employee_id: "e1".into(),
        device_id: "dev-1".into(),
        latitude: lat,
        longitude: lon,
        accuracy_m,
        captured_at: at(secs),
        speed: None,
        heading: None,
        altitude: None,
        is_mocked: false,
    }
}

/// Five fixes 300 m apart every 30 s, then one more at the last spot 240 s later.
pub fn drive_then_park(shift_id: i64, prefix: &str) -> Vec<GpsPoint> {
    let mut out: Vec<GpsPoint> = (0..5)
        .map(|i| {
            fix(
                &format!("{prefix}-{i}"),
                shift_id,
                BASE_LAT + STEP_300M * i as f64,
                BASE_LON,
                5.0,
                30 * i,
            )
        })
        .collect();
    out.push(fix(
        &format!("{prefix}-5"),
        shift_id,
        BASE_LAT + STEP_300M * 4.0,
        BASE_LON,
        5.0,
        360,
    ));
    out
}

/// Store a closed shift and its points.
pub fn seed_shift(pool: &DbPool, s: &Shift, pts: &[GpsPoint]) {
    shifts::upsert_shift(&pool.conn, s).expect("store shift");
    points::insert_points(&pool.conn, pts).expect("store points");
}

pub fn points_csv(pts: &[GpsPoint]) -> String {
    let mut out = String::from(
        "id,shift_id,employee_id,device_id,latitude,longitude,accuracy_m,captured_at,speed,heading,altitude,is_mocked\n",
    );
    for p in pts {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},,,,{}\n",
            p.id,
            p.shift_id,
            p.employee_id,
            p.device_id,
            p.latitude,
            p.longitude,
            p.accuracy_m,
            p.captured_at.to_rfc3339(),
            if p.is_mocked { "true" } else { "false" }
        ));
    }
    out
}

pub fn shifts_csv(rows: &[Shift]) -> String {
    let mut out = String::from(
        "id,employee_id,employee_name,clocked_in_at,clocked_out_at,clock_in_lat,clock_in_lon,clock_in_accuracy,clock_out_lat,clock_out_lon,clock_out_accuracy\n",
    );
    let opt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
    for s in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            s.id,
            s.employee_id,
            s.employee_name,
            s.clocked_in_at.to_rfc3339(),
            s.clocked_out_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            opt(s.clock_in_lat),
            opt(s.clock_in_lon),
            opt(s.clock_in_accuracy),
            opt(s.clock_out_lat),
            opt(s.clock_out_lon),
            opt(s.clock_out_accuracy),
        ));
    }
    out
}
