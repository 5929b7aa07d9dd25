//! CSV loaders standing in for the upload transport and the time-tracking feed.
//!
//! Points: `id,shift_id,employee_id,device_id,latitude,longitude,accuracy_m,
//! captured_at,speed,heading,altitude,is_mocked` (optional columns may be empty).
//! Shifts: `id,employee_id,employee_name,clocked_in_at,clocked_out_at,
//! clock_in_lat,clock_in_lon,clock_in_accuracy,clock_out_lat,clock_out_lon,
//! clock_out_accuracy`.

use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::{points, shifts};
use crate::errors::{AppError, AppResult};
use crate::models::gps_point::{GpsPoint, IngestReport};
use crate::models::shift::Shift;
use crate::utils::date::parse_ts;
use log::warn;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct PointRecord {
    id: String,
    shift_id: i64,
    employee_id: String,
    #[serde(default)]
    device_id: String,
    latitude: f64,
    longitude: f64,
    accuracy_m: f64,
    captured_at: String,
    #[serde(default)]
    speed: Option<f64>,
    #[serde(default)]
    heading: Option<f64>,
    #[serde(default)]
    altitude: Option<f64>,
    #[serde(default)]
    is_mocked: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ShiftRecord {
    id: i64,
    employee_id: String,
    #[serde(default)]
    employee_name: String,
    clocked_in_at: String,
    #[serde(default)]
    clocked_out_at: Option<String>,
    #[serde(default)]
    clock_in_lat: Option<f64>,
    #[serde(default)]
    clock_in_lon: Option<f64>,
    #[serde(default)]
    clock_in_accuracy: Option<f64>,
    #[serde(default)]
    clock_out_lat: Option<f64>,
    #[serde(default)]
    clock_out_lon: Option<f64>,
    #[serde(default)]
    clock_out_accuracy: Option<f64>,
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "y")
    )
}

fn required_ts(field: &'static str, raw: &str) -> AppResult<chrono::DateTime<chrono::Utc>> {
    parse_ts(raw).ok_or_else(|| AppError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}

impl PointRecord {
    fn into_point(self) -> AppResult<GpsPoint> {
        Ok(GpsPoint {
            captured_at: required_ts("captured_at", &self.captured_at)?,
            is_mocked: parse_flag(self.is_mocked.as_deref()),
            id: self.id,
            shift_id: self.shift_id,
            employee_id: self.employee_id,
            device_id: self.device_id,
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy_m: self.accuracy_m,
            speed: self.speed,
            heading: self.heading,
            altitude: self.altitude,
        })
    }
}

impl ShiftRecord {
    fn into_shift(self) -> AppResult<Shift> {
        let clocked_out_at = match self.clocked_out_at.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(required_ts("clocked_out_at", raw)?),
        };
        Ok(Shift {
            id: self.id,
            clocked_in_at: required_ts("clocked_in_at", &self.clocked_in_at)?,
            clocked_out_at,
            employee_id: self.employee_id,
            employee_name: self.employee_name,
            clock_in_lat: self.clock_in_lat,
            clock_in_lon: self.clock_in_lon,
            clock_in_accuracy: self.clock_in_accuracy,
            clock_out_lat: self.clock_out_lat,
            clock_out_lon: self.clock_out_lon,
            clock_out_accuracy: self.clock_out_accuracy,
        })
    }
}

/// Load a point batch. Rows that cannot be parsed are reported alongside the
/// store's own rejects; they never abort the batch.
pub fn import_points<R: Read>(pool: &mut DbPool, reader: R) -> AppResult<IngestReport> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut batch = Vec::new();
    let mut unreadable = Vec::new();

    for (line, record) in rdr.deserialize::<PointRecord>().enumerate() {
        match record.map_err(AppError::from).and_then(PointRecord::into_point) {
            Ok(p) => batch.push(p),
            Err(e) => {
                warn!("points row {}: {e}", line + 2);
                unreadable.push(format!("row {}", line + 2));
            }
        }
    }

    let mut report = points::insert_points(&pool.conn, &batch)?;
    report.errors += unreadable.len();
    report.failed_ids.extend(unreadable);

    ttlog(
        &pool.conn,
        "import",
        "points",
        &format!(
            "{} inserted, {} duplicates, {} errors",
            report.inserted, report.duplicates, report.errors
        ),
    )?;
    Ok(report)
}

/// Load shift boundaries (insert or refresh). Returns the number of shifts stored.
pub fn import_shifts<R: Read>(pool: &mut DbPool, reader: R) -> AppResult<usize> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let parsed = rdr
        .deserialize::<ShiftRecord>()
        .map(|r| r.map_err(AppError::from).and_then(ShiftRecord::into_shift))
        .collect::<AppResult<Vec<Shift>>>()?;

    pool.with_transaction(|tx| {
        for shift in &parsed {
            shifts::upsert_shift(tx, shift)?;
        }
        ttlog(tx, "import", "shifts", &format!("{} shifts stored", parsed.len()))?;
        Ok(parsed.len())
    })
}
