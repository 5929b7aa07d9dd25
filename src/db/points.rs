use crate::db::db_utils::ts_col;
use crate::db::shifts::shift_exists;
use crate::errors::AppResult;
use crate::models::gps_point::{GpsPoint, IngestReport};
use crate::utils::date::to_db_ts;
use log::{debug, warn};
use rusqlite::{Connection, Row, params};

pub fn map_row(row: &Row) -> rusqlite::Result<GpsPoint> {
    Ok(GpsPoint {
        id: row.get("id")?,
        shift_id: row.get("shift_id")?,
        employee_id: row.get("employee_id")?,
        device_id: row.get("device_id")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        accuracy_m: row.get("accuracy_m")?,
        captured_at: ts_col(row, "captured_at")?,
        speed: row.get("speed")?,
        heading: row.get("heading")?,
        altitude: row.get("altitude")?,
        is_mocked: row.get::<_, i64>("is_mocked")? != 0,
    })
}

/// Store a batch of points, de-duplicating on the client id.
///
/// Points with unusable coordinates or an unknown shift are counted as
/// errors and reported in `failed_ids`; they never abort the batch.
pub fn insert_points(conn: &Connection, points: &[GpsPoint]) -> AppResult<IngestReport> {
    let tx = conn.unchecked_transaction()?;
    let mut report = IngestReport::default();

    {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO gps_points
                (id, shift_id, employee_id, device_id, latitude, longitude, accuracy_m,
                 captured_at, speed, heading, altitude, is_mocked)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )?;

        for p in points {
            if p.id.trim().is_empty() || !p.is_valid() || !shift_exists(&tx, p.shift_id)? {
                warn!("rejected point {:?} for shift {}", p.id, p.shift_id);
                report.errors += 1;
                report.failed_ids.push(p.id.clone());
                continue;
            }

            let changed = stmt.execute(params![
                p.id,
                p.shift_id,
                p.employee_id,
                p.device_id,
                p.latitude,
                p.longitude,
                p.accuracy_m,
                to_db_ts(&p.captured_at),
                p.speed,
                p.heading,
                p.altitude,
                p.is_mocked as i64,
            ])?;

            if changed == 0 {
                report.duplicates += 1;
            } else {
                report.inserted += 1;
            }
        }
    }

    tx.commit()?;
    debug!(
        "ingested {} points ({} duplicates, {} errors)",
        report.inserted, report.duplicates, report.errors
    );
    Ok(report)
}

/// All points of a shift in capture order (ties broken by id).
pub fn load_points_for_shift(conn: &Connection, shift_id: i64) -> AppResult<Vec<GpsPoint>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM gps_points WHERE shift_id = ?1 ORDER BY captured_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([shift_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Points whose memo row currently points at `location_id`, in capture order.
pub fn load_points_matched_to(conn: &Connection, location_id: i64) -> AppResult<Vec<GpsPoint>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM gps_points
         WHERE id IN (SELECT point_id FROM location_matches WHERE location_id = ?1)
         ORDER BY captured_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([location_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Points whose coordinates fall inside the given box.
pub fn load_points_in_box(
    conn: &Connection,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
) -> AppResult<Vec<GpsPoint>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM gps_points
         WHERE latitude BETWEEN ?1 AND ?2 AND longitude BETWEEN ?3 AND ?4
         ORDER BY captured_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![min_lat, max_lat, min_lon, max_lon], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
