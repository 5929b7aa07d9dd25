use crate::db::db_utils::{opt_ts_col, ts_col};
use crate::errors::AppResult;
use crate::models::shift::Shift;
use crate::utils::date::to_db_ts;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn map_row(row: &Row) -> rusqlite::Result<Shift> {
    Ok(Shift {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        employee_name: row.get("employee_name")?,
        clocked_in_at: ts_col(row, "clocked_in_at")?,
        clocked_out_at: opt_ts_col(row, "clocked_out_at")?,
        clock_in_lat: row.get("clock_in_lat")?,
        clock_in_lon: row.get("clock_in_lon")?,
        clock_in_accuracy: row.get("clock_in_accuracy")?,
        clock_out_lat: row.get("clock_out_lat")?,
        clock_out_lon: row.get("clock_out_lon")?,
        clock_out_accuracy: row.get("clock_out_accuracy")?,
    })
}

/// Insert a shift or refresh its boundaries when it already exists.
pub fn upsert_shift(conn: &Connection, shift: &Shift) -> AppResult<()> {
    conn.execute(
        "INSERT INTO shifts (id, employee_id, employee_name, clocked_in_at, clocked_out_at,
                             clock_in_lat, clock_in_lon, clock_in_accuracy,
                             clock_out_lat, clock_out_lon, clock_out_accuracy)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(id) DO UPDATE SET
             employee_id = excluded.employee_id,
             employee_name = excluded.employee_name,
             clocked_in_at = excluded.clocked_in_at,
             clocked_out_at = excluded.clocked_out_at,
             clock_in_lat = excluded.clock_in_lat,
             clock_in_lon = excluded.clock_in_lon,
             clock_in_accuracy = excluded.clock_in_accuracy,
             clock_out_lat = excluded.clock_out_lat,
             clock_out_lon = excluded.clock_out_lon,
             clock_out_accuracy = excluded.clock_out_accuracy",
        params![
            shift.id,
            shift.employee_id,
            shift.employee_name,
            to_db_ts(&shift.clocked_in_at),
            shift.clocked_out_at.as_ref().map(to_db_ts),
            shift.clock_in_lat,
            shift.clock_in_lon,
            shift.clock_in_accuracy,
            shift.clock_out_lat,
            shift.clock_out_lon,
            shift.clock_out_accuracy,
        ],
    )?;
    Ok(())
}

pub fn get_shift(conn: &Connection, id: i64) -> AppResult<Option<Shift>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM shifts WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

/// Ids of all shifts that have been clocked out, oldest first.
pub fn list_closed_shift_ids(conn: &Connection) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id FROM shifts WHERE clocked_out_at IS NOT NULL ORDER BY clocked_in_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Shifts that started at or after `since`.
pub fn list_shifts_since(conn: &Connection, since: &DateTime<Utc>) -> AppResult<Vec<Shift>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM shifts WHERE clocked_in_at >= ?1 ORDER BY clocked_in_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([to_db_ts(since)], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn shift_exists(conn: &Connection, id: i64) -> AppResult<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM shifts WHERE id = ?1")?;
    Ok(stmt.exists([id])?)
}

/// Ids of every shift, oldest first.
pub fn list_shift_ids(conn: &Connection) -> AppResult<Vec<i64>> {
    let mut stmt = conn.prepare_cached("SELECT id FROM shifts ORDER BY clocked_in_at ASC, id ASC")?;
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
