use crate::errors::AppResult;
use crate::models::location_match::LocationMatch;
use rusqlite::{Connection, OptionalExtension, Row, params};

fn map_row(row: &Row) -> rusqlite::Result<LocationMatch> {
    Ok(LocationMatch {
        point_id: row.get("point_id")?,
        location_id: row.get("location_id")?,
        distance_m: row.get("distance_m")?,
        confidence: row.get("confidence")?,
    })
}

/// Drop the memo rows of every point in a shift.
pub fn delete_for_shift(conn: &Connection, shift_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM location_matches
         WHERE point_id IN (SELECT id FROM gps_points WHERE shift_id = ?1)",
        [shift_id],
    )?)
}

/// Drop the whole memo (after any registry change).
pub fn delete_all(conn: &Connection) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM location_matches", [])?)
}

pub fn upsert_match(conn: &Connection, m: &LocationMatch) -> AppResult<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO location_matches (point_id, location_id, distance_m, confidence)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(point_id) DO UPDATE SET
             location_id = excluded.location_id,
             distance_m = excluded.distance_m,
             confidence = excluded.confidence",
    )?;
    stmt.execute(params![m.point_id, m.location_id, m.distance_m, m.confidence])?;
    Ok(())
}

pub fn get_match(conn: &Connection, point_id: &str) -> AppResult<Option<LocationMatch>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM location_matches WHERE point_id = ?1")?;
    Ok(stmt.query_row([point_id], map_row).optional()?)
}

pub fn load_for_shift(conn: &Connection, shift_id: i64) -> AppResult<Vec<LocationMatch>> {
    let mut stmt = conn.prepare_cached(
        "SELECT m.* FROM location_matches m
         JOIN gps_points p ON p.id = m.point_id
         WHERE p.shift_id = ?1
         ORDER BY p.captured_at ASC, p.id ASC",
    )?;
    let rows = stmt.query_map([shift_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn delete_match(conn: &Connection, point_id: &str) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM location_matches WHERE point_id = ?1",
        [point_id],
    )?)
}
