use crate::db::db_utils::enum_col;
use crate::errors::AppResult;
use crate::models::location::{Location, LocationDraft, LocationType};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn map_row(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get("id")?,
        name: row.get("name")?,
        kind: enum_col(row, "type", LocationType::from_db_str)?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        radius_m: row.get("radius_m")?,
        active: row.get::<_, i64>("active")? != 0,
    })
}

pub fn insert_location(conn: &Connection, d: &LocationDraft) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO locations (name, type, latitude, longitude, radius_m, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            d.name,
            d.kind.to_db_str(),
            d.latitude,
            d.longitude,
            d.radius_m,
            d.active as i64
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_location(conn: &Connection, id: i64, d: &LocationDraft) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE locations
         SET name = ?1, type = ?2, latitude = ?3, longitude = ?4, radius_m = ?5, active = ?6
         WHERE id = ?7",
        params![
            d.name,
            d.kind.to_db_str(),
            d.latitude,
            d.longitude,
            d.radius_m,
            d.active as i64,
            id
        ],
    )?)
}

/// Delete a location; trip and stop references are nulled by the schema.
pub fn delete_location(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM locations WHERE id = ?1", [id])?)
}

pub fn get_location(conn: &Connection, id: i64) -> AppResult<Option<Location>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM locations WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

pub fn list_locations(conn: &Connection, active_only: bool) -> AppResult<Vec<Location>> {
    let sql = if active_only {
        "SELECT * FROM locations WHERE active = 1 ORDER BY id ASC"
    } else {
        "SELECT * FROM locations ORDER BY id ASC"
    };
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map([], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
