use crate::db::db_utils::{enum_col, ts_col};
use crate::errors::AppResult;
use crate::models::match_method::{Endpoint, MatchMethod};
use crate::models::trip::{CarpoolRole, Classification, TransportMode, Trip};
use crate::utils::date::to_db_ts;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn map_row(row: &Row) -> rusqlite::Result<Trip> {
    Ok(Trip {
        id: row.get("id")?,
        shift_id: row.get("shift_id")?,
        employee_id: row.get("employee_id")?,
        started_at: ts_col(row, "started_at")?,
        ended_at: ts_col(row, "ended_at")?,
        start_lat: row.get("start_lat")?,
        start_lon: row.get("start_lon")?,
        start_accuracy: row.get("start_accuracy")?,
        end_lat: row.get("end_lat")?,
        end_lon: row.get("end_lon")?,
        end_accuracy: row.get("end_accuracy")?,
        distance_km: row.get("distance_km")?,
        road_distance_km: row.get("road_distance_km")?,
        duration_minutes: row.get("duration_minutes")?,
        classification: enum_col(row, "classification", Classification::from_db_str)?,
        transport_mode: enum_col(row, "transport_mode", TransportMode::from_db_str)?,
        carpool_role: enum_col(row, "carpool_role", CarpoolRole::from_db_str)?,
        confidence_score: row.get("confidence_score")?,
        gps_point_count: row.get("gps_point_count")?,
        low_accuracy_point_count: row.get("low_accuracy_point_count")?,
        has_gps_gap: row.get::<_, i64>("has_gps_gap")? != 0,
        start_location_id: row.get("start_location_id")?,
        end_location_id: row.get("end_location_id")?,
        start_match_method: enum_col(row, "start_match_method", MatchMethod::from_db_str)?,
        end_match_method: enum_col(row, "end_match_method", MatchMethod::from_db_str)?,
        start_address: row.get("start_address")?,
        end_address: row.get("end_address")?,
    })
}

/// Insert a trip and return its new id (the `id` field is ignored).
pub fn insert_trip(conn: &Connection, t: &Trip) -> AppResult<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO trips (
            shift_id, employee_id, started_at, ended_at,
            start_lat, start_lon, start_accuracy, end_lat, end_lon, end_accuracy,
            distance_km, road_distance_km, duration_minutes,
            classification, transport_mode, carpool_role,
            confidence_score, gps_point_count, low_accuracy_point_count, has_gps_gap,
            start_location_id, end_location_id, start_match_method, end_match_method,
            start_address, end_address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                 ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26)",
    )?;
    stmt.execute(params![
        t.shift_id,
        t.employee_id,
        to_db_ts(&t.started_at),
        to_db_ts(&t.ended_at),
        t.start_lat,
        t.start_lon,
        t.start_accuracy,
        t.end_lat,
        t.end_lon,
        t.end_accuracy,
        t.distance_km,
        t.road_distance_km,
        t.duration_minutes,
        t.classification.to_db_str(),
        t.transport_mode.to_db_str(),
        t.carpool_role.to_db_str(),
        t.confidence_score,
        t.gps_point_count,
        t.low_accuracy_point_count,
        t.has_gps_gap as i64,
        t.start_location_id,
        t.end_location_id,
        t.start_match_method.to_db_str(),
        t.end_match_method.to_db_str(),
        t.start_address,
        t.end_address,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Delete all trips derived for a shift. Returns number of rows deleted.
pub fn delete_trips_for_shift(conn: &Connection, shift_id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM trips WHERE shift_id = ?1", [shift_id])?)
}

pub fn load_trips_for_shift(conn: &Connection, shift_id: i64) -> AppResult<Vec<Trip>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM trips WHERE shift_id = ?1 ORDER BY started_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([shift_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn load_trip(conn: &Connection, id: i64) -> AppResult<Option<Trip>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM trips WHERE id = ?1")?;
    Ok(stmt.query_row([id], map_row).optional()?)
}

/// Trips of one employee that started in `[from, to)`.
pub fn load_trips_for_employee(
    conn: &Connection,
    employee_id: &str,
    from: &str,
    to: &str,
) -> AppResult<Vec<Trip>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM trips
         WHERE employee_id = ?1 AND started_at >= ?2 AND started_at < ?3
         ORDER BY started_at ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![employee_id, from, to], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Trips (all employees) that started at or after `since`.
pub fn load_trips_since(conn: &Connection, since: &DateTime<Utc>) -> AppResult<Vec<Trip>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM trips WHERE started_at >= ?1 ORDER BY started_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([to_db_ts(since)], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Auto-matched endpoints currently attached to `location_id`.
pub fn load_auto_matched(
    conn: &Connection,
    endpoint: Endpoint,
    location_id: i64,
) -> AppResult<Vec<Trip>> {
    let sql = format!(
        "SELECT * FROM trips WHERE {loc} = ?1 AND {method} = 'auto' ORDER BY id ASC",
        loc = endpoint.location_column(),
        method = endpoint.method_column(),
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([location_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Auto endpoints without a location whose coordinates fall inside the box.
pub fn load_unmatched_in_box(
    conn: &Connection,
    endpoint: Endpoint,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
) -> AppResult<Vec<Trip>> {
    let (lat, lon) = match endpoint {
        Endpoint::Start => ("start_lat", "start_lon"),
        Endpoint::End => ("end_lat", "end_lon"),
    };
    let sql = format!(
        "SELECT * FROM trips
         WHERE {loc} IS NULL AND {method} = 'auto'
           AND {lat} BETWEEN ?1 AND ?2 AND {lon} BETWEEN ?3 AND ?4
         ORDER BY id ASC",
        loc = endpoint.location_column(),
        method = endpoint.method_column(),
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![min_lat, max_lat, min_lon, max_lon], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Set an endpoint's location and how it was matched.
pub fn set_endpoint_location(
    conn: &Connection,
    trip_id: i64,
    endpoint: Endpoint,
    location_id: Option<i64>,
    method: MatchMethod,
) -> AppResult<usize> {
    let sql = format!(
        "UPDATE trips SET {loc} = ?1, {method} = ?2 WHERE id = ?3",
        loc = endpoint.location_column(),
        method = endpoint.method_column(),
    );
    Ok(conn.execute(&sql, params![location_id, method.to_db_str(), trip_id])?)
}

/// Update the fields downstream collaborators own.
pub fn update_annotations(conn: &Connection, t: &Trip) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE trips SET classification = ?1, transport_mode = ?2, carpool_role = ?3,
                          road_distance_km = ?4, start_address = ?5, end_address = ?6
         WHERE id = ?7",
        params![
            t.classification.to_db_str(),
            t.transport_mode.to_db_str(),
            t.carpool_role.to_db_str(),
            t.road_distance_km,
            t.start_address,
            t.end_address,
            t.id,
        ],
    )?)
}

/// Manually-matched endpoints that reference `location_id`.
pub fn count_manual_refs(conn: &Connection, location_id: i64) -> AppResult<i64> {
    Ok(conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM trips WHERE start_location_id = ?1 AND start_match_method = 'manual')
          + (SELECT COUNT(*) FROM trips WHERE end_location_id = ?1 AND end_match_method = 'manual')",
        [location_id],
        |row| row.get(0),
    )?)
}
