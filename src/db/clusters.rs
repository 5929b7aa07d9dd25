use crate::db::db_utils::ts_col;
use crate::errors::AppResult;
use crate::models::stationary_cluster::StationaryCluster;
use crate::utils::date::to_db_ts;
use rusqlite::{Connection, Row, params};

pub fn map_row(row: &Row) -> rusqlite::Result<StationaryCluster> {
    Ok(StationaryCluster {
        id: row.get("id")?,
        shift_id: row.get("shift_id")?,
        employee_id: row.get("employee_id")?,
        centroid_lat: row.get("centroid_lat")?,
        centroid_lon: row.get("centroid_lon")?,
        centroid_accuracy: row.get("centroid_accuracy")?,
        started_at: ts_col(row, "started_at")?,
        ended_at: ts_col(row, "ended_at")?,
        duration_seconds: row.get("duration_seconds")?,
        gps_point_count: row.get("gps_point_count")?,
        gps_gap_seconds: row.get("gps_gap_seconds")?,
        gps_gap_count: row.get("gps_gap_count")?,
        matched_location_id: row.get("matched_location_id")?,
    })
}

pub fn insert_cluster(conn: &Connection, c: &StationaryCluster) -> AppResult<i64> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO stationary_clusters (
            shift_id, employee_id, centroid_lat, centroid_lon, centroid_accuracy,
            started_at, ended_at, duration_seconds, gps_point_count,
            gps_gap_seconds, gps_gap_count, matched_location_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
    )?;
    stmt.execute(params![
        c.shift_id,
        c.employee_id,
        c.centroid_lat,
        c.centroid_lon,
        c.centroid_accuracy,
        to_db_ts(&c.started_at),
        to_db_ts(&c.ended_at),
        c.duration_seconds,
        c.gps_point_count,
        c.gps_gap_seconds,
        c.gps_gap_count,
        c.matched_location_id,
    ])?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_clusters_for_shift(conn: &Connection, shift_id: i64) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM stationary_clusters WHERE shift_id = ?1",
        [shift_id],
    )?)
}

pub fn load_clusters_for_shift(
    conn: &Connection,
    shift_id: i64,
) -> AppResult<Vec<StationaryCluster>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM stationary_clusters WHERE shift_id = ?1 ORDER BY started_at ASC, id ASC",
    )?;
    let rows = stmt.query_map([shift_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn load_matched_to(conn: &Connection, location_id: i64) -> AppResult<Vec<StationaryCluster>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM stationary_clusters WHERE matched_location_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([location_id], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn load_unmatched_in_box(
    conn: &Connection,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
) -> AppResult<Vec<StationaryCluster>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM stationary_clusters
         WHERE matched_location_id IS NULL
           AND centroid_lat BETWEEN ?1 AND ?2 AND centroid_lon BETWEEN ?3 AND ?4
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![min_lat, max_lat, min_lon, max_lon], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn set_matched_location(
    conn: &Connection,
    cluster_id: i64,
    location_id: Option<i64>,
) -> AppResult<usize> {
    Ok(conn.execute(
        "UPDATE stationary_clusters SET matched_location_id = ?1 WHERE id = ?2",
        params![location_id, cluster_id],
    )?)
}
