use crate::db::db_utils::{enum_col, ts_col};
use crate::errors::AppResult;
use crate::models::ignored::{EndpointSource, IgnoredCluster, IgnoredEndpoint};
use crate::utils::date::to_db_ts;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};
use std::collections::HashSet;

fn map_cluster(row: &Row) -> rusqlite::Result<IgnoredCluster> {
    Ok(IgnoredCluster {
        id: row.get("id")?,
        centroid_lat: row.get("centroid_lat")?,
        centroid_lon: row.get("centroid_lon")?,
        occurrence_count: row.get("occurrence_count")?,
        dismissed_at: ts_col(row, "dismissed_at")?,
    })
}

fn map_endpoint(row: &Row) -> rusqlite::Result<IgnoredEndpoint> {
    Ok(IgnoredEndpoint {
        source: enum_col(row, "source", EndpointSource::from_db_str)?,
        source_id: row.get("source_id")?,
        dismissed_at: ts_col(row, "dismissed_at")?,
    })
}

pub fn insert_ignored_cluster(
    conn: &Connection,
    lat: f64,
    lon: f64,
    occurrence_count: i64,
    at: &DateTime<Utc>,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO ignored_clusters (centroid_lat, centroid_lon, occurrence_count, dismissed_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![lat, lon, occurrence_count, to_db_ts(at)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_ignored_clusters(conn: &Connection) -> AppResult<Vec<IgnoredCluster>> {
    let mut stmt = conn.prepare_cached("SELECT * FROM ignored_clusters ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_cluster)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn delete_ignored_cluster(conn: &Connection, id: i64) -> AppResult<usize> {
    Ok(conn.execute("DELETE FROM ignored_clusters WHERE id = ?1", [id])?)
}

pub fn insert_ignored_endpoint(
    conn: &Connection,
    source: EndpointSource,
    source_id: i64,
    at: &DateTime<Utc>,
) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO ignored_endpoints (source, source_id, dismissed_at)
         VALUES (?1, ?2, ?3)",
        params![source.to_db_str(), source_id, to_db_ts(at)],
    )?;
    Ok(())
}

pub fn list_ignored_endpoints(conn: &Connection) -> AppResult<Vec<IgnoredEndpoint>> {
    let mut stmt =
        conn.prepare_cached("SELECT * FROM ignored_endpoints ORDER BY source ASC, source_id ASC")?;
    let rows = stmt.query_map([], map_endpoint)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Dismissed endpoints as a lookup set.
pub fn ignored_endpoint_keys(conn: &Connection) -> AppResult<HashSet<(EndpointSource, i64)>> {
    Ok(list_ignored_endpoints(conn)?
        .into_iter()
        .map(|e| (e.source, e.source_id))
        .collect())
}
