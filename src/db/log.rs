use crate::errors::AppResult;
use chrono::Utc;
use log::debug;
use rusqlite::Connection;
use rusqlite::params;

/// Write an internal audit line into the `log` table.
pub fn ttlog(conn: &Connection, operation: &str, target: &str, message: &str) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, ?2, ?3, ?4)",
    )?;

    stmt.execute(params![now, operation, target, message])?;
    debug!("audit {operation} ({target}): {message}");

    Ok(())
}

/// A row of the `log` table.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

pub fn load_log(conn: &Connection) -> AppResult<Vec<LogEntry>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, date, operation, COALESCE(target, '') AS target, message
         FROM log ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(LogEntry {
            id: row.get("id")?,
            date: row.get("date")?,
            operation: row.get("operation")?,
            target: row.get("target")?,
            message: row.get("message")?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
