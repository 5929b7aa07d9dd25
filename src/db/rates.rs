use crate::db::db_utils::{date_col, opt_date_col};
use crate::errors::AppResult;
use crate::models::reimbursement_rate::ReimbursementRate;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::collections::HashSet;

const DATE_FMT: &str = "%Y-%m-%d";

fn map_row(row: &Row) -> rusqlite::Result<ReimbursementRate> {
    Ok(ReimbursementRate {
        id: row.get("id")?,
        rate_per_km: row.get("rate_per_km")?,
        threshold_km: row.get("threshold_km")?,
        rate_after_threshold: row.get("rate_after_threshold")?,
        effective_from: date_col(row, "effective_from")?,
        effective_to: opt_date_col(row, "effective_to")?,
    })
}

pub fn insert_rate(conn: &Connection, r: &ReimbursementRate) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO reimbursement_rates
            (rate_per_km, threshold_km, rate_after_threshold, effective_from, effective_to)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            r.rate_per_km,
            r.threshold_km,
            r.rate_after_threshold,
            r.effective_from.format(DATE_FMT).to_string(),
            r.effective_to.map(|d| d.format(DATE_FMT).to_string()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_rates(conn: &Connection) -> AppResult<Vec<ReimbursementRate>> {
    let mut stmt = conn
        .prepare_cached("SELECT * FROM reimbursement_rates ORDER BY effective_from ASC, id ASC")?;
    let rows = stmt.query_map([], map_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// The rate in force on `date` (latest `effective_from` wins on overlap).
pub fn rate_effective_on(
    conn: &Connection,
    date: NaiveDate,
) -> AppResult<Option<ReimbursementRate>> {
    let d = date.format(DATE_FMT).to_string();
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM reimbursement_rates
         WHERE effective_from <= ?1 AND (effective_to IS NULL OR effective_to >= ?1)
         ORDER BY effective_from DESC, id DESC
         LIMIT 1",
    )?;
    Ok(stmt.query_row([d], map_row).optional()?)
}

/// The most recent rate by `effective_from`, whatever its validity window.
pub fn latest_rate(conn: &Connection) -> AppResult<Option<ReimbursementRate>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM reimbursement_rates ORDER BY effective_from DESC, id DESC LIMIT 1",
    )?;
    Ok(stmt.query_row([], map_row).optional()?)
}

pub fn add_company_vehicle_day(
    conn: &Connection,
    employee_id: &str,
    date: NaiveDate,
) -> AppResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO company_vehicle_days (employee_id, date) VALUES (?1, ?2)",
        params![employee_id, date.format(DATE_FMT).to_string()],
    )?;
    Ok(())
}

/// Days in `[from, to]` on which the employee used a company vehicle.
pub fn company_vehicle_days(
    conn: &Connection,
    employee_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<HashSet<NaiveDate>> {
    let mut stmt = conn.prepare_cached(
        "SELECT date FROM company_vehicle_days
         WHERE employee_id = ?1 AND date >= ?2 AND date <= ?3",
    )?;
    let rows = stmt.query_map(
        params![
            employee_id,
            from.format(DATE_FMT).to_string(),
            to.format(DATE_FMT).to_string()
        ],
        |row| date_col(row, "date"),
    )?;
    Ok(rows.collect::<Result<HashSet<_>, _>>()?)
}
