use crate::db::migrate::applied_versions;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use crate::utils::date::parse_ts;
use rusqlite::OptionalExtension;
use std::fs;

const COUNTED_TABLES: &[(&str, &str)] = &[
    ("shifts", "Shifts"),
    ("gps_points", "GPS points"),
    ("trips", "Trips"),
    ("stationary_clusters", "Stops"),
    ("locations", "Locations"),
    ("location_matches", "Cached matches"),
    ("ignored_clusters", "Dismissed suggestions"),
    ("ignored_endpoints", "Dismissed endpoints"),
    ("reimbursement_rates", "Reimbursement rates"),
];

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    let versions = applied_versions(&pool.conn)?;
    println!(
        "{}• Schema:{} {} migrations (latest {})",
        CYAN,
        RESET,
        versions.len(),
        versions.last().map(String::as_str).unwrap_or("--")
    );

    //
    // 2) ROW COUNTS
    //
    for (table, label) in COUNTED_TABLES {
        let count: i64 = pool
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        println!("{}• {}:{} {}{}{}", CYAN, label, RESET, GREEN, count, RESET);
    }

    //
    // 3) CAPTURE RANGE
    //
    let first: Option<String> = pool
        .conn
        .query_row(
            "SELECT captured_at FROM gps_points ORDER BY captured_at ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let last: Option<String> = pool
        .conn
        .query_row(
            "SELECT captured_at FROM gps_points ORDER BY captured_at DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let fmt_first = first
        .clone()
        .unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last.clone().unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Capture range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 4) AVERAGE TRIP DISTANCE
    //
    let avg_km: Option<f64> = pool
        .conn
        .query_row("SELECT AVG(distance_km) FROM trips", [], |row| row.get(0))?;
    if let Some(avg) = avg_km {
        println!("{}• Average trip:{} {:.2} km", CYAN, RESET, avg);
    }

    if let (Some(f), Some(l)) = (
        first.as_deref().and_then(parse_ts),
        last.as_deref().and_then(parse_ts),
    ) {
        let days = (l - f).num_days().max(1);
        let trips: i64 = pool
            .conn
            .query_row("SELECT COUNT(*) FROM trips", [], |row| row.get(0))?;
        println!(
            "{}• Average trips/day:{} {:.2}",
            CYAN,
            RESET,
            trips as f64 / days as f64
        );
    }

    println!();
    Ok(())
}
