//! Versioned schema migrations.
//!
//! Each migration runs once; applied versions are recorded in the `log`
//! table as `migration_applied` rows.

use crate::errors::{AppError, AppResult};
use log::info;
use rusqlite::{Connection, OptionalExtension};

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250301_0001_core_schema",
        description: "Created shifts, gps_points, locations, trips, stationary_clusters",
        sql: r#"
        CREATE TABLE IF NOT EXISTS shifts (
            id                 INTEGER PRIMARY KEY,
            employee_id        TEXT NOT NULL,
            employee_name      TEXT NOT NULL DEFAULT '',
            clocked_in_at      TEXT NOT NULL,
            clocked_out_at     TEXT,
            clock_in_lat       REAL,
            clock_in_lon       REAL,
            clock_in_accuracy  REAL,
            clock_out_lat      REAL,
            clock_out_lon      REAL,
            clock_out_accuracy REAL
        );
        CREATE INDEX IF NOT EXISTS idx_shifts_employee ON shifts(employee_id, clocked_in_at);

        CREATE TABLE IF NOT EXISTS gps_points (
            id          TEXT PRIMARY KEY,
            shift_id    INTEGER NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
            employee_id TEXT NOT NULL,
            device_id   TEXT NOT NULL DEFAULT '',
            latitude    REAL NOT NULL,
            longitude   REAL NOT NULL,
            accuracy_m  REAL NOT NULL,
            captured_at TEXT NOT NULL,
            speed       REAL,
            heading     REAL,
            altitude    REAL,
            is_mocked   INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_points_shift_time ON gps_points(shift_id, captured_at);

        CREATE TABLE IF NOT EXISTS locations (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            name      TEXT NOT NULL,
            type      TEXT NOT NULL CHECK (type IN
                        ('office','building','vendor','home','gaz','cafe_restaurant','other')),
            latitude  REAL NOT NULL,
            longitude REAL NOT NULL,
            radius_m  REAL NOT NULL CHECK (radius_m > 0),
            active    INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS trips (
            id                       INTEGER PRIMARY KEY AUTOINCREMENT,
            shift_id                 INTEGER NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
            employee_id              TEXT NOT NULL,
            started_at               TEXT NOT NULL,
            ended_at                 TEXT NOT NULL,
            start_lat                REAL NOT NULL,
            start_lon                REAL NOT NULL,
            start_accuracy           REAL NOT NULL DEFAULT 0,
            end_lat                  REAL NOT NULL,
            end_lon                  REAL NOT NULL,
            end_accuracy             REAL NOT NULL DEFAULT 0,
            distance_km              REAL NOT NULL,
            road_distance_km         REAL,
            duration_minutes         INTEGER NOT NULL CHECK (duration_minutes >= 1),
            classification           TEXT NOT NULL DEFAULT 'business'
                                     CHECK (classification IN ('business','personal')),
            transport_mode           TEXT NOT NULL DEFAULT 'driving',
            carpool_role             TEXT NOT NULL DEFAULT 'solo',
            confidence_score         REAL NOT NULL,
            gps_point_count          INTEGER NOT NULL,
            low_accuracy_point_count INTEGER NOT NULL DEFAULT 0,
            has_gps_gap              INTEGER NOT NULL DEFAULT 0,
            start_location_id        INTEGER REFERENCES locations(id) ON DELETE SET NULL,
            end_location_id          INTEGER REFERENCES locations(id) ON DELETE SET NULL,
            start_match_method       TEXT NOT NULL DEFAULT 'auto'
                                     CHECK (start_match_method IN ('auto','manual')),
            end_match_method         TEXT NOT NULL DEFAULT 'auto'
                                     CHECK (end_match_method IN ('auto','manual')),
            start_address            TEXT,
            end_address              TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_trips_shift ON trips(shift_id);
        CREATE INDEX IF NOT EXISTS idx_trips_employee_time ON trips(employee_id, started_at);
        CREATE INDEX IF NOT EXISTS idx_trips_start_loc ON trips(start_location_id);
        CREATE INDEX IF NOT EXISTS idx_trips_end_loc ON trips(end_location_id);

        CREATE TABLE IF NOT EXISTS stationary_clusters (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            shift_id            INTEGER NOT NULL REFERENCES shifts(id) ON DELETE CASCADE,
            employee_id         TEXT NOT NULL,
            centroid_lat        REAL NOT NULL,
            centroid_lon        REAL NOT NULL,
            centroid_accuracy   REAL NOT NULL,
            started_at          TEXT NOT NULL,
            ended_at            TEXT NOT NULL,
            duration_seconds    INTEGER NOT NULL CHECK (duration_seconds > 0),
            gps_point_count     INTEGER NOT NULL,
            gps_gap_seconds     INTEGER NOT NULL DEFAULT 0,
            gps_gap_count       INTEGER NOT NULL DEFAULT 0,
            matched_location_id INTEGER REFERENCES locations(id) ON DELETE SET NULL
        );
        CREATE INDEX IF NOT EXISTS idx_clusters_shift ON stationary_clusters(shift_id);
        CREATE INDEX IF NOT EXISTS idx_clusters_loc ON stationary_clusters(matched_location_id);
        "#,
    },
    Migration {
        version: "20250318_0002_location_matches",
        description: "Created location_matches memo table",
        sql: r#"
        CREATE TABLE IF NOT EXISTS location_matches (
            point_id    TEXT PRIMARY KEY REFERENCES gps_points(id) ON DELETE CASCADE,
            location_id INTEGER NOT NULL REFERENCES locations(id) ON DELETE CASCADE,
            distance_m  REAL NOT NULL,
            confidence  REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_location ON location_matches(location_id);
        "#,
    },
    Migration {
        version: "20250412_0003_suggestion_ignore_lists",
        description: "Created ignored_clusters and ignored_endpoints",
        sql: r#"
        CREATE TABLE IF NOT EXISTS ignored_clusters (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            centroid_lat     REAL NOT NULL,
            centroid_lon     REAL NOT NULL,
            occurrence_count INTEGER NOT NULL,
            dismissed_at     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ignored_endpoints (
            source       TEXT NOT NULL
                         CHECK (source IN ('trip_start','trip_end','clock_in','clock_out')),
            source_id    INTEGER NOT NULL,
            dismissed_at TEXT NOT NULL,
            PRIMARY KEY (source, source_id)
        );
        "#,
    },
    Migration {
        version: "20250520_0004_mileage",
        description: "Created reimbursement_rates and company_vehicle_days",
        sql: r#"
        CREATE TABLE IF NOT EXISTS reimbursement_rates (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            rate_per_km          REAL NOT NULL CHECK (rate_per_km >= 0),
            threshold_km         REAL,
            rate_after_threshold REAL,
            effective_from       TEXT NOT NULL,
            effective_to         TEXT
        );

        CREATE TABLE IF NOT EXISTS company_vehicle_days (
            employee_id TEXT NOT NULL,
            date        TEXT NOT NULL,
            PRIMARY KEY (employee_id, date)
        );
        "#,
    },
];

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )
}

fn is_applied(conn: &Connection, version: &str) -> rusqlite::Result<bool> {
    let mut chk = conn.prepare_cached(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Public entry point: run all pending migrations. Returns how many ran.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> AppResult<usize> {
    ensure_log_table(conn)?;

    let mut applied = 0;
    for m in MIGRATIONS {
        if is_applied(conn, m.version)? {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(m.sql)
            .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;
        tx.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
            [m.version, m.description],
        )?;
        tx.commit()?;

        info!("migration applied: {}", m.version);
        applied += 1;
    }

    Ok(applied)
}

/// Versions recorded as applied, oldest first.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    ensure_log_table(conn)?;
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
