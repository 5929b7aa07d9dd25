use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::*;

/// init + shifts + points + segment through the CLI; returns the db path.
fn imported(name: &str) -> String {
    let db_path = setup_test_db(name);
    init_db(&db_path);
    let shifts_file =
        temp_file(&format!("{name}_shifts"), &shifts_csv(&[shift(1, "e1", at(-600))]));
    let points_file = temp_file(&format!("{name}_points"), &points_csv(&drive_then_park(1, "p")));
    rti()
        .args(["--db", &db_path, "import", "--shifts", &shifts_file])
        .assert()
        .success();
    rti()
        .args(["--db", &db_path, "import", "--points", &points_file])
        .assert()
        .success();
    rti()
        .args(["--db", &db_path, "segment", "--all"])
        .assert()
        .success()
        .stdout(contains("1 shifts recomputed"));
    db_path
}

#[test]
fn test_init_creates_database() {
    let db_path = setup_test_db("cli_init");
    rti()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("Database initialized"));
    assert!(std::path::Path::new(&db_path).exists());

    rti()
        .args(["--db", &db_path, "db", "--check"])
        .assert()
        .success()
        .stdout(contains("Integrity check passed"));
}

#[test]
fn test_reimport_counts_duplicates_and_bad_rows() {
    let db_path = imported("cli_reimport");

    let mut csv = points_csv(&drive_then_park(1, "p"));
    csv.push_str("bad-1,1,e1,dev-1,not-a-number,-73.6,5,2026-03-02T09:10:00Z,,,,false\n");
    csv.push_str("orphan,77,e1,dev-1,45.5,-73.6,5,2026-03-02T09:10:00Z,,,,false\n");
    let file = temp_file("cli_reimport_again", &csv);

    rti()
        .args(["--db", &db_path, "import", "--points", &file])
        .assert()
        .success()
        .stdout(contains("0 inserted, 6 duplicates, 2 errors"))
        .stdout(contains("orphan"));
}

#[test]
fn test_list_trips_and_stops_tables() {
    let db_path = imported("cli_list");

    rti()
        .args(["--db", &db_path, "list", "--shift", "1"])
        .assert()
        .success()
        .stdout(contains("1.56 km"));

    rti()
        .args(["--db", &db_path, "list", "--shift", "1", "--stops"])
        .assert()
        .success()
        .stdout(contains("CENTROID"));

    rti()
        .args(["--db", &db_path, "list", "--shift", "9"])
        .assert()
        .failure()
        .stderr(contains("Shift 9 not found"));
}

#[test]
fn test_trip_override_and_annotation() {
    let db_path = imported("cli_trip_edit");

    rti()
        .args([
            "--db", &db_path, "location", "--add", "--name", "Depot", "--type", "building",
            "--lat", "45.5108", "--lon", "-73.6", "--radius", "50",
        ])
        .assert()
        .success()
        .stdout(contains("ends +1"));

    rti()
        .args([
            "--db", &db_path, "trip", "1", "--start-location", "1", "--classify", "personal",
            "--road-km", "1.8",
        ])
        .assert()
        .success()
        .stdout(contains("Trip 1 updated"))
        .stdout(contains("[manual]"))
        .stdout(contains("personal"));

    rti()
        .args(["--db", &db_path, "trip", "1", "--json"])
        .assert()
        .success()
        .stdout(contains("\"road_distance_km\": 1.8"))
        .stdout(contains("\"start_match_method\": \"manual\""));

    rti()
        .args(["--db", &db_path, "trip", "1", "--reset-start"])
        .assert()
        .success()
        .stdout(contains("start -- [auto]"));

    rti()
        .args(["--db", &db_path, "trip", "1", "--mode", "teleport"])
        .assert()
        .failure()
        .stderr(contains("transport mode"));

    rti()
        .args(["--db", &db_path, "log", "--print"])
        .assert()
        .success()
        .stdout(contains("override").and(contains("recompute")));
}

#[test]
fn test_db_info_and_rebuild_matches() {
    let db_path = imported("cli_db_info");

    rti()
        .args(["--db", &db_path, "db", "--info"])
        .assert()
        .success()
        .stdout(contains("Trips"));

    rti()
        .args(["--db", &db_path, "db", "--rebuild-matches"])
        .assert()
        .success()
        .stdout(contains("0 points matched"));
}

#[test]
fn test_segment_requires_a_target() {
    let db_path = setup_test_db("cli_segment_target");
    init_db(&db_path);
    rti()
        .args(["--db", &db_path, "segment"])
        .assert()
        .failure()
        .stderr(contains("--shift ID or --all"));
}
