use predicates::str::contains;
use rtriplogger::core::matcher::GeofenceIndex;
use rtriplogger::core::recompute::recompute_shift;
use rtriplogger::core::registry::{create_location, delete_location, set_active, update_location};
use rtriplogger::core::trip_edit::{override_endpoint, reset_endpoint};
use rtriplogger::db::pool::DbPool;
use rtriplogger::db::{clusters, matches, trips};
use rtriplogger::errors::AppError;
use rtriplogger::models::location::{Location, LocationDraft, LocationType};
use rtriplogger::models::match_method::{Endpoint, MatchMethod};
use rtriplogger::models::trip::Trip;

mod common;
use common::*;

/// Degrees of latitude covering roughly 100 m.
const STEP_100M: f64 = 0.0009;

fn parking_lat() -> f64 {
    BASE_LAT + STEP_300M * 4.0
}

fn draft(name: &str, lat: f64, radius_m: f64) -> LocationDraft {
    LocationDraft {
        name: name.into(),
        kind: LocationType::Office,
        latitude: lat,
        longitude: BASE_LON,
        radius_m,
        active: true,
    }
}

fn only_trip(pool: &DbPool) -> Trip {
    let rows = trips::load_trips_for_shift(&pool.conn, 1).unwrap();
    assert_eq!(rows.len(), 1);
    rows.into_iter().next().unwrap()
}

fn segmented(name: &str) -> (DbPool, rtriplogger::config::Config) {
    let db_path = setup_test_db(name);
    let mut pool = open(&db_path);
    let cfg = test_config(&db_path);
    seed_shift(&pool, &shift(1, "e1", at(-600)), &drive_then_park(1, "p"));
    recompute_shift(&mut pool, &cfg, 1).expect("recompute");
    (pool, cfg)
}

#[test]
fn test_new_location_claims_existing_endpoints() {
    let (mut pool, cfg) = segmented("loc_create_rematch");
    assert_eq!(only_trip(&pool).end_location_id, None);

    let (office, summary) =
        create_location(&mut pool, &cfg, &draft("Depot", parking_lat(), 50.0)).unwrap();
    assert_eq!(summary.newly_matched_end, 1);
    assert_eq!(summary.newly_matched_start, 0);
    assert_eq!(summary.stops_matched, 1);

    let trip = only_trip(&pool);
    assert_eq!(trip.end_location_id, Some(office.id));
    assert_eq!(trip.end_match_method, MatchMethod::Auto);
    assert_eq!(trip.start_location_id, None);

    let stops = clusters::load_clusters_for_shift(&pool.conn, 1).unwrap();
    assert_eq!(stops[0].matched_location_id, Some(office.id));

    // both parked fixes now sit in the memo
    let memo = matches::load_for_shift(&pool.conn, 1).unwrap();
    assert_eq!(memo.len(), 2);
    assert!(memo.iter().all(|m| m.location_id == office.id));
    assert!(matches::get_match(&pool.conn, "p-0").unwrap().is_none());
}

#[test]
fn test_wider_buffer_never_loses_a_match() {
    let site = Location {
        id: 1,
        name: "Site".into(),
        kind: LocationType::Building,
        latitude: BASE_LAT,
        longitude: BASE_LON,
        radius_m: 100.0,
        active: true,
    };
    let index = GeofenceIndex::new(vec![site]);

    // about 120 m north of the center
    let lat = BASE_LAT + STEP_100M * 1.2;
    assert_eq!(index.match_point(lat, BASE_LON, 5.0), None);

    let mut matched = false;
    for accuracy in [0.0, 5.0, 10.0, 19.0, 25.0, 40.0, 80.0, 150.0] {
        let hit = index.match_point(lat, BASE_LON, accuracy);
        if matched {
            assert_eq!(hit, Some(1), "lost the match at accuracy {accuracy}");
        }
        matched = hit.is_some();
    }
    assert!(matched);
}

#[test]
fn test_editing_a_location_leaves_manual_endpoints_alone() {
    let (mut pool, cfg) = segmented("loc_edit_manual");
    let (office, _) =
        create_location(&mut pool, &cfg, &draft("Depot", parking_lat(), 50.0)).unwrap();

    // pin the start (1.2 km away) to the depot by hand
    let trip_id = only_trip(&pool).id;
    let pinned = override_endpoint(&mut pool, trip_id, Endpoint::Start, Some(office.id)).unwrap();
    assert_eq!(pinned.start_match_method, MatchMethod::Manual);

    let moved = draft("Depot", parking_lat() + 0.1, 50.0);
    let (_, summary) = update_location(&mut pool, &cfg, office.id, &moved).unwrap();
    assert_eq!(summary.unmatched_end, 1);
    assert_eq!(summary.unmatched_start, 0);

    let trip = only_trip(&pool);
    assert_eq!(trip.start_location_id, Some(office.id));
    assert_eq!(trip.start_match_method, MatchMethod::Manual);
    assert_eq!(trip.end_location_id, None);
    assert_eq!(trip.end_match_method, MatchMethod::Auto);
}

#[test]
fn test_deleting_a_location_rematches_auto_and_keeps_manual_flag() {
    let (mut pool, cfg) = segmented("loc_delete");
    let (depot, _) =
        create_location(&mut pool, &cfg, &draft("Depot", parking_lat(), 50.0)).unwrap();
    let (yard, summary) =
        create_location(&mut pool, &cfg, &draft("Yard", parking_lat() + STEP_100M, 200.0)).unwrap();
    // the end already belongs to the closer depot
    assert_eq!(summary.newly_matched_end, 0);

    let trip_id = only_trip(&pool).id;
    override_endpoint(&mut pool, trip_id, Endpoint::Start, Some(depot.id)).unwrap();

    let summary = delete_location(&mut pool, &cfg, depot.id).unwrap();
    assert_eq!(summary.unmatched_end, 1);

    let trip = only_trip(&pool);
    assert_eq!(trip.end_location_id, Some(yard.id));
    assert_eq!(trip.end_match_method, MatchMethod::Auto);
    assert_eq!(trip.start_location_id, None);
    assert_eq!(trip.start_match_method, MatchMethod::Manual);
}

#[test]
fn test_recompute_keeps_manual_overrides() {
    let (mut pool, cfg) = segmented("loc_recompute_manual");
    let (depot, _) =
        create_location(&mut pool, &cfg, &draft("Depot", parking_lat(), 50.0)).unwrap();
    let trip_id = only_trip(&pool).id;
    override_endpoint(&mut pool, trip_id, Endpoint::Start, Some(depot.id)).unwrap();

    let outcome = recompute_shift(&mut pool, &cfg, 1).unwrap();
    assert_eq!(outcome.carried_overrides, 1);

    let trip = only_trip(&pool);
    assert_eq!(trip.start_location_id, Some(depot.id));
    assert_eq!(trip.start_match_method, MatchMethod::Manual);
    assert_eq!(trip.end_location_id, Some(depot.id));
    assert_eq!(trip.end_match_method, MatchMethod::Auto);
}

#[test]
fn test_reset_and_deactivate() {
    let (mut pool, cfg) = segmented("loc_reset_deactivate");
    let (depot, _) =
        create_location(&mut pool, &cfg, &draft("Depot", parking_lat(), 50.0)).unwrap();
    let trip_id = only_trip(&pool).id;

    override_endpoint(&mut pool, trip_id, Endpoint::End, None).unwrap();
    let trip = reset_endpoint(&mut pool, trip_id, Endpoint::End).unwrap();
    assert_eq!(trip.end_location_id, Some(depot.id));
    assert_eq!(trip.end_match_method, MatchMethod::Auto);

    let (_, summary) = set_active(&mut pool, &cfg, depot.id, false).unwrap();
    assert_eq!(summary.unmatched_end, 1);
    assert_eq!(only_trip(&pool).end_location_id, None);
}

#[test]
fn test_busy_location_can_still_be_edited() {
    let db_path = setup_test_db("loc_busy_edit");
    let mut pool = open(&db_path);
    let cfg = test_config(&db_path);
    let (office, _) = create_location(&mut pool, &cfg, &draft("Office", BASE_LAT, 100.0)).unwrap();

    // more memo rows than SQLite accepts bind variables in one statement
    let pts: Vec<_> = (0..33_000)
        .map(|i| fix(&format!("o-{i}"), 1, BASE_LAT, BASE_LON, 5.0, i))
        .collect();
    seed_shift(&pool, &shift(1, "e1", at(-600)), &pts);
    recompute_shift(&mut pool, &cfg, 1).expect("recompute");
    assert_eq!(matches::load_for_shift(&pool.conn, 1).unwrap().len(), 33_000);

    update_location(&mut pool, &cfg, office.id, &draft("Office", BASE_LAT, 150.0))
        .expect("edit busy location");
    assert_eq!(matches::load_for_shift(&pool.conn, 1).unwrap().len(), 33_000);

    set_active(&mut pool, &cfg, office.id, false).expect("deactivate busy location");
    assert!(matches::load_for_shift(&pool.conn, 1).unwrap().is_empty());
}

#[test]
fn test_invalid_locations_are_rejected() {
    let db_path = setup_test_db("loc_invalid");
    let mut pool = open(&db_path);
    let cfg = test_config(&db_path);

    let err = create_location(&mut pool, &cfg, &draft("Tiny", BASE_LAT, 1.0)).unwrap_err();
    assert!(matches!(err, AppError::InvalidRadius { .. }));

    let err = create_location(&mut pool, &cfg, &draft("Nowhere", 95.0, 50.0)).unwrap_err();
    assert!(matches!(err, AppError::InvalidCoordinate(_)));

    let err = override_endpoint(&mut pool, 42, Endpoint::Start, None).unwrap_err();
    assert!(matches!(err, AppError::TripNotFound(42)));
}

#[test]
fn test_location_cli_add_and_list() {
    let db_path = setup_test_db("loc_cli");
    init_db(&db_path);

    rti()
        .args([
            "--db", &db_path, "location", "--add", "--name", "Head Office", "--type", "office",
            "--lat", "45.5", "--lon", "-73.6", "--radius", "75",
        ])
        .assert()
        .success()
        .stdout(contains("Head Office"));

    rti()
        .args(["--db", &db_path, "location", "--list"])
        .assert()
        .success()
        .stdout(contains("Head Office"))
        .stdout(contains("office"));

    rti()
        .args([
            "--db", &db_path, "location", "--add", "--name", "Bad", "--type", "castle",
            "--lat", "45.5", "--lon", "-73.6", "--radius", "75",
        ])
        .assert()
        .failure()
        .stderr(contains("Invalid location type"));
}
