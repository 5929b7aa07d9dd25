use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::trip_edit::{TripAnnotation, annotate_trip, override_endpoint, reset_endpoint};
use crate::db::pool::DbPool;
use crate::db::trips;
use crate::errors::{AppError, AppResult};
use crate::models::match_method::Endpoint;
use crate::models::trip::{CarpoolRole, Classification, TransportMode, Trip};
use crate::ui::messages::success;
use crate::utils::formatting::{km, location_ref};

fn parse_with<T>(
    raw: &Option<String>,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
) -> AppResult<Option<T>> {
    match raw {
        None => Ok(None),
        Some(s) => parse(s).map(Some).ok_or_else(|| AppError::InvalidValue {
            field,
            value: s.clone(),
        }),
    }
}

fn print_trip(t: &Trip) {
    println!("Trip {} (shift {}, {})", t.id, t.shift_id, t.employee_id);
    println!("  {} → {}", t.started_at.to_rfc3339(), t.ended_at.to_rfc3339());
    println!(
        "  distance {} (road {}), {} min, confidence {:.2}",
        km(t.distance_km),
        t.road_distance_km.map(km).unwrap_or_else(|| "--".into()),
        t.duration_minutes,
        t.confidence_score
    );
    println!(
        "  start {} [{}]  end {} [{}]",
        location_ref(t.start_location_id),
        t.start_match_method.to_db_str(),
        location_ref(t.end_location_id),
        t.end_match_method.to_db_str()
    );
    println!(
        "  {} / {} / {}",
        t.classification.to_db_str(),
        t.transport_mode.to_db_str(),
        t.carpool_role.to_db_str()
    );
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Trip {
        id,
        start_location,
        end_location,
        clear_start,
        clear_end,
        reset_start,
        reset_end,
        classify,
        mode,
        carpool,
        road_km,
        start_address,
        end_address,
        json,
    } = cmd
    {
        let mut pool = DbPool::open_initialized(&cfg.database)?;

        let overrides = [
            (Endpoint::Start, *start_location, *clear_start, *reset_start),
            (Endpoint::End, *end_location, *clear_end, *reset_end),
        ];
        for (endpoint, location, clear, reset) in overrides {
            if reset {
                reset_endpoint(&mut pool, *id, endpoint)?;
            } else if location.is_some() || clear {
                override_endpoint(&mut pool, *id, endpoint, location)?;
            }
        }

        let ann = TripAnnotation {
            classification: parse_with(classify, "classification", Classification::from_db_str)?,
            transport_mode: parse_with(mode, "transport mode", TransportMode::from_db_str)?,
            carpool_role: parse_with(carpool, "carpool role", CarpoolRole::from_db_str)?,
            road_distance_km: *road_km,
            start_address: start_address.clone(),
            end_address: end_address.clone(),
        };
        if !ann.is_empty() {
            annotate_trip(&mut pool, *id, &ann)?;
            success(format!("Trip {id} updated"));
        }

        let trip = trips::load_trip(&pool.conn, *id)?.ok_or(AppError::TripNotFound(*id))?;
        if *json {
            println!("{}", serde_json::to_string_pretty(&trip)?);
        } else {
            print_trip(&trip);
        }
    }

    Ok(())
}
