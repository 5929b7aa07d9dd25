use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::timeline::{Segment, StopClass, Timeline, build_timeline};
use crate::db::pool::DbPool;
use crate::db::{clusters, shifts, trips};
use crate::errors::{AppError, AppResult};
use crate::models::stationary_cluster::StationaryCluster;
use crate::models::trip::Trip;
use crate::ui::messages::{header, info};
use crate::utils::colors::{GREY, RESET, YELLOW, color_for_confidence, colorize_optional};
use crate::utils::formatting::{km, location_ref, mins2readable, secs2readable};
use crate::utils::table::Table;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List {
        shift,
        stops,
        timeline,
        json,
    } = cmd
    {
        let pool = DbPool::open_initialized(&cfg.database)?;
        let s = shifts::get_shift(&pool.conn, *shift)?.ok_or(AppError::ShiftNotFound(*shift))?;

        let trip_rows = trips::load_trips_for_shift(&pool.conn, s.id)?;
        let stop_rows = clusters::load_clusters_for_shift(&pool.conn, s.id)?;

        if *timeline {
            let tl = build_timeline(&trip_rows, &stop_rows);
            if *json {
                println!("{}", serde_json::to_string_pretty(&tl)?);
            } else {
                header(format!("Shift {} · {}", s.id, s.display_name()));
                print_timeline(&tl);
            }
        } else if *stops {
            if *json {
                println!("{}", serde_json::to_string_pretty(&stop_rows)?);
            } else {
                header(format!("Shift {} · {} · stops", s.id, s.display_name()));
                print_stops(&stop_rows);
            }
        } else if *json {
            println!("{}", serde_json::to_string_pretty(&trip_rows)?);
        } else {
            header(format!("Shift {} · {} · trips", s.id, s.display_name()));
            print_trips(&trip_rows);
        }
    }
    Ok(())
}

fn method_tag(manual: bool) -> &'static str {
    if manual { "*" } else { "" }
}

fn print_trips(rows: &[Trip]) {
    if rows.is_empty() {
        info("No trips for this shift.");
        return;
    }

    let mut table = Table::with_headers(&[
        "ID", "START", "END", "DIST", "DUR", "FROM", "TO", "CONF", "PTS", "GAP", "CLASS",
    ]);
    for t in rows {
        let conf_color = color_for_confidence(t.confidence_score);
        table.add_row(vec![
            t.id.to_string(),
            t.started_at.format("%H:%M:%S").to_string(),
            t.ended_at.format("%H:%M:%S").to_string(),
            km(t.billable_distance_km()),
            mins2readable(t.duration_minutes),
            colorize_optional(&format!(
                "{}{}",
                location_ref(t.start_location_id),
                method_tag(t.start_match_method.is_manual())
            )),
            colorize_optional(&format!(
                "{}{}",
                location_ref(t.end_location_id),
                method_tag(t.end_match_method.is_manual())
            )),
            format!("{conf_color}{:.2}{RESET}", t.confidence_score),
            t.gps_point_count.to_string(),
            if t.has_gps_gap {
                format!("{YELLOW}yes{RESET}")
            } else {
                format!("{GREY}no{RESET}")
            },
            t.classification.to_db_str().to_string(),
        ]);
    }
    print!("{}", table.render());
    println!("{GREY}* manual match{RESET}");
}

fn print_stops(rows: &[StationaryCluster]) {
    if rows.is_empty() {
        info("No stops for this shift.");
        return;
    }

    let mut table = Table::with_headers(&[
        "ID", "START", "END", "DUR", "CENTROID", "ACC", "PTS", "GAPS", "LOCATION",
    ]);
    for s in rows {
        table.add_row(vec![
            s.id.to_string(),
            s.started_at.format("%H:%M:%S").to_string(),
            s.ended_at.format("%H:%M:%S").to_string(),
            secs2readable(s.duration_seconds),
            format!("{:.5},{:.5}", s.centroid_lat, s.centroid_lon),
            format!("{:.0} m", s.centroid_accuracy),
            s.gps_point_count.to_string(),
            format!("{} ({}s)", s.gps_gap_count, s.gps_gap_seconds),
            colorize_optional(&location_ref(s.matched_location_id)),
        ]);
    }
    print!("{}", table.render());
}

fn print_timeline(tl: &Timeline) {
    if tl.segments.is_empty() {
        info("Nothing recorded for this shift.");
        return;
    }

    let mut table = Table::with_headers(&["START", "END", "SEGMENT", "DUR", "DETAIL"]);
    for seg in &tl.segments {
        let (label, minutes, detail) = match seg {
            Segment::Trip {
                trip_id,
                duration_minutes,
                distance_km,
                start_location_id,
                end_location_id,
                ..
            } => (
                format!("trip #{trip_id}"),
                *duration_minutes,
                format!(
                    "{} {} → {}",
                    km(*distance_km),
                    location_ref(*start_location_id),
                    location_ref(*end_location_id)
                ),
            ),
            Segment::Stop {
                stop_id,
                duration_minutes,
                class,
                ..
            } => (
                format!("stop #{stop_id}"),
                *duration_minutes,
                match class {
                    StopClass::Matched { location_id } => location_ref(Some(*location_id)),
                    StopClass::Travel => "travel".to_string(),
                    StopClass::Unmatched { at_boundary: false } => "unmatched".to_string(),
                    StopClass::Unmatched { at_boundary: true } => {
                        format!("{YELLOW}unmatched (boundary){RESET}")
                    }
                },
            ),
        };
        table.add_row(vec![
            seg.start().format("%H:%M").to_string(),
            seg.end().format("%H:%M").to_string(),
            label,
            mins2readable(minutes),
            detail,
        ]);
    }
    print!("{}", table.render());

    println!();
    println!(
        "Trips: {} · {} | Stops: {} | Idle gaps: {}",
        mins2readable(tl.total_trip_minutes),
        km(tl.total_km),
        mins2readable(tl.total_stop_minutes),
        tl.gaps.len()
    );
}
