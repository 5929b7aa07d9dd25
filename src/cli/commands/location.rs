use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::registry;
use crate::core::rematch::RematchSummary;
use crate::db::locations;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::location::{Location, LocationDraft, LocationType};
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREEN, GREY, RESET};
use crate::utils::table::Table;

fn parse_kind(raw: &str) -> AppResult<LocationType> {
    LocationType::from_code(raw).ok_or_else(|| AppError::InvalidLocationType(raw.to_string()))
}

fn required<T: Clone>(value: &Option<T>, field: &'static str) -> AppResult<T> {
    value.clone().ok_or_else(|| AppError::InvalidValue {
        field,
        value: "missing".into(),
    })
}

fn print_summary(summary: &RematchSummary) {
    info(format!(
        "Re-matched: starts +{} / -{}, ends +{} / -{}, stops +{} / -{}",
        summary.newly_matched_start,
        summary.unmatched_start,
        summary.newly_matched_end,
        summary.unmatched_end,
        summary.stops_matched,
        summary.stops_unmatched
    ));
}

fn print_locations(rows: &[Location]) {
    if rows.is_empty() {
        info("No locations defined.");
        return;
    }
    let mut table = Table::with_headers(&["ID", "NAME", "TYPE", "CENTER", "RADIUS", "ACTIVE"]);
    for l in rows {
        table.add_row(vec![
            l.id.to_string(),
            l.name.clone(),
            l.kind.to_db_str().to_string(),
            format!("{:.6},{:.6}", l.latitude, l.longitude),
            format!("{:.0} m", l.radius_m),
            if l.active {
                format!("{GREEN}yes{RESET}")
            } else {
                format!("{GREY}no{RESET}")
            },
        ]);
    }
    print!("{}", table.render());
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Location {
        add,
        edit,
        del,
        activate,
        deactivate,
        list,
        name,
        kind,
        lat,
        lon,
        radius,
        inactive,
        json,
    } = cmd
    {
        let mut pool = DbPool::open_initialized(&cfg.database)?;

        if *add {
            let draft = LocationDraft {
                name: required(name, "name")?,
                kind: parse_kind(&kind.clone().unwrap_or_else(|| "other".into()))?,
                latitude: required(lat, "lat")?,
                longitude: required(lon, "lon")?,
                radius_m: required(radius, "radius")?,
                active: !*inactive,
            };
            let (loc, summary) = registry::create_location(&mut pool, cfg, &draft)?;
            success(format!("Location {} '{}' created", loc.id, loc.name));
            print_summary(&summary);
        } else if let Some(id) = edit {
            let current =
                locations::get_location(&pool.conn, *id)?.ok_or(AppError::LocationNotFound(*id))?;
            let draft = LocationDraft {
                name: name.clone().unwrap_or(current.name),
                kind: match kind {
                    Some(k) => parse_kind(k)?,
                    None => current.kind,
                },
                latitude: lat.unwrap_or(current.latitude),
                longitude: lon.unwrap_or(current.longitude),
                radius_m: radius.unwrap_or(current.radius_m),
                active: current.active,
            };
            let (loc, summary) = registry::update_location(&mut pool, cfg, *id, &draft)?;
            success(format!("Location {} '{}' updated", loc.id, loc.name));
            print_summary(&summary);
        } else if let Some(id) = del {
            let summary = registry::delete_location(&mut pool, cfg, *id)?;
            success(format!("Location {id} deleted"));
            print_summary(&summary);
        } else if let Some(id) = activate {
            let (loc, summary) = registry::set_active(&mut pool, cfg, *id, true)?;
            success(format!("Location {} '{}' activated", loc.id, loc.name));
            print_summary(&summary);
        } else if let Some(id) = deactivate {
            let (loc, summary) = registry::set_active(&mut pool, cfg, *id, false)?;
            success(format!("Location {} '{}' deactivated", loc.id, loc.name));
            print_summary(&summary);
        } else if *list {
            let rows = locations::list_locations(&pool.conn, false)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_locations(&rows);
            }
        }
    }

    Ok(())
}
