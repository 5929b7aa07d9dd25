use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::suggest::{
    dismiss_cluster, dismiss_endpoint, get_cluster_occurrences, restore_cluster, suggest_locations,
};
use crate::db::ignored;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::ignored::EndpointSource;
use crate::models::suggestion::{ClusterSuggestion, Occurrence};
use crate::ui::messages::{header, info, success};
use crate::utils::date::parse_ts;
use crate::utils::table::Table;
use chrono::{DateTime, Utc};

fn parse_lat_lon(raw: &str) -> AppResult<(f64, f64)> {
    let bad = || AppError::InvalidCoordinate(raw.to_string());
    let (lat, lon) = raw.split_once(',').ok_or_else(bad)?;
    let lat: f64 = lat.trim().parse().map_err(|_| bad())?;
    let lon: f64 = lon.trim().parse().map_err(|_| bad())?;
    Ok((lat, lon))
}

fn parse_endpoint(raw: &str) -> AppResult<(EndpointSource, i64)> {
    let bad = || AppError::InvalidValue {
        field: "endpoint",
        value: raw.to_string(),
    };
    let (source, id) = raw.split_once(':').ok_or_else(bad)?;
    let source = EndpointSource::from_db_str(source.trim()).ok_or_else(bad)?;
    let id: i64 = id.trim().parse().map_err(|_| bad())?;
    Ok((source, id))
}

fn print_suggestions(rows: &[ClusterSuggestion]) {
    if rows.is_empty() {
        info("No suggested locations.");
        return;
    }
    let mut table =
        Table::with_headers(&["CENTROID", "COUNT", "FIRST", "LAST", "EMPLOYEES", "ADDRESS"]);
    for s in rows {
        table.add_row(vec![
            format!("{:.6},{:.6}", s.centroid_lat, s.centroid_lon),
            s.occurrence_count.to_string(),
            s.first_seen.format("%Y-%m-%d").to_string(),
            s.last_seen.format("%Y-%m-%d").to_string(),
            s.employee_names.join(", "),
            s.address_samples.first().cloned().unwrap_or_default(),
        ]);
    }
    print!("{}", table.render());
}

fn print_occurrences(rows: &[Occurrence]) {
    if rows.is_empty() {
        info("No cluster near that point.");
        return;
    }
    let mut table = Table::with_headers(&["AT", "SOURCE", "ID", "EMPLOYEE", "POSITION", "ACC"]);
    for o in rows {
        table.add_row(vec![
            o.at.format("%Y-%m-%d %H:%M").to_string(),
            o.source.to_db_str().to_string(),
            o.source_id.to_string(),
            o.employee_name.clone(),
            format!("{:.6},{:.6}", o.latitude, o.longitude),
            format!("{:.0} m", o.accuracy_m),
        ]);
    }
    print!("{}", table.render());
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Suggest {
        min,
        occurrences,
        radius,
        dismiss,
        count,
        dismiss_endpoint: endpoint,
        restore,
        dismissed,
        as_of,
        json,
    } = cmd
    {
        let pool = DbPool::open_initialized(&cfg.database)?;
        let now: DateTime<Utc> = match as_of {
            Some(raw) => parse_ts(raw).ok_or_else(|| AppError::InvalidTimestamp(raw.clone()))?,
            None => Utc::now(),
        };

        if let Some(raw) = dismiss {
            let (lat, lon) = parse_lat_lon(raw)?;
            let id = dismiss_cluster(&pool.conn, lat, lon, count.unwrap_or(0), now)?;
            success(format!("Suggestion dismissed (#{id})"));
        } else if let Some(raw) = endpoint {
            let (source, id) = parse_endpoint(raw)?;
            dismiss_endpoint(&pool.conn, source, id, now)?;
            success(format!("Endpoint {}:{id} dismissed", source.to_db_str()));
        } else if let Some(id) = restore {
            restore_cluster(&pool.conn, *id)?;
            success(format!("Dismissal #{id} removed"));
        } else if *dismissed {
            let clusters = ignored::list_ignored_clusters(&pool.conn)?;
            let endpoints = ignored::list_ignored_endpoints(&pool.conn)?;
            if *json {
                let value = serde_json::json!({ "clusters": clusters, "endpoints": endpoints });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                header("Dismissed clusters");
                let mut table = Table::with_headers(&["ID", "CENTROID", "COUNT", "DISMISSED"]);
                for c in &clusters {
                    table.add_row(vec![
                        c.id.to_string(),
                        format!("{:.6},{:.6}", c.centroid_lat, c.centroid_lon),
                        c.occurrence_count.to_string(),
                        c.dismissed_at.format("%Y-%m-%d %H:%M").to_string(),
                    ]);
                }
                print!("{}", table.render());
                header("Dismissed endpoints");
                let mut table = Table::with_headers(&["SOURCE", "ID", "DISMISSED"]);
                for e in &endpoints {
                    table.add_row(vec![
                        e.source.to_db_str().to_string(),
                        e.source_id.to_string(),
                        e.dismissed_at.format("%Y-%m-%d %H:%M").to_string(),
                    ]);
                }
                print!("{}", table.render());
            }
        } else if let Some(raw) = occurrences {
            let (lat, lon) = parse_lat_lon(raw)?;
            let rows = get_cluster_occurrences(&pool.conn, cfg, lat, lon, *radius, now)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_occurrences(&rows);
            }
        } else {
            let min = min.unwrap_or(cfg.suggestions.min_occurrences);
            let rows = suggest_locations(&pool.conn, cfg, min, now)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                print_suggestions(&rows);
            }
        }
    }

    Ok(())
}
