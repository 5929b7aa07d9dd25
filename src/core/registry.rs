//! Location registry changes. Every change re-matches the stored trips and
//! stops it can affect inside the same transaction.

use crate::config::Config;
use crate::core::matcher::GeofenceIndex;
use crate::core::rematch::{RematchSummary, rematch_location};
use crate::db::{locations, trips};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::location::{Location, LocationDraft};
use log::info;

/// Reject drafts the matcher could not use.
pub fn validate_draft(draft: &LocationDraft, cfg: &Config) -> AppResult<()> {
    if draft.name.trim().is_empty() {
        return Err(AppError::InvalidValue {
            field: "name",
            value: draft.name.clone(),
        });
    }
    if !draft.latitude.is_finite() || !(-90.0..=90.0).contains(&draft.latitude) {
        return Err(AppError::InvalidCoordinate(format!("latitude {}", draft.latitude)));
    }
    if !draft.longitude.is_finite() || !(-180.0..=180.0).contains(&draft.longitude) {
        return Err(AppError::InvalidCoordinate(format!("longitude {}", draft.longitude)));
    }
    let (min, max) = (cfg.locations.min_radius_m, cfg.locations.max_radius_m);
    if !draft.radius_m.is_finite() || draft.radius_m < min || draft.radius_m > max {
        return Err(AppError::InvalidRadius {
            radius: draft.radius_m,
            min,
            max,
        });
    }
    Ok(())
}

fn draft_of(loc: &Location) -> LocationDraft {
    LocationDraft {
        name: loc.name.clone(),
        kind: loc.kind,
        latitude: loc.latitude,
        longitude: loc.longitude,
        radius_m: loc.radius_m,
        active: loc.active,
    }
}

pub fn create_location(
    pool: &mut DbPool,
    cfg: &Config,
    draft: &LocationDraft,
) -> AppResult<(Location, RematchSummary)> {
    validate_draft(draft, cfg)?;

    pool.with_transaction(|tx| {
        let id = locations::insert_location(tx, draft)?;
        let loc = locations::get_location(tx, id)?.ok_or(AppError::LocationNotFound(id))?;

        let index = GeofenceIndex::load(tx)?;
        let summary = rematch_location(tx, cfg, &index, id, Some(&loc))?;

        ttlog(
            tx,
            "location_add",
            &format!("location {id}"),
            &format!("{} ({}), rematched {}", loc.name, loc.kind.to_db_str(), summary.total()),
        )?;
        info!("created location {id} '{}'", loc.name);
        Ok((loc, summary))
    })
}

pub fn update_location(
    pool: &mut DbPool,
    cfg: &Config,
    id: i64,
    draft: &LocationDraft,
) -> AppResult<(Location, RematchSummary)> {
    validate_draft(draft, cfg)?;

    pool.with_transaction(|tx| {
        let before = locations::get_location(tx, id)?.ok_or(AppError::LocationNotFound(id))?;
        locations::update_location(tx, id, draft)?;
        let after = locations::get_location(tx, id)?.ok_or(AppError::LocationNotFound(id))?;

        let summary = if before.zone_changed(&after) {
            let index = GeofenceIndex::load(tx)?;
            rematch_location(tx, cfg, &index, id, Some(&after))?
        } else {
            RematchSummary::default()
        };

        ttlog(
            tx,
            "location_edit",
            &format!("location {id}"),
            &format!("{}, rematched {}", after.name, summary.total()),
        )?;
        Ok((after, summary))
    })
}

/// Toggle a location's `active` flag; inactive locations never match.
pub fn set_active(
    pool: &mut DbPool,
    cfg: &Config,
    id: i64,
    active: bool,
) -> AppResult<(Location, RematchSummary)> {
    let current = locations::get_location(&pool.conn, id)?.ok_or(AppError::LocationNotFound(id))?;
    let draft = LocationDraft {
        active,
        ..draft_of(&current)
    };
    update_location(pool, cfg, id, &draft)
}

/// Delete a location. Automatic references are matched again against the
/// remaining registry first; manual references are nulled by the schema and
/// keep their manual flag.
pub fn delete_location(pool: &mut DbPool, cfg: &Config, id: i64) -> AppResult<RematchSummary> {
    pool.with_transaction(|tx| {
        let loc = locations::get_location(tx, id)?.ok_or(AppError::LocationNotFound(id))?;

        let remaining = locations::list_locations(tx, true)?
            .into_iter()
            .filter(|l| l.id != id);
        let index = GeofenceIndex::new(remaining);
        let summary = rematch_location(tx, cfg, &index, id, None)?;
        let manual = trips::count_manual_refs(tx, id)?;

        locations::delete_location(tx, id)?;
        ttlog(
            tx,
            "location_del",
            &format!("location {id}"),
            &format!(
                "{}, rematched {}, {manual} manual endpoint(s) cleared",
                loc.name,
                summary.total()
            ),
        )?;
        info!("deleted location {id} '{}'", loc.name);
        Ok(summary)
    })
}
