use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::recompute::{backfill, recompute_shift};
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{error, success, warning};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Segment { shift, all } = cmd {
        let mut pool = DbPool::open_initialized(&cfg.database)?;

        if let Some(id) = shift {
            let r = recompute_shift(&mut pool, cfg, *id)?;
            success(format!(
                "Shift {}: {} trips, {} stops ({} of {} points used, {} cached matches)",
                r.shift_id, r.trips, r.stops, r.points_used, r.points_total, r.matched_points
            ));
            if r.carried_overrides > 0 {
                warning(format!(
                    "{} manual endpoint override(s) carried over",
                    r.carried_overrides
                ));
            }
        } else if *all {
            let report = backfill(&mut pool, cfg)?;
            let trips: usize = report.succeeded.iter().map(|r| r.trips).sum();
            let stops: usize = report.succeeded.iter().map(|r| r.stops).sum();
            success(format!(
                "{} shifts recomputed: {} trips, {} stops",
                report.succeeded.len(),
                trips,
                stops
            ));
            for (id, e) in &report.failed {
                error(format!("Shift {id}: {e}"));
            }
            ttlog(
                &pool.conn,
                "backfill",
                "all shifts",
                &format!(
                    "{} succeeded, {} failed",
                    report.succeeded.len(),
                    report.failed.len()
                ),
            )?;
        } else {
            return Err(AppError::InvalidValue {
                field: "segment",
                value: "expected --shift ID or --all".into(),
            });
        }
    }

    Ok(())
}
