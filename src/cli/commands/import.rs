use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::import::{import_points, import_shifts};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use crate::utils::path::expand_tilde;
use std::fs::File;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Import { points, shifts } = cmd {
        let mut pool = DbPool::open_initialized(&cfg.database)?;

        match (points, shifts) {
            (Some(file), _) => {
                let report = import_points(&mut pool, File::open(expand_tilde(file))?)?;
                success(format!(
                    "Points: {} inserted, {} duplicates, {} errors",
                    report.inserted, report.duplicates, report.errors
                ));
                if !report.failed_ids.is_empty() {
                    warning(format!("Rejected: {}", report.failed_ids.join(", ")));
                }
            }
            (None, Some(file)) => {
                let stored = import_shifts(&mut pool, File::open(expand_tilde(file))?)?;
                success(format!("Shifts: {stored} stored"));
            }
            (None, None) => {
                return Err(AppError::InvalidValue {
                    field: "import",
                    value: "expected --points FILE or --shifts FILE".into(),
                });
            }
        }
    }

    Ok(())
}
