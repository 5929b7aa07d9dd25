use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::rates;
use crate::errors::{AppError, AppResult};
use crate::models::reimbursement_rate::ReimbursementRate;
use crate::ui::messages::{info, success};
use crate::utils::colors::{GREEN, RESET};
use crate::utils::date::{parse_date, today};
use crate::utils::table::Table;
use chrono::NaiveDate;

fn date_arg(raw: &str) -> AppResult<NaiveDate> {
    parse_date(raw).ok_or_else(|| AppError::InvalidDate(raw.to_string()))
}

fn validate(rate: &ReimbursementRate) -> AppResult<()> {
    let bad = |field: &'static str, v: f64| AppError::InvalidValue {
        field,
        value: v.to_string(),
    };
    if !rate.rate_per_km.is_finite() || rate.rate_per_km < 0.0 {
        return Err(bad("rate per km", rate.rate_per_km));
    }
    if let Some(t) = rate.threshold_km.filter(|t| !t.is_finite() || *t < 0.0) {
        return Err(bad("threshold", t));
    }
    if let Some(a) = rate.rate_after_threshold.filter(|a| !a.is_finite() || *a < 0.0) {
        return Err(bad("rate after threshold", a));
    }
    if let Some(to) = rate.effective_to
        && to < rate.effective_from
    {
        return Err(AppError::InvalidPeriod(format!(
            "{} is after {to}",
            rate.effective_from
        )));
    }
    Ok(())
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Rate {
        add,
        list,
        per_km,
        threshold,
        after,
        from,
        to,
    } = cmd
    {
        let pool = DbPool::open_initialized(&cfg.database)?;

        if *add {
            let rate = ReimbursementRate {
                id: 0,
                rate_per_km: per_km.unwrap_or_default(),
                threshold_km: *threshold,
                rate_after_threshold: *after,
                effective_from: date_arg(from.as_deref().unwrap_or_default())?,
                effective_to: to.as_deref().map(date_arg).transpose()?,
            };
            validate(&rate)?;
            let id = rates::insert_rate(&pool.conn, &rate)?;
            ttlog(
                &pool.conn,
                "rate_add",
                &format!("rate {id}"),
                &format!("{:.4}/km from {}", rate.rate_per_km, rate.effective_from),
            )?;
            success(format!("Rate {id} added"));
        } else if *list {
            let rows = rates::list_rates(&pool.conn)?;
            if rows.is_empty() {
                info("No reimbursement rates defined.");
                return Ok(());
            }
            let now = today();
            let mut table =
                Table::with_headers(&["ID", "PER KM", "THRESHOLD", "AFTER", "FROM", "TO", ""]);
            for r in &rows {
                table.add_row(vec![
                    r.id.to_string(),
                    format!("{:.4}", r.rate_per_km),
                    r.threshold_km.map(|t| format!("{t:.0} km")).unwrap_or_else(|| "--".into()),
                    r.rate_after_threshold
                        .map(|a| format!("{a:.4}"))
                        .unwrap_or_else(|| "--".into()),
                    r.effective_from.to_string(),
                    r.effective_to.map(|d| d.to_string()).unwrap_or_else(|| "--".into()),
                    if r.is_effective_on(now) {
                        format!("{GREEN}current{RESET}")
                    } else {
                        String::new()
                    },
                ]);
            }
            print!("{}", table.render());
        }
    }

    Ok(())
}
