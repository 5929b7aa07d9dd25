use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::db::rates;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::success;
use crate::utils::date::parse_date;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Vehicle { employee, date } = cmd {
        let day = parse_date(date).ok_or_else(|| AppError::InvalidDate(date.clone()))?;
        let pool = DbPool::open_initialized(&cfg.database)?;
        rates::add_company_vehicle_day(&pool.conn, employee, day)?;
        ttlog(&pool.conn, "vehicle_day", employee, &day.to_string())?;
        success(format!("{employee}: company vehicle on {day}"));
    }
    Ok(())
}
