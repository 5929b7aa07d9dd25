use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::mileage::summarize;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::mileage::MileageSummary;
use crate::ui::messages::{header, warning};
use crate::utils::date::parse_date;
use crate::utils::formatting::{km, money};

fn print_summary(s: &MileageSummary) {
    header(format!(
        "{} · {} → {}",
        s.employee_id, s.period_start, s.period_end
    ));
    println!("Trips:           {}", s.trip_count);
    println!("Total:           {}", km(s.total_km));
    println!("Business:        {}", km(s.business_km));
    println!("Personal:        {}", km(s.personal_km));
    println!("Reimbursable:    {}", km(s.reimbursable_km));
    println!("Earlier in year: {}", km(s.ytd_km_before));

    if s.no_rate {
        warning("No reimbursement rate configured");
        return;
    }

    println!(
        "Base tier:       {} × {} = {}",
        km(s.base_tier_km),
        s.rate_per_km.map(money).unwrap_or_default(),
        money(s.base_amount)
    );
    if s.reduced_tier_km > 0.0 {
        println!(
            "Reduced tier:    {} × {} = {}",
            km(s.reduced_tier_km),
            s.rate_after_threshold.or(s.rate_per_km).map(money).unwrap_or_default(),
            money(s.reduced_amount)
        );
    }
    println!("Reimbursement:   {}", money(s.reimbursement));
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Mileage {
        employee,
        from,
        to,
        json,
    } = cmd
    {
        let start = parse_date(from).ok_or_else(|| AppError::InvalidDate(from.clone()))?;
        let end = parse_date(to).ok_or_else(|| AppError::InvalidDate(to.clone()))?;

        let pool = DbPool::open_initialized(&cfg.database)?;
        let summary = summarize(&pool.conn, employee, start, end)?;

        if *json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            print_summary(&summary);
        }
    }
    Ok(())
}
