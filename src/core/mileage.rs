//! Mileage totals and tiered reimbursement for one employee and period.

use crate::db::{rates, trips};
use crate::errors::{AppError, AppResult};
use crate::models::mileage::MileageSummary;
use crate::models::reimbursement_rate::ReimbursementRate;
use crate::models::trip::{CarpoolRole, Classification, TransportMode, Trip};
use crate::utils::date::{day_range_bounds, start_of_year};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::collections::HashSet;

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whether a trip's distance can be reimbursed.
pub fn is_reimbursable(trip: &Trip, company_vehicle_days: &HashSet<NaiveDate>) -> bool {
    trip.classification == Classification::Business
        && trip.transport_mode == TransportMode::Driving
        && matches!(trip.carpool_role, CarpoolRole::Solo | CarpoolRole::Driver)
        && !company_vehicle_days.contains(&trip.started_at.date_naive())
}

fn reimbursable_km(list: &[Trip], company_vehicle_days: &HashSet<NaiveDate>) -> f64 {
    list.iter()
        .filter(|t| is_reimbursable(t, company_vehicle_days))
        .map(Trip::billable_distance_km)
        .sum()
}

/// Split `km` into base and reduced tiers given what was already accrued
/// this year. A rate without a complete tier definition is flat.
pub fn split_tiers(km: f64, ytd_km: f64, rate: &ReimbursementRate) -> (f64, f64) {
    match rate.threshold_km {
        Some(threshold) if rate.is_tiered() => {
            let room = (threshold - ytd_km).max(0.0);
            let base = km.min(room).max(0.0);
            (base, (km - base).max(0.0))
        }
        _ => (km.max(0.0), 0.0),
    }
}

/// The rate effective on `date`, else the most recent one.
pub fn select_rate(conn: &Connection, date: NaiveDate) -> AppResult<Option<ReimbursementRate>> {
    match rates::rate_effective_on(conn, date)? {
        Some(rate) => Ok(Some(rate)),
        None => rates::latest_rate(conn),
    }
}

/// Summarize one employee's mileage over `[period_start, period_end]`.
pub fn summarize(
    conn: &Connection,
    employee_id: &str,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> AppResult<MileageSummary> {
    if period_start > period_end {
        return Err(AppError::InvalidPeriod(format!(
            "{period_start} is after {period_end}"
        )));
    }

    let year_start = start_of_year(period_end);
    let vehicle_days =
        rates::company_vehicle_days(conn, employee_id, year_start.min(period_start), period_end)?;

    let (from, to) = day_range_bounds(period_start, period_end);
    let period_trips = trips::load_trips_for_employee(conn, employee_id, &from, &to)?;

    let total_km: f64 = period_trips.iter().map(Trip::billable_distance_km).sum();
    let business_km: f64 = period_trips
        .iter()
        .filter(|t| t.classification == Classification::Business)
        .map(Trip::billable_distance_km)
        .sum();
    let personal_km = total_km - business_km;
    let reimbursable = reimbursable_km(&period_trips, &vehicle_days);

    let ytd_km_before = match period_start.pred_opt() {
        Some(day_before) if day_before >= year_start => {
            let (from, to) = day_range_bounds(year_start, day_before);
            let earlier = trips::load_trips_for_employee(conn, employee_id, &from, &to)?;
            reimbursable_km(&earlier, &vehicle_days)
        }
        _ => 0.0,
    };

    let rate = select_rate(conn, period_end)?;

    let mut summary = MileageSummary {
        employee_id: employee_id.to_string(),
        period_start,
        period_end,
        trip_count: period_trips.len(),
        total_km,
        business_km,
        personal_km,
        reimbursable_km: reimbursable,
        ytd_km_before,
        base_tier_km: 0.0,
        reduced_tier_km: 0.0,
        rate_id: None,
        rate_per_km: None,
        rate_after_threshold: None,
        base_amount: 0.0,
        reduced_amount: 0.0,
        reimbursement: 0.0,
        no_rate: rate.is_none(),
    };

    if let Some(rate) = rate {
        let (base_km, reduced_km) = split_tiers(reimbursable, ytd_km_before, &rate);
        let after = rate.rate_after_threshold.unwrap_or(rate.rate_per_km);

        summary.base_tier_km = base_km;
        summary.reduced_tier_km = reduced_km;
        summary.rate_id = Some(rate.id);
        summary.rate_per_km = Some(rate.rate_per_km);
        summary.rate_after_threshold = rate.rate_after_threshold;
        summary.base_amount = round_cents(base_km * rate.rate_per_km);
        summary.reduced_amount = round_cents(reduced_km * after);
        summary.reimbursement = round_cents(summary.base_amount + summary.reduced_amount);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiered() -> ReimbursementRate {
        ReimbursementRate {
            id: 1,
            rate_per_km: 0.72,
            threshold_km: Some(5000.0),
            rate_after_threshold: Some(0.66),
            effective_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            effective_to: None,
        }
    }

    #[test]
    fn tiers_split_at_threshold() {
        assert_eq!(split_tiers(300.0, 4900.0, &tiered()), (100.0, 200.0));
        assert_eq!(split_tiers(300.0, 6000.0, &tiered()), (0.0, 300.0));
        assert_eq!(split_tiers(300.0, 0.0, &tiered()), (300.0, 0.0));
    }

    #[test]
    fn threshold_without_reduced_rate_is_flat() {
        let rate = ReimbursementRate {
            rate_after_threshold: None,
            ..tiered()
        };
        assert_eq!(split_tiers(300.0, 4900.0, &rate), (300.0, 0.0));
    }
}
