use chrono::NaiveDate;
use serde::Serialize;

/// Mileage and reimbursement for one employee over a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MileageSummary {
    pub employee_id: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub trip_count: usize,
    pub total_km: f64,
    pub business_km: f64,
    pub personal_km: f64,
    /// Business km that qualify for reimbursement.
    pub reimbursable_km: f64,
    /// Reimbursable km accrued earlier in the same year.
    pub ytd_km_before: f64,
    pub base_tier_km: f64,
    pub reduced_tier_km: f64,
    pub rate_id: Option<i64>,
    pub rate_per_km: Option<f64>,
    pub rate_after_threshold: Option<f64>,
    pub base_amount: f64,
    pub reduced_amount: f64,
    pub reimbursement: f64,
    /// Set when no rate is configured at all, so a zero amount is not ambiguous.
    pub no_rate: bool,
}
