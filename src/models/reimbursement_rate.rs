use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A versioned per-km reimbursement rate, optionally tiered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReimbursementRate {
    pub id: i64,
    pub rate_per_km: f64,
    pub threshold_km: Option<f64>,
    pub rate_after_threshold: Option<f64>,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

impl ReimbursementRate {
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date <= to)
    }

    /// True when the rate splits distance into a base and a reduced tier.
    pub fn is_tiered(&self) -> bool {
        self.threshold_km.is_some() && self.rate_after_threshold.is_some()
    }
}
