//! Peter Lynch fair value: trailing EPS times the year-over-year EPS growth
//! expressed in whole percentage points.
//!
//! Growth of 15% multiplies EPS by 15, not by 0.15.

use super::types::{
    AdjustmentParams, Advisory, FinancialFacts, LynchPeriod, NotComputable, ValuationBasis,
    ValuationResult,
};

/// Pick the latest EPS and its year-over-year comparable from a
/// most-recent-first series.
pub fn select_eps_pair(series: &[f64], period: LynchPeriod) -> Result<(f64, f64), NotComputable> {
    let offset = period.comparison_offset();
    match (series.first(), series.get(offset)) {
        (Some(&now), Some(&prev)) => Ok((now, prev)),
        _ => Err(NotComputable::InsufficientHistory {
            period,
            required: period.required_observations(),
            available: series.len(),
        }),
    }
}

/// `(eps_now / eps_prev - 1) * 100`, undefined for a non-positive base.
pub fn eps_growth_percent(eps_now: f64, eps_prev: f64) -> Result<f64, NotComputable> {
    if eps_prev <= 0.0 || eps_prev.is_nan() {
        return Err(NotComputable::NonPositivePriorEps { eps_prev });
    }

    let growth = (eps_now / eps_prev - 1.0) * 100.0;
    if growth.is_finite() {
        Ok(growth)
    } else {
        Err(NotComputable::NonFinite {
            quantity: "EPS growth percentage".into(),
        })
    }
}

pub fn value_lynch(facts: &FinancialFacts, params: &AdjustmentParams) -> ValuationResult {
    let period = params.lynch_period;

    let (eps_now, eps_prev) = match select_eps_pair(facts.eps_series(period), period) {
        Ok(pair) => pair,
        Err(reason) => return ValuationResult::not_computable(reason),
    };

    let growth_percent = match eps_growth_percent(eps_now, eps_prev) {
        Ok(growth) => growth,
        Err(reason) => return ValuationResult::not_computable(reason),
    };

    let mut advisories = Vec::new();
    let eps_trailing = facts.eps_trailing.unwrap_or_else(|| {
        advisories.push(Advisory::MissingTrailingEps);
        0.0
    });

    ValuationResult::computed(
        eps_trailing * growth_percent,
        ValuationBasis::Lynch {
            period,
            eps_now,
            eps_prev,
            growth_percent,
            eps_trailing,
        },
        advisories,
    )
}
