//! Relative valuation: trailing EPS times the sector P/E.

use super::types::{AdjustmentParams, Advisory, FinancialFacts, ValuationBasis, ValuationResult};

pub fn value_relative(facts: &FinancialFacts, params: &AdjustmentParams) -> ValuationResult {
    let mut advisories = Vec::new();
    let eps_trailing = match facts.eps_trailing {
        Some(eps) => {
            if eps <= 0.0 {
                advisories.push(Advisory::NonPositiveEps { eps });
            }
            eps
        }
        None => {
            advisories.push(Advisory::MissingTrailingEps);
            0.0
        }
    };

    ValuationResult::computed(
        eps_trailing * params.sector_pe,
        ValuationBasis::Relative {
            eps_trailing,
            sector_pe: params.sector_pe,
        },
        advisories,
    )
}
