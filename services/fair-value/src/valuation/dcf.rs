//! Discounted cash flow valuation.
//!
//! Projects free cash flow per share over an explicit horizon at the
//! forward growth rate, discounts it at the WACC and adds a Gordon-growth
//! terminal value.

use super::analyzer::ValuationConfig;
use super::types::{
    AdjustmentParams, Advisory, FactField, FinancialFacts, NotComputable, ValuationBasis,
    ValuationResult,
};

/// WACC and terminal growth closer than this are treated as equal.
const RATE_EPSILON: f64 = 1e-12;

/// Explicit projection horizon in years.
pub const PROJECTION_YEARS: i32 = 5;

/// Free cash flow per share grown at `growth_percent` for years `1..=years`.
pub fn project_cash_flows(fcf_per_share: f64, growth_percent: f64, years: i32) -> Vec<f64> {
    let growth = 1.0 + growth_percent / 100.0;
    (1..=years)
        .map(|year| fcf_per_share * growth.powi(year))
        .collect()
}

/// Present value of `flows`, where `flows[0]` arrives at the end of year 1.
pub fn present_value(flows: &[f64], discount_rate: f64) -> f64 {
    let discount = 1.0 + discount_rate;
    flows
        .iter()
        .enumerate()
        .map(|(i, flow)| flow / discount.powi(i as i32 + 1))
        .sum()
}

/// Value the company with a projected DCF.
pub fn value_dcf(
    facts: &FinancialFacts,
    params: &AdjustmentParams,
    config: &ValuationConfig,
) -> ValuationResult {
    let Some(free_cash_flow) = facts.free_cash_flow else {
        return ValuationResult::not_computable(NotComputable::MissingInput {
            field: FactField::FreeCashFlow,
        });
    };

    let mut advisories = Vec::new();

    let shares = match facts.shares_outstanding {
        Some(0) => {
            return ValuationResult::not_computable(NotComputable::MissingInput {
                field: FactField::SharesOutstanding,
            })
        }
        Some(shares) => shares,
        None if config.unit_share_fallback => {
            advisories.push(Advisory::UnitSharesFallback);
            1
        }
        None => {
            return ValuationResult::not_computable(NotComputable::MissingInput {
                field: FactField::SharesOutstanding,
            })
        }
    };

    let wacc = params.wacc;
    let terminal_growth_rate = params.terminal_growth_rate;

    if (wacc - terminal_growth_rate).abs() < RATE_EPSILON {
        return ValuationResult::not_computable(NotComputable::WaccEqualsTerminalGrowth {
            rate: wacc,
        });
    }

    if wacc < terminal_growth_rate {
        advisories.push(Advisory::WaccBelowTerminalGrowth {
            wacc,
            terminal_growth_rate,
        });
    }

    let fcf_per_share = free_cash_flow / shares as f64;
    let projected_fcf =
        project_cash_flows(fcf_per_share, params.forward_growth_percent, PROJECTION_YEARS);
    let pv_explicit = present_value(&projected_fcf, wacc);

    let final_year_fcf = projected_fcf.last().copied().unwrap_or(fcf_per_share);
    let terminal_value =
        final_year_fcf * (1.0 + terminal_growth_rate) / (wacc - terminal_growth_rate);
    let pv_terminal = terminal_value / (1.0 + wacc).powi(PROJECTION_YEARS);

    for (quantity, value) in [
        ("present value of projected cash flow", pv_explicit),
        ("discounted terminal value", pv_terminal),
    ] {
        if !value.is_finite() {
            return ValuationResult::not_computable(NotComputable::NonFinite {
                quantity: quantity.into(),
            });
        }
    }

    tracing::trace!(
        ticker = %facts.ticker,
        fcf_per_share,
        pv_explicit,
        pv_terminal,
        "DCF components"
    );

    ValuationResult::computed(
        pv_explicit + pv_terminal,
        ValuationBasis::Dcf {
            fcf_per_share,
            wacc,
            terminal_growth_rate,
            projected_fcf,
            pv_explicit,
            terminal_value,
            pv_terminal,
        },
        advisories,
    )
}
