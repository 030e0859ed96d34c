//! PEG valuation: the price at which P/E divided by growth equals 1,
//! i.e. trailing EPS times the forward growth rate in whole percent.
//!
//! Non-positive EPS or growth only annotate the result; a value is always
//! produced.

use super::types::{AdjustmentParams, Advisory, FinancialFacts, ValuationBasis, ValuationResult};

/// PEG implied by a market price: `(price / eps) / growth_percent`.
pub fn implied_peg(price: f64, eps: f64, growth_percent: f64) -> Option<f64> {
    if price > 0.0 && eps > 0.0 && growth_percent > 0.0 {
        Some(price / eps / growth_percent)
    } else {
        None
    }
}

pub fn value_peg(facts: &FinancialFacts, params: &AdjustmentParams) -> ValuationResult {
    let growth_percent = params.forward_growth_percent;
    let mut advisories = Vec::new();

    let eps_trailing = match facts.eps_trailing {
        Some(eps) => eps,
        None => {
            advisories.push(Advisory::MissingTrailingEps);
            0.0
        }
    };

    if facts.eps_trailing.is_some() && eps_trailing <= 0.0 {
        advisories.push(Advisory::NonPositiveEps { eps: eps_trailing });
    }
    if growth_percent <= 0.0 {
        advisories.push(Advisory::NonPositiveGrowth { growth_percent });
    }
    if advisories.is_empty() {
        if let Some(peg_ratio) = facts.reported_peg_ratio {
            advisories.push(Advisory::ReportedPeg { peg_ratio });
        }
    }

    ValuationResult::computed(
        eps_trailing * growth_percent,
        ValuationBasis::Peg {
            eps_trailing,
            forward_growth_percent: growth_percent,
            implied_peg: implied_peg(facts.current_price, eps_trailing, growth_percent),
        },
        advisories,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::types::LynchPeriod;

    fn params(growth: f64) -> AdjustmentParams {
        AdjustmentParams {
            wacc: 0.085,
            terminal_growth_rate: 0.025,
            lynch_period: LynchPeriod::Annual,
            sector_pe: 15.0,
            forward_growth_percent: growth,
        }
    }

    fn facts(eps: Option<f64>, price: f64) -> FinancialFacts {
        let mut facts = FinancialFacts::new("TEST");
        facts.eps_trailing = eps;
        facts.current_price = price;
        facts
    }

    #[test]
    fn test_eps_times_growth() {
        let result = value_peg(&facts(Some(5.0), 50.0), &params(12.0));
        assert!((result.fair_value().unwrap() - 60.0).abs() < 1e-9);
        assert!(result.advisories().is_empty());

        match result {
            ValuationResult::Computed(v) => match v.basis {
                ValuationBasis::Peg { implied_peg, .. } => {
                    // P/E 10 over 12% growth
                    assert!((implied_peg.unwrap() - 10.0 / 12.0).abs() < 1e-9);
                }
                other => panic!("unexpected basis {:?}", other),
            },
            other => panic!("expected computed, got {:?}", other),
        }
    }

    #[test]
    fn test_reported_peg_note() {
        let mut f = facts(Some(5.0), 50.0);
        f.reported_peg_ratio = Some(1.8);
        let result = value_peg(&f, &params(12.0));
        assert_eq!(result.advisories(), &[Advisory::ReportedPeg { peg_ratio: 1.8 }]);
    }

    #[test]
    fn test_negative_eps_still_computes() {
        let result = value_peg(&facts(Some(-2.0), 50.0), &params(12.0));
        assert!(result.is_computable());
        assert_eq!(result.fair_value(), Some(0.0));
        assert!(result
            .advisories()
            .iter()
            .any(|a| matches!(a, Advisory::NonPositiveEps { .. })));
    }

    #[test]
    fn test_zero_growth_still_computes() {
        let mut f = facts(Some(4.0), 50.0);
        f.reported_peg_ratio = Some(2.0);
        let result = value_peg(&f, &params(0.0));
        assert_eq!(result.fair_value(), Some(0.0));
        assert_eq!(
            result.advisories(),
            &[Advisory::NonPositiveGrowth { growth_percent: 0.0 }]
        );
    }

    #[test]
    fn test_implied_peg_undefined() {
        assert_eq!(implied_peg(0.0, 5.0, 10.0), None);
        assert_eq!(implied_peg(50.0, -1.0, 10.0), None);
        assert_eq!(implied_peg(50.0, 5.0, 0.0), None);
    }
}
