//! Consensus of the valuation methods.
//!
//! Only computed, strictly positive values enter the median. A failed or
//! clamped method is left out rather than counted as 0.

use super::types::{Consensus, PriceVerdict, ValuationMethod, ValuationResult};

/// Statistical median; the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let len = sorted.len();
    let mid = len / 2;
    if len % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Median of the valid results and its distance from the current price.
pub fn build_consensus(
    results: &[(ValuationMethod, &ValuationResult)],
    current_price: f64,
) -> Option<Consensus> {
    let (contributing, values): (Vec<ValuationMethod>, Vec<f64>) = results
        .iter()
        .filter_map(|(method, result)| result.consensus_value().map(|v| (*method, v)))
        .unzip();

    let median = median(&values)?;
    let delta_vs_price = median - current_price;

    let verdict = if delta_vs_price > 0.0 {
        PriceVerdict::Undervalued
    } else if delta_vs_price < 0.0 {
        PriceVerdict::Overvalued
    } else {
        PriceVerdict::AtFairValue
    };

    let upside_percent = (current_price > 0.0).then(|| delta_vs_price / current_price * 100.0);

    Some(Consensus {
        median,
        delta_vs_price,
        verdict,
        upside_percent,
        contributing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::types::{FactField, NotComputable, ValuationBasis};

    fn value(v: f64) -> ValuationResult {
        ValuationResult::computed(
            v,
            ValuationBasis::Relative {
                eps_trailing: v / 15.0,
                sector_pe: 15.0,
            },
            Vec::new(),
        )
    }

    fn missing() -> ValuationResult {
        ValuationResult::not_computable(NotComputable::MissingInput {
            field: FactField::FreeCashFlow,
        })
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[7.0]), Some(7.0));
        assert_eq!(median(&[3.0, 1.0]), Some(2.0));
        assert_eq!(median(&[9.0, 1.0, 5.0]), Some(5.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_excludes_failed_and_clamped() {
        let dcf = missing();
        let lynch = value(-40.0);
        let relative = value(75.0);
        let peg = value(60.0);
        let results = [
            (ValuationMethod::Dcf, &dcf),
            (ValuationMethod::Lynch, &lynch),
            (ValuationMethod::Relative, &relative),
            (ValuationMethod::Peg, &peg),
        ];

        let consensus = build_consensus(&results, 50.0).unwrap();
        // Mixing in zeros would have given 30.0
        assert!((consensus.median - 67.5).abs() < 1e-9);
        assert!((consensus.delta_vs_price - 17.5).abs() < 1e-9);
        assert_eq!(consensus.verdict, PriceVerdict::Undervalued);
        assert_eq!(
            consensus.contributing,
            vec![ValuationMethod::Relative, ValuationMethod::Peg]
        );
        assert!((consensus.upside_percent.unwrap() - 35.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_valid_values() {
        let dcf = missing();
        let zero = value(0.0);
        let results = [(ValuationMethod::Dcf, &dcf), (ValuationMethod::Peg, &zero)];
        assert!(build_consensus(&results, 50.0).is_none());
    }

    #[test]
    fn test_overvalued_and_zero_price() {
        let relative = value(40.0);
        let results = [(ValuationMethod::Relative, &relative)];

        let consensus = build_consensus(&results, 50.0).unwrap();
        assert_eq!(consensus.verdict, PriceVerdict::Overvalued);
        assert!((consensus.delta_vs_price + 10.0).abs() < 1e-9);

        let consensus = build_consensus(&results, 0.0).unwrap();
        assert_eq!(consensus.verdict, PriceVerdict::Undervalued);
        assert_eq!(consensus.upside_percent, None);

        let consensus = build_consensus(&results, 40.0).unwrap();
        assert_eq!(consensus.verdict, PriceVerdict::AtFairValue);
    }
}
