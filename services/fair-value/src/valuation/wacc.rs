//! CAPM discount-rate estimate.
//!
//! The estimate only seeds the default WACC shown to the user; the DCF
//! always discounts with the WACC passed in the adjustment parameters.

use super::types::WaccEstimate;

/// Assumed long-run market return.
pub const MARKET_RETURN: f64 = 0.10;

/// WACC (%) used when the CAPM figure is non-positive or NaN.
pub const FALLBACK_WACC_PERCENT: f64 = 8.5;

/// Cost of equity as a decimal: `rf + beta * (rm - rf)`.
pub fn cost_of_equity(risk_free_rate: f64, beta: f64, market_return: f64) -> f64 {
    risk_free_rate + beta * (market_return - risk_free_rate)
}

/// Suggested WACC in percent, rounded to two decimals.
pub fn estimate_default_wacc(
    risk_free_rate: f64,
    beta: f64,
    market_return: f64,
    fallback_percent: f64,
) -> WaccEstimate {
    let percent = round_2dp(cost_of_equity(risk_free_rate, beta, market_return) * 100.0);
    let used_fallback = percent.is_nan() || percent <= 0.0 || percent.is_infinite();

    WaccEstimate {
        risk_free_rate,
        beta,
        market_return,
        wacc_percent: if used_fallback { fallback_percent } else { percent },
        used_fallback,
    }
}

pub(crate) fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_of_equity_market_beta() {
        // beta 1 means cost of equity equals the market return
        let coe = cost_of_equity(0.04, 1.0, MARKET_RETURN);
        assert!((coe - 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_rounds_to_two_decimals() {
        // 0.0425 + 1.23 * (0.10 - 0.0425) = 0.113225
        let est = estimate_default_wacc(0.0425, 1.23, MARKET_RETURN, FALLBACK_WACC_PERCENT);
        assert!(!est.used_fallback);
        assert!((est.wacc_percent - 11.32).abs() < 1e-9);
    }

    #[test]
    fn test_negative_estimate_falls_back() {
        // A strongly negative beta drags the cost of equity below zero
        let est = estimate_default_wacc(0.04, -2.0, MARKET_RETURN, FALLBACK_WACC_PERCENT);
        assert!(est.used_fallback);
        assert!((est.wacc_percent - 8.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_estimate_falls_back() {
        let est = estimate_default_wacc(0.0, 0.0, MARKET_RETURN, FALLBACK_WACC_PERCENT);
        assert!(est.used_fallback);
        assert!((est.wacc_percent - 8.5).abs() < 1e-12);
    }

    #[test]
    fn test_nan_beta_falls_back() {
        let est = estimate_default_wacc(0.04, f64::NAN, MARKET_RETURN, FALLBACK_WACC_PERCENT);
        assert!(est.used_fallback);
        assert!((est.wacc_percent - 8.5).abs() < 1e-12);
    }
}
