//! Valuation Types.
//!
//! Defines the financial facts bundle, the user adjustment parameters and the
//! per-method outcome types produced by the four fair value methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Input Types
// ============================================================================

/// Which EPS history the Peter Lynch method compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LynchPeriod {
    /// Latest fiscal year vs the previous fiscal year
    #[default]
    Annual,
    /// Latest quarter vs the same quarter one year earlier
    Quarterly,
}

impl LynchPeriod {
    /// Index of the year-over-year comparable observation.
    pub fn comparison_offset(self) -> usize {
        match self {
            Self::Annual => 1,
            Self::Quarterly => 4,
        }
    }

    /// Minimum number of observations needed for a comparison.
    pub fn required_observations(self) -> usize {
        self.comparison_offset() + 1
    }
}

impl fmt::Display for LynchPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual => write!(f, "annual"),
            Self::Quarterly => write!(f, "quarterly"),
        }
    }
}

impl FromStr for LynchPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "annual" | "yearly" | "fy" => Ok(Self::Annual),
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            other => Err(format!("unknown Lynch period '{}': expected annual or quarterly", other)),
        }
    }
}

/// Snapshot of the facts every valuation method draws from.
///
/// Built once per evaluation by the data layer and read-only afterwards.
/// Absent data stays `None` so it can be told apart from a true zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialFacts {
    /// Ticker symbol
    pub ticker: String,
    /// Display name reported by the data source
    #[serde(default)]
    pub company_name: Option<String>,
    /// Current share price, 0 when unavailable
    pub current_price: f64,
    /// Trailing twelve months (or latest fiscal year) diluted EPS
    pub eps_trailing: Option<f64>,
    /// Analyst consensus forward EPS
    #[serde(default)]
    pub eps_forward: Option<f64>,
    /// Volatility relative to the market
    pub beta: f64,
    /// Risk-free rate as a decimal (0.04 = 4%)
    pub risk_free_rate: f64,
    /// Most recent annual free cash flow (absolute currency amount)
    pub free_cash_flow: Option<f64>,
    /// Shares outstanding
    pub shares_outstanding: Option<u64>,
    /// Annual diluted EPS, most recent first, gaps removed
    #[serde(default)]
    pub annual_eps: Vec<f64>,
    /// Quarterly diluted EPS, most recent first, gaps removed
    #[serde(default)]
    pub quarterly_eps: Vec<f64>,
    /// Sector P/E used as the default relative multiple
    pub sector_pe_default: f64,
    /// Consensus earnings growth estimate in whole percent
    pub forward_growth_estimate: f64,
    /// PEG ratio reported by the data source, if any
    #[serde(default)]
    pub reported_peg_ratio: Option<f64>,
}

impl FinancialFacts {
    /// Create a facts bundle with every optional fact absent and the
    /// documented defaults for beta, risk-free rate, sector P/E and growth.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            company_name: None,
            current_price: 0.0,
            eps_trailing: None,
            eps_forward: None,
            beta: 1.0,
            risk_free_rate: 0.04,
            free_cash_flow: None,
            shares_outstanding: None,
            annual_eps: Vec::new(),
            quarterly_eps: Vec::new(),
            sector_pe_default: 15.0,
            forward_growth_estimate: 10.0,
            reported_peg_ratio: None,
        }
    }

    /// EPS history for the given comparison period.
    pub fn eps_series(&self, period: LynchPeriod) -> &[f64] {
        match period {
            LynchPeriod::Annual => &self.annual_eps,
            LynchPeriod::Quarterly => &self.quarterly_eps,
        }
    }

    /// Current P/E, only defined for a known price and positive trailing EPS.
    pub fn current_pe(&self) -> Option<f64> {
        self.price_over(self.eps_trailing)
    }

    /// Forward P/E, only defined for a known price and positive forward EPS.
    pub fn forward_pe(&self) -> Option<f64> {
        self.price_over(self.eps_forward)
    }

    // A price of 0 means "unavailable", not a free stock.
    fn price_over(&self, eps: Option<f64>) -> Option<f64> {
        match eps {
            Some(eps) if eps > 0.0 && self.current_price > 0.0 => Some(self.current_price / eps),
            _ => None,
        }
    }
}

/// User-adjustable parameters. Rates are decimals, growth is whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentParams {
    /// Discount rate (0.085 = 8.5%)
    pub wacc: f64,
    /// Perpetual growth after the projection horizon (0.025 = 2.5%)
    pub terminal_growth_rate: f64,
    pub lynch_period: LynchPeriod,
    pub sector_pe: f64,
    /// Expected earnings growth in whole percent (10.0 = 10%)
    pub forward_growth_percent: f64,
}

// ============================================================================
// Outcome Types
// ============================================================================

/// The four valuation methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    Dcf,
    Lynch,
    Relative,
    Peg,
}

impl ValuationMethod {
    pub const ALL: [ValuationMethod; 4] = [Self::Dcf, Self::Lynch, Self::Relative, Self::Peg];
}

impl fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dcf => write!(f, "Discounted Cash Flow (DCF)"),
            Self::Lynch => write!(f, "Peter Lynch"),
            Self::Relative => write!(f, "Relative (Sector P/E)"),
            Self::Peg => write!(f, "PEG (PEG = 1)"),
        }
    }
}

/// A fact the bundle may lack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactField {
    FreeCashFlow,
    SharesOutstanding,
    EpsHistory,
}

impl fmt::Display for FactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FreeCashFlow => write!(f, "free cash flow"),
            Self::SharesOutstanding => write!(f, "shares outstanding"),
            Self::EpsHistory => write!(f, "EPS history"),
        }
    }
}

/// Broad class of a non-computable outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    MissingInput,
    DegenerateParameter,
    InsufficientHistory,
}

/// Why a method produced no value.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotComputable {
    #[error("missing input: {field}")]
    MissingInput { field: FactField },

    #[error("WACC equals the terminal growth rate ({rate}); the terminal value is undefined")]
    WaccEqualsTerminalGrowth { rate: f64 },

    #[error("prior EPS ({eps_prev}) is zero or negative; growth percentage is undefined")]
    NonPositivePriorEps { eps_prev: f64 },

    #[error("insufficient {period} EPS history: {available} of {required} observations")]
    InsufficientHistory {
        period: LynchPeriod,
        required: usize,
        available: usize,
    },

    #[error("{quantity} is not a finite number")]
    NonFinite { quantity: String },
}

impl NotComputable {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::MissingInput { .. } => FailureCategory::MissingInput,
            Self::InsufficientHistory { .. } => FailureCategory::InsufficientHistory,
            Self::WaccEqualsTerminalGrowth { .. }
            | Self::NonPositivePriorEps { .. }
            | Self::NonFinite { .. } => FailureCategory::DegenerateParameter,
        }
    }
}

/// Non-fatal note attached to a computed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// Trailing EPS unavailable; treated as 0
    MissingTrailingEps,
    NonPositiveEps { eps: f64 },
    NonPositiveGrowth { growth_percent: f64 },
    /// PEG ratio reported by the data source
    ReportedPeg { peg_ratio: f64 },
    WaccBelowTerminalGrowth { wacc: f64, terminal_growth_rate: f64 },
    /// Shares outstanding unknown; cash flow divided by a single share
    UnitSharesFallback,
    /// Raw result was negative and is displayed as 0
    ClampedToZero { raw_value: f64 },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTrailingEps => write!(f, "Trailing EPS unavailable, treated as 0"),
            Self::NonPositiveEps { eps } => write!(f, "EPS is zero or negative ({:.2})", eps),
            Self::NonPositiveGrowth { growth_percent } => {
                write!(f, "Growth rate is zero or negative ({:.2}%)", growth_percent)
            }
            Self::ReportedPeg { peg_ratio } => write!(
                f,
                "Reported PEG is {:.2}; fair value assumes a PEG of 1.0",
                peg_ratio
            ),
            Self::WaccBelowTerminalGrowth {
                wacc,
                terminal_growth_rate,
            } => write!(
                f,
                "WACC ({:.2}%) is below terminal growth ({:.2}%); terminal value is negative",
                wacc * 100.0,
                terminal_growth_rate * 100.0
            ),
            Self::UnitSharesFallback => {
                write!(f, "Shares outstanding unknown; per-share figures assume 1 share")
            }
            Self::ClampedToZero { raw_value } => {
                write!(f, "Raw value {:.2} is negative, shown as 0", raw_value)
            }
        }
    }
}

/// Intermediate numbers behind a computed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ValuationBasis {
    Dcf {
        fcf_per_share: f64,
        wacc: f64,
        terminal_growth_rate: f64,
        projected_fcf: Vec<f64>,
        pv_explicit: f64,
        terminal_value: f64,
        pv_terminal: f64,
    },
    Lynch {
        period: LynchPeriod,
        eps_now: f64,
        eps_prev: f64,
        growth_percent: f64,
        eps_trailing: f64,
    },
    Relative {
        eps_trailing: f64,
        sector_pe: f64,
    },
    Peg {
        eps_trailing: f64,
        forward_growth_percent: f64,
        /// PEG implied by the current price
        implied_peg: Option<f64>,
    },
}

/// A method's numeric outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedValue {
    /// Displayed fair value, floored at 0
    pub fair_value: f64,
    /// Unclamped formula result
    pub raw_value: f64,
    pub basis: ValuationBasis,
    #[serde(default)]
    pub advisories: Vec<Advisory>,
}

/// Outcome of one valuation method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValuationResult {
    Computed(ComputedValue),
    NotComputable { reason: NotComputable },
}

impl ValuationResult {
    /// Build a computed result from a raw formula value.
    ///
    /// Negative values are clamped to 0 with an advisory; non-finite values
    /// become not computable.
    pub fn computed(raw_value: f64, basis: ValuationBasis, mut advisories: Vec<Advisory>) -> Self {
        if !raw_value.is_finite() {
            return Self::not_computable(NotComputable::NonFinite {
                quantity: "fair value".into(),
            });
        }

        if raw_value < 0.0 {
            advisories.push(Advisory::ClampedToZero { raw_value });
        }

        Self::Computed(ComputedValue {
            fair_value: raw_value.max(0.0),
            raw_value,
            basis,
            advisories,
        })
    }

    pub fn not_computable(reason: NotComputable) -> Self {
        Self::NotComputable { reason }
    }

    pub fn is_computable(&self) -> bool {
        matches!(self, Self::Computed(_))
    }

    /// Displayed value, including a clamped 0.
    pub fn fair_value(&self) -> Option<f64> {
        match self {
            Self::Computed(v) => Some(v.fair_value),
            Self::NotComputable { .. } => None,
        }
    }

    /// Value eligible for the consensus: computed and strictly positive.
    pub fn consensus_value(&self) -> Option<f64> {
        self.fair_value().filter(|v| *v > 0.0)
    }

    pub fn advisories(&self) -> &[Advisory] {
        match self {
            Self::Computed(v) => &v.advisories,
            Self::NotComputable { .. } => &[],
        }
    }

    pub fn reason(&self) -> Option<&NotComputable> {
        match self {
            Self::Computed(_) => None,
            Self::NotComputable { reason } => Some(reason),
        }
    }
}

/// Whether the consensus sits above or below the market price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceVerdict {
    Undervalued,
    AtFairValue,
    Overvalued,
}

impl fmt::Display for PriceVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undervalued => write!(f, "undervalued"),
            Self::AtFairValue => write!(f, "at fair value"),
            Self::Overvalued => write!(f, "overvalued"),
        }
    }
}

/// Median of the valid method values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    pub median: f64,
    /// `median - current_price`
    pub delta_vs_price: f64,
    pub verdict: PriceVerdict,
    /// Delta as a percentage of price, when price is positive
    pub upside_percent: Option<f64>,
    /// Methods whose values entered the median
    pub contributing: Vec<ValuationMethod>,
}

/// Five ordered P/E bands of the valuation gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeBand {
    Undervalued,
    SlightlyUndervalued,
    FairValue,
    SlightlyOvervalued,
    Overvalued,
}

impl fmt::Display for PeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undervalued => write!(f, "Undervalued"),
            Self::SlightlyUndervalued => write!(f, "Slightly undervalued"),
            Self::FairValue => write!(f, "Fair value"),
            Self::SlightlyOvervalued => write!(f, "Slightly overvalued"),
            Self::Overvalued => write!(f, "Overvalued"),
        }
    }
}

/// Current P/E placed on the gauge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeGauge {
    pub current_pe: f64,
    pub band: PeBand,
    pub label: String,
    /// Needle position in [0, 100]
    pub position: f64,
    pub forward_pe: Option<f64>,
}

/// CAPM-derived default discount rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaccEstimate {
    pub risk_free_rate: f64,
    pub beta: f64,
    pub market_return: f64,
    /// Suggested WACC in percent, rounded to 2 decimals
    pub wacc_percent: f64,
    /// True when the CAPM figure was unusable and the fallback was taken
    pub used_fallback: bool,
}

/// Everything one evaluation produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairValueReport {
    pub ticker: String,
    pub current_price: f64,
    pub params: AdjustmentParams,
    pub dcf: ValuationResult,
    pub lynch: ValuationResult,
    pub relative: ValuationResult,
    pub peg: ValuationResult,
    pub consensus: Option<Consensus>,
    pub pe_gauge: Option<PeGauge>,
    pub evaluated_at: DateTime<Utc>,
}

impl FairValueReport {
    pub fn result(&self, method: ValuationMethod) -> &ValuationResult {
        match method {
            ValuationMethod::Dcf => &self.dcf,
            ValuationMethod::Lynch => &self.lynch,
            ValuationMethod::Relative => &self.relative,
            ValuationMethod::Peg => &self.peg,
        }
    }

    /// Methods paired with their results, in display order.
    pub fn results(&self) -> [(ValuationMethod, &ValuationResult); 4] {
        ValuationMethod::ALL.map(|m| (m, self.result(m)))
    }

    /// One line per not-computable method and per advisory.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for (method, result) in self.results() {
            if let Some(reason) = result.reason() {
                warnings.push(format!("{}: not computable ({})", method, reason));
            }
            for advisory in result.advisories() {
                warnings.push(format!("{}: {}", method, advisory));
            }
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relative_basis() -> ValuationBasis {
        ValuationBasis::Relative {
            eps_trailing: -2.0,
            sector_pe: 15.0,
        }
    }

    #[test]
    fn test_lynch_period_offsets() {
        assert_eq!(LynchPeriod::Annual.comparison_offset(), 1);
        assert_eq!(LynchPeriod::Annual.required_observations(), 2);
        assert_eq!(LynchPeriod::Quarterly.comparison_offset(), 4);
        assert_eq!(LynchPeriod::Quarterly.required_observations(), 5);
    }

    #[test]
    fn test_lynch_period_parse() {
        assert_eq!("Annual".parse::<LynchPeriod>().unwrap(), LynchPeriod::Annual);
        assert_eq!(" quarterly ".parse::<LynchPeriod>().unwrap(), LynchPeriod::Quarterly);
        assert!("monthly".parse::<LynchPeriod>().is_err());
    }

    #[test]
    fn test_current_pe_requires_positive_eps() {
        let mut facts = FinancialFacts::new("TEST");
        facts.current_price = 100.0;
        assert_eq!(facts.current_pe(), None);

        facts.eps_trailing = Some(-1.0);
        assert_eq!(facts.current_pe(), None);

        facts.eps_trailing = Some(5.0);
        assert!((facts.current_pe().unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_pe_undefined_without_price() {
        let mut facts = FinancialFacts::new("NOPRICE");
        facts.eps_trailing = Some(5.0);
        facts.eps_forward = Some(6.0);

        assert_eq!(facts.current_pe(), None);
        assert_eq!(facts.forward_pe(), None);
    }

    #[test]
    fn test_negative_raw_is_clamped_and_excluded() {
        let result = ValuationResult::computed(-30.0, relative_basis(), Vec::new());

        assert_eq!(result.fair_value(), Some(0.0));
        assert_eq!(result.consensus_value(), None);
        assert!(result
            .advisories()
            .iter()
            .any(|a| matches!(a, Advisory::ClampedToZero { raw_value } if *raw_value == -30.0)));
    }

    #[test]
    fn test_non_finite_raw_is_not_computable() {
        let result = ValuationResult::computed(f64::INFINITY, relative_basis(), Vec::new());
        assert!(!result.is_computable());
        assert_eq!(
            result.reason().map(NotComputable::category),
            Some(FailureCategory::DegenerateParameter)
        );
    }

    #[test]
    fn test_not_computable_categories() {
        let missing = NotComputable::MissingInput {
            field: FactField::FreeCashFlow,
        };
        assert_eq!(missing.category(), FailureCategory::MissingInput);
        assert_eq!(missing.to_string(), "missing input: free cash flow");

        let history = NotComputable::InsufficientHistory {
            period: LynchPeriod::Quarterly,
            required: 5,
            available: 3,
        };
        assert_eq!(history.category(), FailureCategory::InsufficientHistory);
        assert_eq!(
            history.to_string(),
            "insufficient quarterly EPS history: 3 of 5 observations"
        );
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = ValuationResult::not_computable(NotComputable::MissingInput {
            field: FactField::SharesOutstanding,
        });
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "not_computable");
        assert_eq!(json["reason"]["kind"], "missing_input");
        assert_eq!(json["reason"]["field"], "shares_outstanding");

        let computed = ValuationResult::computed(75.0, relative_basis(), Vec::new());
        let json = serde_json::to_value(&computed).unwrap();
        assert_eq!(json["status"], "computed");
        assert_eq!(json["basis"]["method"], "relative");
        assert_eq!(json["fair_value"], 75.0);
    }

    #[test]
    fn test_pe_band_labels() {
        assert_eq!(PeBand::FairValue.to_string(), "Fair value");
        assert_eq!(PeBand::SlightlyUndervalued.to_string(), "Slightly undervalued");
        assert!(PeBand::Undervalued < PeBand::Overvalued);
    }
}
