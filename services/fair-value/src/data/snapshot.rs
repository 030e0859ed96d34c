//! Raw market snapshot and its normalization into [`FinancialFacts`].
//!
//! A snapshot mirrors what a quote/fundamentals source hands back: a quote
//! summary, statement tables as labelled rows of nullable cells (most recent
//! period first) and a 10-year treasury yield quote in percent.

use fair_value_common::ValuationSettings;
use serde::{Deserialize, Serialize};

use crate::valuation::FinancialFacts;

const FREE_CASH_FLOW: &str = "Free Cash Flow";
const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
const CAPITAL_EXPENDITURE: &str = "Capital Expenditure";

// ============================================================================
// Snapshot Types
// ============================================================================

/// Quote summary fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub trailing_eps: Option<f64>,
    #[serde(default)]
    pub forward_eps: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    /// Decimal growth estimate (0.12 = 12%)
    #[serde(default)]
    pub earnings_growth: Option<f64>,
    #[serde(default)]
    pub peg_ratio: Option<f64>,
}

/// One statement line; `values[0]` is the most recent period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub label: String,
    #[serde(default)]
    pub values: Vec<Option<f64>>,
}

impl StatementRow {
    pub fn new(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// Non-null cells in period order.
    pub fn present_values(&self) -> Vec<f64> {
        self.values.iter().flatten().copied().collect()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.iter().flatten().next().copied()
    }
}

/// Everything a provider returns for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: String,
    #[serde(default)]
    pub quote: QuoteSummary,
    /// Annual cash flow statement
    #[serde(default)]
    pub cashflow: Vec<StatementRow>,
    /// Annual income statement
    #[serde(default)]
    pub income_annual: Vec<StatementRow>,
    /// Quarterly income statement
    #[serde(default)]
    pub income_quarterly: Vec<StatementRow>,
    /// 10-year treasury yield in percent (4.2 = 4.2%)
    #[serde(default)]
    pub treasury_yield_percent: Option<f64>,
    /// Sector average P/E, when the source knows it
    #[serde(default)]
    pub sector_pe: Option<f64>,
}

/// Values used for facts the snapshot does not carry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactDefaults {
    pub risk_free_rate: f64,
    pub sector_pe: f64,
    pub forward_growth_percent: f64,
}

impl Default for FactDefaults {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04,
            sector_pe: 15.0,
            forward_growth_percent: 10.0,
        }
    }
}

impl From<&ValuationSettings> for FactDefaults {
    fn from(settings: &ValuationSettings) -> Self {
        Self {
            risk_free_rate: settings.default_risk_free_rate,
            sector_pe: settings.default_sector_pe,
            forward_growth_percent: settings.default_forward_growth_percent,
        }
    }
}

// ============================================================================
// Normalization
// ============================================================================

fn find_row<'a>(rows: &'a [StatementRow], label: &str) -> Option<&'a StatementRow> {
    rows.iter().find(|row| row.label == label)
}

/// Free cash flow, or operating cash flow plus (negative) capital expenditure.
pub fn free_cash_flow(cashflow: &[StatementRow]) -> Option<f64> {
    if let Some(fcf) = find_row(cashflow, FREE_CASH_FLOW).and_then(StatementRow::latest) {
        return Some(fcf);
    }

    let ocf = find_row(cashflow, OPERATING_CASH_FLOW).and_then(StatementRow::latest)?;
    let capex = find_row(cashflow, CAPITAL_EXPENDITURE).and_then(StatementRow::latest)?;
    Some(ocf + capex)
}

/// Diluted EPS row if present, else any EPS row, with gaps removed.
pub fn eps_series(income: &[StatementRow]) -> Vec<f64> {
    income
        .iter()
        .find(|row| row.label.contains("EPS") && row.label.contains("Diluted"))
        .or_else(|| income.iter().find(|row| row.label.contains("EPS")))
        .map(StatementRow::present_values)
        .unwrap_or_default()
}

fn shares_count(raw: Option<f64>) -> Option<u64> {
    raw.filter(|s| s.is_finite() && *s >= 0.0)
        .map(|s| s.round() as u64)
}

impl MarketSnapshot {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }

    /// Normalize with the built-in defaults.
    pub fn to_facts(&self) -> FinancialFacts {
        self.to_facts_with(&FactDefaults::default())
    }

    pub fn to_facts_with(&self, defaults: &FactDefaults) -> FinancialFacts {
        let quote = &self.quote;

        FinancialFacts {
            ticker: self.ticker.clone(),
            company_name: quote.short_name.clone(),
            current_price: quote
                .current_price
                .or(quote.regular_market_price)
                .unwrap_or(0.0),
            eps_trailing: quote.trailing_eps,
            eps_forward: quote.forward_eps,
            beta: quote.beta.unwrap_or(1.0),
            risk_free_rate: self
                .treasury_yield_percent
                .map(|y| y / 100.0)
                .unwrap_or(defaults.risk_free_rate),
            free_cash_flow: free_cash_flow(&self.cashflow),
            shares_outstanding: shares_count(quote.shares_outstanding),
            annual_eps: eps_series(&self.income_annual),
            quarterly_eps: eps_series(&self.income_quarterly),
            sector_pe_default: self.sector_pe.unwrap_or(defaults.sector_pe),
            forward_growth_estimate: quote
                .earnings_growth
                .map(|g| g * 100.0)
                .unwrap_or(defaults.forward_growth_percent),
            reported_peg_ratio: quote.peg_ratio,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
