//! Fair Value Analyzer.
//!
//! Runs the four valuation methods over one facts bundle and combines them
//! into a median consensus. Evaluation is a pure function of the facts and
//! the adjustment parameters and never fails as a whole: a method that
//! cannot run reports why and is left out of the consensus.

use chrono::Utc;
use fair_value_common::{GaugeSettings, ValuationSettings};
use tracing::{debug, info};

use super::consensus::build_consensus;
use super::dcf::value_dcf;
use super::gauge::build_gauge;
use super::lynch::value_lynch;
use super::peg::value_peg;
use super::relative::value_relative;
use super::types::*;
use super::wacc::{estimate_default_wacc, FALLBACK_WACC_PERCENT, MARKET_RETURN};

/// Fair value analyzer configuration.
#[derive(Debug, Clone)]
pub struct ValuationConfig {
    /// Assumed market return for CAPM
    pub market_return: f64,
    /// WACC (%) used when the CAPM estimate is unusable
    pub fallback_wacc_percent: f64,
    /// Default terminal growth (%)
    pub default_terminal_growth_percent: f64,
    /// Divide by one share when shares outstanding is unknown
    pub unit_share_fallback: bool,
    /// P/E gauge anchors
    pub gauge: GaugeSettings,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            market_return: MARKET_RETURN,
            fallback_wacc_percent: FALLBACK_WACC_PERCENT,
            default_terminal_growth_percent: 2.5,
            unit_share_fallback: false,
            gauge: GaugeSettings::default(),
        }
    }
}

impl From<&ValuationSettings> for ValuationConfig {
    fn from(settings: &ValuationSettings) -> Self {
        Self {
            market_return: settings.market_return,
            fallback_wacc_percent: settings.fallback_wacc_percent,
            default_terminal_growth_percent: settings.default_terminal_growth_percent,
            unit_share_fallback: settings.unit_share_fallback,
            gauge: settings.gauge,
        }
    }
}

impl AdjustmentParams {
    /// CAPM WACC, configured terminal growth, annual Lynch comparison and
    /// the facts' own sector P/E and growth estimate.
    pub fn defaults_for(facts: &FinancialFacts, config: &ValuationConfig) -> Self {
        let wacc = estimate_default_wacc(
            facts.risk_free_rate,
            facts.beta,
            config.market_return,
            config.fallback_wacc_percent,
        );

        Self {
            wacc: wacc.wacc_percent / 100.0,
            terminal_growth_rate: config.default_terminal_growth_percent / 100.0,
            lynch_period: LynchPeriod::Annual,
            sector_pe: facts.sector_pe_default,
            forward_growth_percent: facts.forward_growth_estimate,
        }
    }
}

/// Four-method fair value analyzer.
#[derive(Debug, Clone, Default)]
pub struct FairValueAnalyzer {
    config: ValuationConfig,
}

impl FairValueAnalyzer {
    /// Create a new analyzer with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config.
    pub fn with_config(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// CAPM estimate for the default WACC.
    pub fn estimate_wacc(&self, facts: &FinancialFacts) -> WaccEstimate {
        estimate_default_wacc(
            facts.risk_free_rate,
            facts.beta,
            self.config.market_return,
            self.config.fallback_wacc_percent,
        )
    }

    /// Parameters a user starts from before adjusting anything.
    pub fn default_params(&self, facts: &FinancialFacts) -> AdjustmentParams {
        AdjustmentParams::defaults_for(facts, &self.config)
    }

    /// Run every method and build the consensus and P/E gauge.
    pub fn evaluate(&self, facts: &FinancialFacts, params: &AdjustmentParams) -> FairValueReport {
        let dcf = value_dcf(facts, params, &self.config);
        let lynch = value_lynch(facts, params);
        let relative = value_relative(facts, params);
        let peg = value_peg(facts, params);

        let results = [
            (ValuationMethod::Dcf, &dcf),
            (ValuationMethod::Lynch, &lynch),
            (ValuationMethod::Relative, &relative),
            (ValuationMethod::Peg, &peg),
        ];

        for (method, result) in &results {
            match result {
                ValuationResult::Computed(v) => debug!(
                    ticker = %facts.ticker,
                    method = ?method,
                    fair_value = v.fair_value,
                    advisories = v.advisories.len(),
                    "Method computed"
                ),
                ValuationResult::NotComputable { reason } => debug!(
                    ticker = %facts.ticker,
                    method = ?method,
                    category = ?reason.category(),
                    reason = %reason,
                    "Method not computable"
                ),
            }
        }

        let consensus = build_consensus(&results, facts.current_price);
        let pe_gauge = build_gauge(facts, &self.config.gauge);

        match &consensus {
            Some(c) => info!(
                ticker = %facts.ticker,
                median = c.median,
                delta = c.delta_vs_price,
                methods = c.contributing.len(),
                verdict = %c.verdict,
                "Fair value consensus"
            ),
            None => info!(ticker = %facts.ticker, "No valid valuation for consensus"),
        }

        FairValueReport {
            ticker: facts.ticker.clone(),
            current_price: facts.current_price,
            params: *params,
            dcf,
            lynch,
            relative,
            peg,
            consensus,
            pe_gauge,
            evaluated_at: Utc::now(),
        }
    }
}

/// Evaluate with the default analyzer configuration.
pub fn evaluate(facts: &FinancialFacts, params: &AdjustmentParams) -> FairValueReport {
    FairValueAnalyzer::new().evaluate(facts, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_facts() -> FinancialFacts {
        FinancialFacts {
            ticker: "TEST".to_string(),
            company_name: Some("Test Corp".to_string()),
            current_price: 100.0,
            eps_trailing: Some(5.0),
            eps_forward: Some(5.5),
            beta: 1.2,
            risk_free_rate: 0.04,
            free_cash_flow: Some(400_000_000.0),
            shares_outstanding: Some(100_000_000),
            annual_eps: vec![5.0, 4.0, 3.5],
            quarterly_eps: vec![1.4, 1.3, 1.2, 1.1, 1.0],
            sector_pe_default: 18.0,
            forward_growth_estimate: 12.0,
            reported_peg_ratio: None,
        }
    }

    #[test]
    fn test_default_params() {
        let analyzer = FairValueAnalyzer::new();
        let params = analyzer.default_params(&make_test_facts());

        // 0.04 + 1.2 * 0.06 = 0.112
        assert!((params.wacc - 0.112).abs() < 1e-9);
        assert!((params.terminal_growth_rate - 0.025).abs() < 1e-12);
        assert_eq!(params.lynch_period, LynchPeriod::Annual);
        assert!((params.sector_pe - 18.0).abs() < 1e-12);
        assert!((params.forward_growth_percent - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_all_methods() {
        let analyzer = FairValueAnalyzer::new();
        let facts = make_test_facts();
        let params = analyzer.default_params(&facts);

        let report = analyzer.evaluate(&facts, &params);

        assert_eq!(report.ticker, "TEST");
        assert!(report.dcf.is_computable());
        // 5.0 * (5/4 - 1) * 100
        assert!((report.lynch.fair_value().unwrap() - 125.0).abs() < 1e-9);
        assert!((report.relative.fair_value().unwrap() - 90.0).abs() < 1e-9);
        assert!((report.peg.fair_value().unwrap() - 60.0).abs() < 1e-9);

        let consensus = report.consensus.expect("consensus");
        assert_eq!(consensus.contributing.len(), 4);

        let gauge = report.pe_gauge.expect("gauge");
        assert_eq!(gauge.band, PeBand::FairValue);
    }

    #[test]
    fn test_quarterly_mode() {
        let analyzer = FairValueAnalyzer::new();
        let facts = make_test_facts();
        let params = AdjustmentParams {
            lynch_period: LynchPeriod::Quarterly,
            ..analyzer.default_params(&facts)
        };

        let report = analyzer.evaluate(&facts, &params);
        // 1.4 vs 1.0 four quarters back: 40% growth
        assert!((report.lynch.fair_value().unwrap() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_failure_does_not_abort() {
        let analyzer = FairValueAnalyzer::new();
        let mut facts = make_test_facts();
        facts.free_cash_flow = None;
        facts.annual_eps.clear();

        let report = analyzer.evaluate(&facts, &analyzer.default_params(&facts));
        assert!(!report.dcf.is_computable());
        assert!(!report.lynch.is_computable());

        let consensus = report.consensus.as_ref().unwrap();
        assert_eq!(
            consensus.contributing,
            vec![ValuationMethod::Relative, ValuationMethod::Peg]
        );
        assert!((consensus.median - 75.0).abs() < 1e-9);
        assert_eq!(report.warnings().len(), 2);
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = ValuationSettings::default();
        settings.fallback_wacc_percent = 9.0;
        settings.unit_share_fallback = true;
        let config = ValuationConfig::from(&settings);
        assert!((config.fallback_wacc_percent - 9.0).abs() < 1e-12);
        assert!(config.unit_share_fallback);
        assert!((config.market_return - 0.10).abs() < 1e-12);
    }
}
