//! Fair value report rendering.
//!
//! Turns a [`FairValueReport`] into a markdown summary:
//!
//! ```text
//! # Fair value: ACME (Acme Corp)
//!
//! **Current price:** 50.00 USD | **EPS (TTM):** 5.00 USD
//!
//! ## 1. Discounted Cash Flow (DCF)
//! **Fair value:** 61.32 USD
//! ...
//! ## Consensus
//! ## P/E gauge
//! ```

use crate::valuation::{
    FairValueReport, FinancialFacts, PriceVerdict, ValuationBasis, ValuationResult,
};

const CURRENCY: &str = "USD";

fn money(value: f64) -> String {
    format!("{:.2} {}", value, CURRENCY)
}

/// One-line explanation of how a value was obtained.
pub fn caption(basis: &ValuationBasis) -> String {
    match basis {
        ValuationBasis::Dcf {
            fcf_per_share,
            wacc,
            terminal_growth_rate,
            projected_fcf,
            pv_explicit,
            pv_terminal,
            ..
        } => format!(
            "FCF/share {:.2} projected {} years, discounted at {:.2}% with {:.2}% terminal growth \
             (PV explicit {:.2} + PV terminal {:.2})",
            fcf_per_share,
            projected_fcf.len(),
            wacc * 100.0,
            terminal_growth_rate * 100.0,
            pv_explicit,
            pv_terminal
        ),
        ValuationBasis::Lynch {
            period,
            eps_now,
            eps_prev,
            growth_percent,
            eps_trailing,
        } => format!(
            "EPS {:.2} x {:.2}% {} growth (EPS {:.2} vs {:.2})",
            eps_trailing, growth_percent, period, eps_now, eps_prev
        ),
        ValuationBasis::Relative {
            eps_trailing,
            sector_pe,
        } => format!("EPS {:.2} x sector P/E {:.2}", eps_trailing, sector_pe),
        ValuationBasis::Peg {
            eps_trailing,
            forward_growth_percent,
            implied_peg,
        } => {
            let mut text = format!(
                "EPS {:.2} x {:.2}% growth (PEG = 1)",
                eps_trailing, forward_growth_percent
            );
            if let Some(peg) = implied_peg {
                text.push_str(&format!(", current PEG {:.2}", peg));
            }
            text
        }
    }
}

fn render_result(md: &mut String, index: usize, title: &str, result: &ValuationResult) {
    md.push_str(&format!("## {}. {}\n\n", index, title));

    match result {
        ValuationResult::Computed(v) => {
            md.push_str(&format!("**Fair value:** {}\n\n", money(v.fair_value)));
            md.push_str(&format!("_{}_\n\n", caption(&v.basis)));
            for advisory in &v.advisories {
                md.push_str(&format!("- ⚠️ {}\n", advisory));
            }
            if !v.advisories.is_empty() {
                md.push('\n');
            }
        }
        ValuationResult::NotComputable { reason } => {
            md.push_str(&format!("**Not computable:** {}\n\n", reason));
        }
    }
}

/// Render the full report as markdown.
pub fn render_report(ticker: &str, facts: &FinancialFacts, report: &FairValueReport) -> String {
    let mut md = String::new();

    match &facts.company_name {
        Some(name) => md.push_str(&format!("# Fair value: {} ({})\n\n", ticker, name)),
        None => md.push_str(&format!("# Fair value: {}\n\n", ticker)),
    }

    let eps = facts
        .eps_trailing
        .map(money)
        .unwrap_or_else(|| "n/a".to_string());
    md.push_str(&format!(
        "**Current price:** {} | **EPS (TTM):** {}\n\n",
        money(report.current_price),
        eps
    ));
    md.push_str(&format!(
        "**Evaluated:** {}\n\n",
        report.evaluated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    for (i, (method, result)) in report.results().into_iter().enumerate() {
        render_result(&mut md, i + 1, &method.to_string(), result);
    }

    md.push_str("## Consensus\n\n");
    match &report.consensus {
        Some(c) => {
            md.push_str(&format!(
                "**Median fair value:** {} ({} of 4 methods)\n\n",
                money(c.median),
                c.contributing.len()
            ));
            let sign = if c.delta_vs_price >= 0.0 { "+" } else { "" };
            md.push_str(&format!(
                "**Delta vs price:** {}{:.2} {}",
                sign, c.delta_vs_price, CURRENCY
            ));
            if let Some(upside) = c.upside_percent {
                md.push_str(&format!(" ({}{:.1}%)", sign, upside));
            }
            md.push_str("\n\n");
            let verdict = match c.verdict {
                PriceVerdict::Undervalued => "✅ Undervalued",
                PriceVerdict::AtFairValue => "➖ At fair value",
                PriceVerdict::Overvalued => "❌ Overvalued",
            };
            md.push_str(&format!("**Verdict:** {}\n\n", verdict));
        }
        None => md.push_str("No method produced a positive fair value.\n\n"),
    }

    md.push_str("## P/E gauge\n\n");
    match &report.pe_gauge {
        Some(g) => {
            md.push_str(&format!(
                "**Current P/E:** {:.2} ({}, position {:.0}/100)\n",
                g.current_pe, g.label, g.position
            ));
            if let Some(fpe) = g.forward_pe {
                md.push_str(&format!("**Forward P/E:** {:.2}\n", fpe));
            }
        }
        None => md.push_str("P/E not meaningful (trailing EPS is not positive).\n"),
    }

    md
}

// ============================================================================
// Tests
// ============================================================================
