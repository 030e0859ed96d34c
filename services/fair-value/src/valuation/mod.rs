//! Fair value estimation.
//!
//! Four independent methods run over one [`FinancialFacts`] bundle:
//!
//! - **DCF**: five-year free cash flow projection plus a Gordon growth terminal value
//! - **Peter Lynch**: trailing EPS times EPS growth in whole percent
//! - **Relative**: trailing EPS times a sector P/E
//! - **PEG**: trailing EPS times the forward growth rate (PEG = 1)
//!
//! Each method yields a [`ValuationResult`]. The strictly positive values are
//! combined into a median [`Consensus`], and the current P/E is placed on a
//! five-band [`PeGauge`].

pub mod analyzer;
pub mod consensus;
pub mod dcf;
pub mod gauge;
pub mod lynch;
pub mod peg;
pub mod relative;
pub mod types;
pub mod wacc;

pub use analyzer::{evaluate, FairValueAnalyzer, ValuationConfig};
pub use consensus::{build_consensus, median};
pub use dcf::value_dcf;
pub use gauge::{build_gauge, classify_pe, gauge_position};
pub use lynch::value_lynch;
pub use peg::value_peg;
pub use relative::value_relative;
pub use types::*;
pub use wacc::estimate_default_wacc;
