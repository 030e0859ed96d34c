//! Market data access.
//!
//! Providers return raw [`MarketSnapshot`]s which are normalized into the
//! facts bundle the valuation core works from. Caching is applied at the
//! call site by wrapping a provider in [`CachedFactsProvider`].
//!
//! # Sources
//! - **file**: JSON snapshots under the configured snapshot directory

mod cache;
mod file;
mod provider;
mod snapshot;

pub use cache::{CacheStats, CachedFactsProvider};
pub use file::FileSnapshotProvider;
pub use provider::{normalize_ticker, FactsProvider, ProviderError};
pub use snapshot::{
    eps_series, free_cash_flow, FactDefaults, MarketSnapshot, QuoteSummary, StatementRow,
};
