//! Data provider abstraction.
//!
//! Defines the `FactsProvider` trait every snapshot source implements. The
//! valuation core only ever sees the normalized [`FinancialFacts`].

use async_trait::async_trait;
use thiserror::Error;

use super::snapshot::{FactDefaults, MarketSnapshot};
use crate::valuation::FinancialFacts;

// ============================================================================
// Provider Error
// ============================================================================

/// Errors specific to data providers.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// No data exists for the requested ticker
    #[error("No data for ticker {0}")]
    NotFound(String),
    /// Reading the underlying source failed
    #[error("I/O error: {0}")]
    Io(String),
    /// The source returned something that is not a valid snapshot
    #[error("Malformed snapshot: {0}")]
    Parse(String),
    /// Provider is temporarily unavailable
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ProviderError> for fair_value_common::Error {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(ticker) => Self::NotFound(format!("ticker {}", ticker)),
            other => Self::External(other.to_string()),
        }
    }
}

/// Trim and upper-case a ticker; `None` for anything that cannot be a symbol.
///
/// Allows letters, digits and `. - ^ =` (share classes, indices, FX pairs).
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_ascii_uppercase();
    let valid = !ticker.is_empty()
        && ticker.len() <= 16
        && !ticker.starts_with('.')
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='));
    valid.then_some(ticker)
}

// ============================================================================
// Facts Provider Trait
// ============================================================================

/// Source of market snapshots.
#[async_trait]
pub trait FactsProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Fetch the raw snapshot for a ticker
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, ProviderError>;

    /// Defaults applied while normalizing
    fn fact_defaults(&self) -> FactDefaults {
        FactDefaults::default()
    }

    /// Fetch and normalize into a facts bundle
    async fn fetch_facts(&self, ticker: &str) -> Result<FinancialFacts, ProviderError> {
        let snapshot = self.fetch_snapshot(ticker).await?;
        Ok(snapshot.to_facts_with(&self.fact_defaults()))
    }
}

// ============================================================================
// Tests
// ============================================================================
