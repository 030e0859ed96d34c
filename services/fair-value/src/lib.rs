//! Fair Value Library
//!
//! Estimates the intrinsic value of a listed company with four independent
//! methods and combines them into a median consensus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     fair-value (Rust Service)                       │
//! │                              :4480                                  │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────┐      │
//! │  │  Data           │  │  Valuation      │  │  Report         │      │
//! │  │  (snapshots +   │─▶│  (DCF, Lynch,   │─▶│  (markdown /    │      │
//! │  │   cache)        │  │   Relative, PEG)│  │   JSON)         │      │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The valuation core is synchronous and pure. Data access and caching sit
//! in front of it and are only reached through [`data::FactsProvider`].

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod report;
pub mod routes;
pub mod valuation;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use fair_value_common::config::Config;
use fair_value_common::logging::generate_trace_id;
use fair_value_common::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::Instrument;

use crate::data::{
    normalize_ticker, CachedFactsProvider, FactDefaults, FactsProvider, FileSnapshotProvider,
};
use crate::routes::FairValueQuery;
use crate::valuation::{FairValueAnalyzer, FairValueReport, FinancialFacts, ValuationConfig};

/// Fair value service state
pub struct FairValueState {
    /// Configuration
    pub config: Config,
    /// Valuation engine
    pub analyzer: FairValueAnalyzer,
    /// Facts source
    pub provider: Arc<dyn FactsProvider>,
}

impl FairValueState {
    /// Create state reading cached snapshots from the configured directory
    pub fn new(config: Config) -> Self {
        let provider = Arc::new(default_provider(&config));
        Self::with_provider(config, provider)
    }

    pub fn with_provider(config: Config, provider: Arc<dyn FactsProvider>) -> Self {
        let analyzer = FairValueAnalyzer::with_config(ValuationConfig::from(&config.valuation));
        Self {
            config,
            analyzer,
            provider,
        }
    }

    /// Fetch the facts bundle for a user-supplied ticker.
    pub async fn load_facts(&self, ticker: &str) -> fair_value_common::Result<FinancialFacts> {
        let ticker = normalize_ticker(ticker)
            .ok_or_else(|| Error::InvalidInput(format!("invalid ticker '{}'", ticker)))?;
        match self.provider.fetch_facts(&ticker).await {
            Ok(facts) => Ok(facts),
            Err(e) if e.is_not_found() => {
                tracing::debug!(ticker = %ticker, "No snapshot for ticker");
                Err(e.into())
            }
            Err(e) => {
                tracing::warn!(
                    ticker = %ticker,
                    provider = self.provider.name(),
                    error = %e,
                    "Facts provider failed"
                );
                Err(e.into())
            }
        }
    }

    /// Load facts, apply the query adjustments and evaluate.
    pub async fn evaluate_ticker(
        &self,
        ticker: &str,
        query: &FairValueQuery,
    ) -> fair_value_common::Result<(FinancialFacts, FairValueReport)> {
        let span = tracing::info_span!("evaluate", trace_id = %generate_trace_id(), ticker = %ticker);

        async {
            let facts = self.load_facts(ticker).await?;
            let params = query.apply(self.analyzer.default_params(&facts))?;
            let report = self.analyzer.evaluate(&facts, &params);
            Ok((facts, report))
        }
        .instrument(span)
        .await
    }
}

/// Snapshot files behind the TTL cache, as configured.
pub fn default_provider(config: &Config) -> CachedFactsProvider<FileSnapshotProvider> {
    let files = FileSnapshotProvider::new(config.data.snapshot_dir())
        .with_defaults(FactDefaults::from(&config.valuation));
    CachedFactsProvider::with_ttl(files, config.data.cache_ttl_secs, config.data.cache_bucket_secs)
}

/// Build the HTTP router
pub fn build_router(state: Arc<FairValueState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/fair-value/:ticker", get(routes::get_fair_value))
        .route("/api/v1/fair-value/:ticker/defaults", get(routes::get_defaults))
        .route("/api/v1/fair-value/:ticker/report", get(routes::get_fair_value_report))
        .with_state(state)
}

/// Main fair value service
pub struct FairValueService {
    state: Arc<FairValueState>,
}

impl FairValueService {
    /// Create a new fair value service
    pub fn new(config: Config) -> Self {
        let state = Arc::new(FairValueState::new(config));
        Self { state }
    }

    pub fn state(&self) -> Arc<FairValueState> {
        Arc::clone(&self.state)
    }

    /// Start the fair value service
    pub async fn start(self) -> Result<()> {
        let host = self.state.config.server.host.clone();
        let port = self.state.config.server.port;

        let app = build_router(Arc::clone(&self.state));

        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;
        tracing::info!(
            address = %addr,
            snapshots = %self.state.config.data.snapshot_dir().display(),
            "Starting HTTP server"
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
