//! HTTP routes for the fair value service.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use fair_value_common::Error;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::data::ProviderError;
use crate::report::render_report;
use crate::valuation::{AdjustmentParams, FairValueReport, FinancialFacts, LynchPeriod, WaccEstimate};
use crate::FairValueState;

// ============================================================================
// Error Response
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Error returned by route handlers.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = match &self.0 {
            Error::NotFound(_) => "NOT_FOUND",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::External(_) => "DATA_SOURCE_ERROR",
        };

        if status.is_server_error() {
            tracing::warn!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            code: code.to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct DefaultsResponse {
    pub ticker: String,
    pub facts: FinancialFacts,
    pub wacc: WaccEstimate,
    pub params: AdjustmentParams,
}

/// User adjustments; anything omitted keeps its default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FairValueQuery {
    pub wacc_percent: Option<f64>,
    pub terminal_growth_percent: Option<f64>,
    pub lynch_period: Option<LynchPeriod>,
    pub sector_pe: Option<f64>,
    pub forward_growth_percent: Option<f64>,
}

fn finite(name: &str, value: Option<f64>) -> Result<Option<f64>, Error> {
    match value {
        Some(v) if !v.is_finite() => Err(Error::InvalidInput(format!(
            "{} must be a finite number",
            name
        ))),
        other => Ok(other),
    }
}

impl FairValueQuery {
    /// Overlay the query on the default parameters. Percentages are
    /// converted to decimal rates where the parameters expect them.
    pub fn apply(&self, defaults: AdjustmentParams) -> Result<AdjustmentParams, Error> {
        let mut params = defaults;

        if let Some(wacc) = finite("wacc_percent", self.wacc_percent)? {
            params.wacc = wacc / 100.0;
        }
        if let Some(growth) = finite("terminal_growth_percent", self.terminal_growth_percent)? {
            params.terminal_growth_rate = growth / 100.0;
        }
        if let Some(period) = self.lynch_period {
            params.lynch_period = period;
        }
        if let Some(pe) = finite("sector_pe", self.sector_pe)? {
            params.sector_pe = pe;
        }
        if let Some(growth) = finite("forward_growth_percent", self.forward_growth_percent)? {
            params.forward_growth_percent = growth;
        }

        Ok(params)
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "fair-value".to_string(),
    })
}

/// Facts and the default parameters derived from them
pub async fn get_defaults(
    State(state): State<Arc<FairValueState>>,
    Path(ticker): Path<String>,
) -> Result<Json<DefaultsResponse>, ApiError> {
    let facts = state.load_facts(&ticker).await?;
    let wacc = state.analyzer.estimate_wacc(&facts);
    let params = state.analyzer.default_params(&facts);

    Ok(Json(DefaultsResponse {
        ticker: facts.ticker.clone(),
        facts,
        wacc,
        params,
    }))
}

/// Full evaluation with optional adjustments
pub async fn get_fair_value(
    State(state): State<Arc<FairValueState>>,
    Path(ticker): Path<String>,
    Query(query): Query<FairValueQuery>,
) -> Result<Json<FairValueReport>, ApiError> {
    let (_, report) = state.evaluate_ticker(&ticker, &query).await?;
    Ok(Json(report))
}

/// Same evaluation rendered as markdown
pub async fn get_fair_value_report(
    State(state): State<Arc<FairValueState>>,
    Path(ticker): Path<String>,
    Query(query): Query<FairValueQuery>,
) -> Result<Response, ApiError> {
    let (facts, report) = state.evaluate_ticker(&ticker, &query).await?;
    let body = render_report(&report.ticker, &facts, &report);

    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        body,
    )
        .into_response())
}
