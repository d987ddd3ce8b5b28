use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::optional_json;
use crate::errors::AppError;
use crate::models::{Transaction, WhaleListing, WhaleSnapshot};
use crate::services::TrackOutcome;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub whale_address: Option<String>,
    pub threshold: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRequest {
    pub threshold: Option<Decimal>,
}

#[derive(Serialize)]
pub struct Success<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> Success<T> {
    fn new(data: T) -> Self {
        Self {
            status: "success",
            message: None,
            data,
        }
    }
}

#[derive(Serialize)]
pub struct TrackData {
    pub transactions: Vec<Transaction>,
    pub summary: String,
}

#[derive(Serialize)]
pub struct WhaleList {
    pub whales: Vec<WhaleListing>,
}

fn validation_with_mock(state: &AppState, reason: impl Into<String>) -> AppError {
    let report = state.tracker.fallback().error_report();
    AppError::Validation {
        reason: reason.into(),
        mock_data: Some(json!({
            "transactions": report.transactions,
            "summary": report.summary,
        })),
    }
}

fn check_threshold(threshold: Decimal) -> Result<Decimal, String> {
    if threshold.is_sign_negative() && !threshold.is_zero() {
        return Err(format!("threshold must not be negative, got {threshold}"));
    }
    Ok(threshold)
}

fn log_outcome(address: &str, outcome: &TrackOutcome) {
    if let Err(reason) = &outcome.persisted {
        tracing::error!(whale = %address, error = %reason, "Snapshot not saved, serving report anyway");
    }
    if outcome.is_degraded() {
        tracing::warn!(whale = %address, "Served synthetic whale report");
    }
}

pub async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Success<TrackData>>, AppError> {
    let body: TrackRequest =
        optional_json(&headers, &body).map_err(|reason| validation_with_mock(&state, reason))?;

    let address = match body.whale_address {
        Some(a) if a.trim().is_empty() => {
            return Err(validation_with_mock(&state, "whaleAddress must not be empty"));
        }
        Some(a) => a.trim().to_string(),
        None => state.config.default_whale_address.clone(),
    };
    let threshold = check_threshold(body.threshold.unwrap_or(state.config.default_threshold))
        .map_err(|reason| validation_with_mock(&state, reason))?;

    tracing::info!(whale = %address, threshold = %threshold, "Whale tracking requested");
    let outcome = state.tracker.track(&address, threshold).await;
    log_outcome(&address, &outcome);

    Ok(Json(Success::new(TrackData {
        transactions: outcome.report.transactions,
        summary: outcome.report.summary,
    })))
}

pub async fn list(State(state): State<AppState>) -> Json<WhaleList> {
    Json(WhaleList {
        whales: state.whales.list().await,
    })
}

pub async fn detail(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<WhaleSnapshot>, AppError> {
    state
        .whales
        .get(&address)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Whale address not found".into()))
}

/// Forces a fresh tracking run for one address.
pub async fn update(
    State(state): State<AppState>,
    Path(address): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Success<WhaleSnapshot>>, AppError> {
    let body: UpdateRequest = optional_json(&headers, &body).map_err(AppError::validation)?;
    let threshold = check_threshold(body.threshold.unwrap_or(state.config.default_threshold))
        .map_err(AppError::validation)?;

    let outcome = state.tracker.track(&address, threshold).await;
    log_outcome(&address, &outcome);

    Ok(Json(Success {
        status: "success",
        message: Some(format!("Whale data updated for {address}")),
        data: outcome.snapshot,
    }))
}
