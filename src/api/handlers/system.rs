use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "whaletrack is running",
        "trackedWhales": state.config.watched_whales.len(),
        "sentimentTokens": state.sentiment.watched_tokens(),
    }))
}

pub async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics_handle.render();
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body)
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    let error = if uri.path().starts_with("/api") {
        "API endpoint not found"
    } else {
        "Not found"
    };
    (StatusCode::NOT_FOUND, Json(json!({ "error": error })))
}
