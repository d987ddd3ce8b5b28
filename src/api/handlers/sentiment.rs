use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::sentiment_store::SentimentSnapshot;
use super::optional_json;
use crate::errors::AppError;
use crate::models::{ChatMessage, TokenSentiment};
use crate::AppState;

const DEFAULT_ANALYZE_TOKEN: &str = "ARB";

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    pub token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageFeed {
    pub messages: Vec<ChatMessage>,
    pub count: usize,
    pub last_updated: DateTime<Utc>,
}

pub async fn all(State(state): State<AppState>) -> Json<SentimentSnapshot> {
    Json(state.sentiment.snapshot().await)
}

pub async fn token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<TokenSentiment>, AppError> {
    if token.trim().is_empty() {
        return Err(AppError::validation("token must not be empty"));
    }
    Ok(Json(state.sentiment.get(&token).await))
}

pub async fn messages(State(state): State<AppState>) -> Json<MessageFeed> {
    let messages = state.sentiment.messages().await;
    Json(MessageFeed {
        count: messages.len(),
        messages,
        last_updated: Utc::now(),
    })
}

pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenSentiment>, AppError> {
    let body: AnalyzeRequest = optional_json(&headers, &body).map_err(AppError::validation)?;
    let token = body
        .token
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ANALYZE_TOKEN.into());

    tracing::debug!(token = %token, "Sentiment analysis requested");
    Ok(Json(state.sentiment.get(&token).await))
}
