use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request. `mock_data` lets the caller render something anyway.
    #[error("Validation failed: {reason}")]
    Validation {
        reason: String,
        mock_data: Option<serde_json::Value>,
    },
}

impl AppError {
    pub fn validation(reason: impl Into<String>) -> Self {
        AppError::Validation {
            reason: reason.into(),
            mock_data: None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mock_data: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, mock_data) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Validation { reason, mock_data } => {
                tracing::warn!(reason = %reason, "Rejected request");
                (StatusCode::BAD_REQUEST, reason, mock_data)
            }
        };

        (
            status,
            Json(ErrorBody {
                status: "error",
                error: message,
                mock_data,
            }),
        )
            .into_response()
    }
}
