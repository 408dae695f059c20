// rest/error.rs — API error taxonomy and response shaping.
//
// Every error response carries a stable `error` field; 500s additionally
// carry a `details` field with the underlying failure text.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client-caused validation failure, rejected before any store call.
    #[error("{0}")]
    Validation(String),
    /// Path id parameter did not parse as an integer.
    #[error("invalid task id")]
    InvalidId,
    /// Well-formed id with no matching row.
    #[error("task not found")]
    NotFound,
    /// Store/infrastructure failure. `message` is the stable client-facing
    /// text for the operation; `cause` is logged and surfaced as `details`.
    #[error("{message}")]
    Database {
        message: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn database(message: &'static str, cause: anyhow::Error) -> Self {
        Self::Database { message, cause }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::InvalidId => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid task id" }),
            ),
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": "Task not found" })),
            ApiError::Database { message, cause } => {
                let details = format!("{cause:#}");
                error!(err = %details, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": message, "details": details }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
