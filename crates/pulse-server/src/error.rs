use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type. Bodies follow
/// the wire contract the tracking script and API clients expect:
/// `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// The payload's URL does not contain its own domain — cross-site event
    /// injection from a misconfigured or malicious embed.
    #[error("Domain mismatch")]
    DomainMismatch,

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing `Authorization` header or non-Bearer scheme.
    #[error("unauthorized")]
    Unauthorized,

    /// Bearer key present but not found in the directory.
    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    /// Persistence failure while recording a tracking fact. The wire contract
    /// promises this exact message to the beacon; no fact is considered
    /// written when this is returned.
    #[error("Failed to process tracking request")]
    Storage(#[source] anyhow::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::DomainMismatch => {
                (StatusCode::BAD_REQUEST, "Domain mismatch".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized - Invalid API".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Unauthorized - Invalid API".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Storage(e) => {
                tracing::error!(error = %e, "Fact write failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process tracking request".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
