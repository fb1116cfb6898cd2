//! API error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Error type returned by all handlers
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    ProviderUnavailable(String),
    ProviderFailed(String),
    Internal(String),
}

impl From<reflect_core::Error> for ApiError {
    fn from(err: reflect_core::Error) -> Self {
        match err {
            reflect_core::Error::Validation(msg) => ApiError::BadRequest(msg),
            reflect_core::Error::EntryNotFound(id) => {
                ApiError::NotFound(format!("entry {} not found", id))
            }
            reflect_core::Error::Provider(msg) => ApiError::ProviderFailed(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ProviderUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::ProviderFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
