use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use canvas_core::Error as CoreError;

/// Unified API error type mapping the six wire error kinds (spec §7) onto
/// HTTP status codes and the `{success: false, error}` envelope.
#[derive(Debug)]
pub enum ApiError {
    InvalidArgument(String),
    NotFound(String),
    Unavailable(String),
    Timeout(String),
    PeerError(String),
    Internal(String),
}

impl ApiError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn peer_error(msg: impl Into<String>) -> Self {
        Self::PeerError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_and_message(&self) -> (StatusCode, &str) {
        match self {
            ApiError::InvalidArgument(m) => (StatusCode::BAD_REQUEST, m.as_str()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.as_str()),
            ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.as_str()),
            ApiError::Timeout(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.as_str()),
            ApiError::PeerError(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.as_str()),
            ApiError::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m.as_str()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound(id) => ApiError::NotFound(format!("element not found: {id}")),
            CoreError::SnapshotNotFound(name) => {
                ApiError::NotFound(format!("snapshot not found: {name}"))
            }
            CoreError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            CoreError::Serialization(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        tracing::warn!(%status, "request failed: {message}");
        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
