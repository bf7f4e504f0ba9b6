//! API error type with JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use pd_core::error::PdError;

/// Errors returned by handlers and middleware.
#[derive(Debug)]
pub enum ApiError {
    /// Invalid input (400).
    BadRequest(String),
    /// Missing or invalid credentials (401).
    Unauthorized(String),
    /// Authenticated but not allowed (403).
    Forbidden(String),
    /// Resource not found (404).
    NotFound { resource: &'static str, id: String },
    /// Rate limit exceeded (429).
    TooManyRequests,
    /// Anything else (500, logged).
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            Self::BadRequest(m) => ("validation_error", m),
            Self::Unauthorized(m) => ("unauthorized", m),
            Self::Forbidden(m) => ("forbidden", m),
            Self::NotFound { resource, id } => ("not_found", format!("{resource} '{id}' not found")),
            Self::TooManyRequests => (
                "rate_limited",
                "too many messages, slow down".to_string(),
            ),
            Self::Internal(m) => {
                error!("internal error: {m}");
                ("internal_error", "an internal error occurred".to_string())
            }
        };
        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<PdError> for ApiError {
    fn from(e: PdError) -> Self {
        match e {
            PdError::Validation(m) => Self::BadRequest(m),
            PdError::NotFound { resource, id } => Self::NotFound { resource, id },
            PdError::PermissionDenied(m) => Self::Forbidden(m),
            PdError::AuthFailed(m) => Self::Unauthorized(m),
            other => Self::Internal(other.to_string()),
        }
    }
}
