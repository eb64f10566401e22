//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::client::SourceError;
use crate::session::{AuthError, SessionError};
use crate::views::ViewError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// No logged-in session
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Record source failed
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Session state error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Page model could not be built
    #[error(transparent)]
    View(#[from] ViewError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Source(e) => match e {
                SourceError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "SOURCE_TIMEOUT"),
                SourceError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "SOURCE_UNAVAILABLE"),
                SourceError::Api { status: 404, .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                SourceError::Config(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "SOURCE_CONFIG_ERROR")
                }
                _ => (StatusCode::BAD_GATEWAY, "SOURCE_ERROR"),
            },
            ApiError::Session(e) => match e {
                SessionError::Auth(AuthError::InvalidCredentials) => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
                }
                SessionError::Auth(AuthError::NotLoggedIn) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED")
                }
                SessionError::NoSelection => (StatusCode::BAD_REQUEST, "NO_SELECTION"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR"),
            },
            ApiError::View(ViewError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Source(SourceError::Timeout), StatusCode::GATEWAY_TIMEOUT),
            (ApiError::Source(SourceError::Unavailable), StatusCode::SERVICE_UNAVAILABLE),
            (
                ApiError::Source(SourceError::Api {
                    status: 500,
                    message: String::new(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::Session(SessionError::Auth(AuthError::InvalidCredentials)),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::View(ViewError::NotFound {
                    kind: "HCP",
                    key: "x".into(),
                }),
                StatusCode::NOT_FOUND,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
