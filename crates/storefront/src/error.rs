//! Unified error handling for the storefront.
//!
//! Provides a unified `AppError` type mapped to JSON error responses. All
//! route handlers that can fail return `Result<T, AppError>`. Cart
//! operations never produce one of these: they are total and always
//! succeed (persistence failures are logged, not surfaced).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::backend::BackendError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Hosted backend operation failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body for error responses.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Backend(err) => match err {
                BackendError::NotFound(_) => StatusCode::NOT_FOUND,
                BackendError::RateLimited(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Internal and upstream details stay in the
    /// logs.
    fn client_message(&self) -> String {
        match self {
            Self::Backend(err) => match err {
                BackendError::NotFound(what) => format!("Not found: {what}"),
                BackendError::RateLimited(_) => "Service busy, try again shortly".to_string(),
                _ => "External service error".to_string(),
            },
            Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
        }

        (
            status,
            Json(ErrorBody {
                error: self.client_message(),
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_not_found_maps_to_404() {
        let err = AppError::Backend(BackendError::NotFound("product p1".to_string()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn backend_rate_limit_maps_to_503() {
        let err = AppError::Backend(BackendError::RateLimited(2));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn internal_error_hides_details() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn bad_request_passes_message_through() {
        let err = AppError::BadRequest("unknown sort key".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.client_message().contains("unknown sort key"));
    }
}
