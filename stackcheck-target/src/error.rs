//! Error types for the target service.
//!
//! [`TargetError`] covers startup and configuration failures. [`ApiError`]
//! is returned by HTTP handlers and rendered as `{"message": ...}` with the
//! matching status code.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Startup / runtime failures of the target service process.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// Invalid configuration value.
    #[error("invalid config: {field}: {reason}")]
    Config { field: String, reason: String },

    /// A listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Server(String),

    /// Other I/O failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handler-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorBody {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
