//! Common error types and handling for Medrelay

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Message returned to callers for every 500-class failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error while handling request";

/// Common result type
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Medrelay application
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Error::Unexpected(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Unexpected(_) => "UNEXPECTED_ERROR",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Error::BadGateway(_) => "BAD_GATEWAY",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message exposed to the caller.
    ///
    /// Client and upstream errors carry their own text; internal failures
    /// collapse to [`INTERNAL_ERROR_MESSAGE`] so nothing leaks.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg)
            | Error::ServiceUnavailable(msg)
            | Error::BadGateway(msg) => msg.clone(),
            Error::Unexpected(_)
            | Error::Database(_)
            | Error::Serialization(_)
            | Error::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log internal errors with full context
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
        }

        let body = Json(json!({
            "error": self.public_message(),
            "code": self.error_code(),
        }));

        (status, body).into_response()
    }
}
