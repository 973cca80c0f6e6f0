//! Error types for the RegPortal Engine
//!
//! - `thiserror` for ergonomic error definitions
//! - Domain-specific variants so the HTTP boundary can map failures to status codes
//! - Internal details never reach a response body

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for RegPortal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the RegPortal Engine
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration error: {message}")]
    Config { message: Cow<'static, str> },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    // ========================================================================
    // Input Errors
    // ========================================================================
    #[error("Invalid input for {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: Cow<'static, str>,
    },

    #[error("Bad request: {message}")]
    BadRequest { message: Cow<'static, str> },

    // ========================================================================
    // Catalog Errors
    // ========================================================================
    #[error("Catalog error: {message}")]
    Catalog {
        message: Cow<'static, str>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid input error for a named field
    pub fn invalid_input(field: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a catalog error with source
    pub fn catalog_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Catalog {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } | Error::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } | Error::InvalidConfig { .. } => "CONFIG_ERROR",
            Error::InvalidInput { .. } => "INVALID_INPUT",
            Error::BadRequest { .. } => "BAD_REQUEST",
            Error::Catalog { .. } => "CATALOG_ERROR",
            Error::Io(_) => "IO_ERROR",
        }
    }
}

// ============================================================================
// Error Response for API
// ============================================================================

/// API error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        }

        // Don't expose internal error details
        let (code, message) = if status == StatusCode::INTERNAL_SERVER_ERROR {
            ("INTERNAL_ERROR", "An internal error occurred".to_string())
        } else {
            (self.error_code(), self.to_string())
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            Error::invalid_input("athleteId", "missing").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::bad_request("invalid").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::config("bad port").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_client_errors_keep_their_message() {
        let response = Error::invalid_input("athleteId", "athlete id is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("athleteId"));
    }

    #[tokio::test]
    async fn test_internal_errors_are_masked() {
        let err = Error::catalog_with_source(
            "failed to read /srv/secret/events.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("/srv/secret"));
    }
}
