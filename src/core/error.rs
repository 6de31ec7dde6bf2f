//! Error type system for the Mashebi API
//!
//! This module provides:
//! - A single error enum shared by handlers, repositories and services
//! - HTTP status code mapping
//! - JSON error bodies with trace IDs
//! - Redaction of infrastructure detail in external responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Message returned to clients for every 5xx response
pub const GENERIC_SERVER_ERROR: &str = "An internal error occurred. Please try again later.";

/// Message returned for every failed credential check
pub const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Main error type for the Mashebi API
#[derive(Debug, thiserror::Error)]
pub enum MashebiError {
    // System-level errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    /// The password verification SQL function is not registered on the connection
    #[error("Password verification primitive unavailable: {0}")]
    VerifierUnavailable(String),

    #[error("Password hashing error: {0}")]
    HashingError(String),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // API-related errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Token error: {0}")]
    TokenError(String),
}

impl MashebiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            MashebiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,

            MashebiError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,

            MashebiError::NotFound(_) => StatusCode::NOT_FOUND,

            MashebiError::ConfigError(_)
            | MashebiError::DatabaseError(_)
            | MashebiError::PoolError(_)
            | MashebiError::VerifierUnavailable(_)
            | MashebiError::HashingError(_)
            | MashebiError::TaskError(_)
            | MashebiError::IoError(_)
            | MashebiError::TokenError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name used in logs
    pub fn error_type(&self) -> &'static str {
        match self {
            MashebiError::ConfigError(_) => "ConfigError",
            MashebiError::DatabaseError(_) => "DatabaseError",
            MashebiError::PoolError(_) => "PoolError",
            MashebiError::VerifierUnavailable(_) => "VerifierUnavailable",
            MashebiError::HashingError(_) => "HashingError",
            MashebiError::TaskError(_) => "TaskError",
            MashebiError::IoError(_) => "IoError",
            MashebiError::InvalidRequest(_) => "InvalidRequest",
            MashebiError::AuthenticationError(_) => "AuthenticationError",
            MashebiError::NotFound(_) => "NotFound",
            MashebiError::TokenError(_) => "TokenError",
        }
    }

    /// Whether this error is a server-side fault whose detail must stay internal
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Classify a rusqlite error raised by a query that calls `verify_password`
    ///
    /// A connection without the function fails at prepare time with
    /// "no such function"; everything else stays a plain database error.
    pub fn from_verification_query(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("no such function") => {
                MashebiError::VerifierUnavailable(msg.clone())
            }
            _ => MashebiError::DatabaseError(err),
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response with a generated trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            trace_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create the external view of an error
    ///
    /// Client errors carry their message; server errors collapse to a
    /// generic body.
    pub fn from_error(error: &MashebiError) -> Self {
        match error {
            MashebiError::InvalidRequest(msg)
            | MashebiError::AuthenticationError(msg)
            | MashebiError::NotFound(msg) => Self::new(error.error_type().to_string(), msg.clone()),
            _ => Self::new(
                "InternalError".to_string(),
                GENERIC_SERVER_ERROR.to_string(),
            ),
        }
    }
}

impl IntoResponse for MashebiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if self.is_internal() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::debug!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with MashebiError
pub type Result<T> = std::result::Result<T, MashebiError>;
