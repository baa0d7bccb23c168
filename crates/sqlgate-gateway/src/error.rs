//! Error handling for the gateway.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlgate_core::{ErrorClass, ErrorKind};
use thiserror::Error;
use tracing::error;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Identity headers missing or malformed.
    #[error("{0}")]
    Unauthenticated(String),

    /// Request could not be parsed.
    #[error("{message}")]
    BadRequest {
        /// Error code.
        kind: ErrorKind,
        /// Error message.
        message: String,
    },

    /// Error raised by the core.
    #[error("{error}")]
    Core {
        /// The core error.
        error: sqlgate_core::Error,
        /// Whether database details may be shown.
        expose_details: bool,
    },
}

impl AppError {
    /// Wrap a core error.
    pub fn core(error: sqlgate_core::Error, expose_details: bool) -> Self {
        AppError::Core {
            error,
            expose_details,
        }
    }

    /// Malformed filter or query parameter.
    pub fn invalid_filter(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            kind: ErrorKind::InvalidFilter,
            message: message.into(),
        }
    }

    /// Malformed body.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            kind: ErrorKind::InvalidPayload,
            message: message.into(),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// Human-readable message.
    pub message: String,
    /// Error code.
    pub code: String,
    /// Database error text, when exposure is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            AppError::Unauthenticated(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED".to_string(), msg, None)
            }
            AppError::BadRequest { kind, message } => {
                (StatusCode::BAD_REQUEST, kind.as_str().to_string(), message, None)
            }
            AppError::Core {
                error,
                expose_details,
            } => {
                let status = match error.class() {
                    ErrorClass::PolicyDenial => StatusCode::FORBIDDEN,
                    ErrorClass::Validation => StatusCode::BAD_REQUEST,
                    ErrorClass::Execution => {
                        error!(error = %error, "database operation failed");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let details = (expose_details && error.class() == ErrorClass::Execution)
                    .then(|| error.to_string());
                (
                    status,
                    error.kind().as_str().to_string(),
                    error.public_message(),
                    details,
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            message,
            code,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::invalid_payload(format!("JSON error: {}", err.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(err: QueryRejection) -> Self {
        AppError::invalid_filter(format!("query error: {}", err.body_text()))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::invalid_filter(format!("JSON error: {}", err))
    }
}
