use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unique error codes for client identification
#[derive(Debug, Clone, Copy)]
pub enum ErrorCode {
    // Validation errors (2xxx)
    ValidationFailed = 2001,
    InvalidFormat = 2003,

    // External service errors (5xxx)
    ModelUnavailable = 5001,
    SearchFailed = 5002,
    EmailDeliveryFailed = 5003,

    // Resource errors (6xxx)
    NotFound = 6001,

    // Document errors (7xxx)
    PdfParseFailed = 7001,

    // Internal errors (9xxx)
    InternalError = 9001,
    ConfigurationError = 9002,
    StorageError = 9003,
}

impl ErrorCode {
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }
}

/// Service-wide error type with HTTP mapping
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    // External service errors
    #[error("Completion model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Web search failed: {0}")]
    SearchFailed(String),

    #[error("Email delivery failed: {0}")]
    EmailDeliveryFailed(String),

    // Resource errors
    #[error("Resource not found: {resource_type} with id {resource_id}")]
    NotFound {
        resource_type: String,
        resource_id: String,
    },

    // Document errors
    #[error("PDF parsing failed for {path}: {message}")]
    PdfParseError { path: String, message: String },

    // Internal errors
    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    StorageError(#[from] std::io::Error),
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ValidationError(_) => ErrorCode::ValidationFailed,
            Self::InvalidFormat(_) => ErrorCode::InvalidFormat,
            Self::ModelUnavailable(_) => ErrorCode::ModelUnavailable,
            Self::SearchFailed(_) => ErrorCode::SearchFailed,
            Self::EmailDeliveryFailed(_) => ErrorCode::EmailDeliveryFailed,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::PdfParseError { .. } => ErrorCode::PdfParseFailed,
            Self::InternalError(_) => ErrorCode::InternalError,
            Self::ConfigError(_) => ErrorCode::ConfigurationError,
            Self::StorageError(_) => ErrorCode::StorageError,
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidFormat(_) => StatusCode::BAD_REQUEST,
            Self::ModelUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::SearchFailed(_) => StatusCode::BAD_GATEWAY,
            Self::EmailDeliveryFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PdfParseError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log based on severity
        match &self {
            AppError::ValidationError(_)
            | AppError::InvalidFormat(_)
            | AppError::NotFound { .. } => {
                tracing::debug!(error_code = error_code.as_u16(), %message, "Client error");
            }
            AppError::ModelUnavailable(_) | AppError::SearchFailed(_) => {
                tracing::warn!(error_code = error_code.as_u16(), %message, "Upstream error");
            }
            _ => {
                tracing::error!(error_code = error_code.as_u16(), %message, error = ?self, "Server error");
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code.as_u16(),
                "status": status.as_u16(),
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Helper macro for creating NotFound errors
#[macro_export]
macro_rules! not_found {
    ($resource_type:expr, $resource_id:expr) => {
        $crate::errors::AppError::NotFound {
            resource_type: $resource_type.to_string(),
            resource_id: $resource_id.to_string(),
        }
    };
}
