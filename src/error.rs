//! HTTP-facing error type and conversions from lower-layer errors.
//!
//! Every non-redirect failure is rendered as
//! `{"error": {"code": "...", "message": "...", "details": {...}}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::repositories::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Machine-readable error description returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, details: Value },
    #[error("{message}")]
    NotFound { message: String, details: Value },
    #[error("{message}")]
    Gone { message: String, details: Value },
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn gone(message: impl Into<String>, details: Value) -> Self {
        Self::Gone {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Status and machine-readable code for each variant.
    fn kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Gone { .. } => (StatusCode::GONE, "gone"),
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    fn parts(self) -> (StatusCode, ErrorInfo) {
        let (status, code) = self.kind();
        let (message, details) = match self {
            AppError::Validation { message, details }
            | AppError::NotFound { message, details }
            | AppError::Gone { message, details }
            | AppError::Internal { message, details } => (message, details),
        };

        (
            status,
            ErrorInfo {
                code,
                message,
                details,
            },
        )
    }

    /// HTTP status this error is rendered with.
    pub fn status(&self) -> StatusCode {
        self.kind().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateCode => AppError::internal(
                "Failed to allocate a unique short code",
                json!({ "reason": "duplicate_code" }),
            ),
            StoreError::Timeout => AppError::internal(
                "Record store unavailable",
                json!({ "reason": "timeout" }),
            ),
            StoreError::Unavailable(_) => AppError::internal(
                "Record store unavailable",
                json!({ "reason": "unavailable" }),
            ),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        AppError::bad_request(
            "Request validation failed",
            json!({ "fields": fields, "reason": e.to_string() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::bad_request("x", json!({})).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::not_found("x", json!({})).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::gone("x", json!({})).status(), StatusCode::GONE);
        assert_eq!(
            AppError::internal("x", json!({})).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_store_errors_are_server_errors() {
        for e in [
            StoreError::DuplicateCode,
            StoreError::Timeout,
            StoreError::Unavailable("refused".to_string()),
        ] {
            let app: AppError = e.into();
            assert_eq!(app.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_error_info_code() {
        let (status, info) = AppError::gone("Short URL has expired", json!({})).parts();
        assert_eq!(status, StatusCode::GONE);
        assert_eq!(info.code, "gone");
        assert_eq!(info.message, "Short URL has expired");
    }

    #[test]
    fn test_status_matches_rendered_status() {
        for e in [
            AppError::bad_request("x", json!({})),
            AppError::not_found("x", json!({})),
            AppError::gone("x", json!({})),
            AppError::internal("x", json!({})),
        ] {
            let status = e.status();
            assert_eq!(e.into_response().status(), status);
        }
    }
}
