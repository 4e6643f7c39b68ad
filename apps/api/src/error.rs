//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Steel POS                              │
//! │                                                                         │
//! │  Handler  Result<ApiResponse<T>, ApiError>                              │
//! │     │                                                                   │
//! │     ├── DbError::NotFound ─────────────────────────► 404 NOT_FOUND      │
//! │     ├── DbError::UniqueViolation ──────────────────► 409 CONFLICT       │
//! │     ├── DbError::Rule(CoreError::Validation) ──────► 400 VALIDATION     │
//! │     ├── DbError::Rule(CoreError::Conflict) ────────► 409 CONFLICT       │
//! │     ├── missing / bad bearer token ────────────────► 401 UNAUTHENTICATED│
//! │     ├── role too low ──────────────────────────────► 403 FORBIDDEN      │
//! │     └── QueryFailed, PoolExhausted, ... ───────────► 500 (logged,       │
//! │                                                       generic message)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Shape
//! ```json
//! {
//!   "success": false,
//!   "message": "Not found",
//!   "error": "Invoice not found: 42"
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use steel_core::{CoreError, ValidationError};
use steel_db::DbError;

use crate::response::ErrorBody;

/// Error returned from handlers and extractors.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Machine-readable classification, decides the HTTP status
    pub code: ErrorCode,

    /// Human-readable detail, sent as `error`
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing or invalid bearer token (401)
    Unauthenticated,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// State conflict or duplicate (409)
    Conflict,

    /// Persistence or unknown failure (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope `message` for this class of error.
    pub fn summary(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "Validation failed",
            ErrorCode::Unauthenticated => "Authentication required",
            ErrorCode::Forbidden => "Permission denied",
            ErrorCode::NotFound => "Not found",
            ErrorCode::Conflict => "Conflict",
            ErrorCode::Internal => "Internal server error",
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Rule(core) => ApiError::from(core),
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::internal("Database is busy, try again")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::internal("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotFound { entity, id } => ApiError::not_found(entity, id),
            CoreError::Conflict(message) => ApiError::new(ErrorCode::Conflict, message),
            CoreError::Validation(e) => ApiError::from(e),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.code.summary().to_string(),
            error: self.message,
        };
        (self.code.status(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use steel_core::import_order::NOT_PENDING;

    #[test]
    fn test_db_error_mapping() {
        let cases = [
            (DbError::not_found("Invoice", 42), StatusCode::NOT_FOUND),
            (DbError::duplicate("sku", "HOP-40X80"), StatusCode::CONFLICT),
            (DbError::conflict(NOT_PENDING), StatusCode::CONFLICT),
            (
                DbError::from(ValidationError::Required { field: "items".into() }),
                StatusCode::BAD_REQUEST,
            ),
            (DbError::QueryFailed("disk I/O error".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code.status(), status);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::from(DbError::QueryFailed("no such table: invoices".into()));
        assert_eq!(err.message, "Database operation failed");
    }

    #[test]
    fn test_conflict_keeps_message() {
        let err = ApiError::from(DbError::conflict(NOT_PENDING));
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.message, NOT_PENDING);
    }
}
