//! # Response Envelope
//!
//! Every endpoint answers with the same JSON shape:
//! ```json
//! { "success": true,  "message": "Invoice created", "data": { ... } }
//! { "success": false, "message": "Not found", "error": "Invoice not found: 42" }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;

/// Envelope for successful responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip)]
    status: StatusCode,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 with data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: StatusCode::OK,
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 201 with the created resource.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            status: StatusCode::CREATED,
            ..Self::ok(message, data)
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ApiResponse<()> {
    /// 200 without data.
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            status: StatusCode::OK,
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Envelope for failed responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    pub error: String,
}

/// Handler result type.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;
