//! REST endpoints
//!
//! - `POST /submit` - Append a record to today's file
//! - `POST /api/receipts` - Same, legacy JSON response shape
//! - `POST /api/receipts/upload` - Same, from multipart form data
//! - `GET /flush` - Download the oldest snapshot, rotating if none exist
//! - `GET /list_snapshots` - Snapshot names, oldest first
//! - `GET /get_file?filename=` - Download a snapshot or live file
//! - `GET|DELETE /delete_file?filename=` - Delete a snapshot

pub mod files;
pub mod receipts;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::store::StoreError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            error: message.into(),
            code: code.to_string(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "unauthorized")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::MissingField(field) => {
                ApiError::bad_request(format!("Missing {}", field))
            }
            StoreError::InvalidName(name) => {
                ApiError::bad_request(format!("Invalid filename: {}", name))
            }
            StoreError::NotFound(_) => ApiError::not_found("File not found"),
            StoreError::Refused(_) => ApiError::forbidden("Refuse to delete daily file"),
            other => {
                error!(error = %other, "Store operation failed");
                ApiError::internal()
            }
        }
    }
}
