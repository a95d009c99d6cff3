//! API key authentication
//!
//! Guarded requests must carry the configured secret:
//!
//! ```bash
//! curl -X POST http://localhost:10000/submit \
//!   -H "X-API-Key: $API_KEY" \
//!   -H "Content-Type: application/json" \
//!   -d '{"voucher":"00012","box":"B4","site":"ATH"}'
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::rest::ApiError;
use super::state::AppState;

/// Header carrying the shared secret
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Compares a request header against the configured key
#[derive(Clone)]
pub struct ApiKeyAuth {
    key: String,
}

impl ApiKeyAuth {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// An empty configured key authorizes nothing
    pub fn is_enabled(&self) -> bool {
        !self.key.is_empty()
    }

    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if !self.is_enabled() {
            return false;
        }

        headers
            .get(API_KEY_HEADER)
            .map(|value| constant_time_eq(value.as_bytes(), self.key.as_bytes()))
            .unwrap_or(false)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Middleware rejecting requests without a valid API key
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if state.auth.is_authorized(req.headers()) {
        return next.run(req).await;
    }

    debug!(path = %req.uri().path(), "Rejected unauthorized request");
    ApiError::unauthorized().into_response()
}
