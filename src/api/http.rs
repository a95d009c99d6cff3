//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::require_api_key;
use super::rest::{files, receipts};
use super::state::AppState;
use crate::utils::iso_utc_now;

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browser clients post from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let guarded = Router::new()
        .route("/submit", post(receipts::submit))
        .route("/flush", get(files::flush))
        .route("/list_snapshots", get(files::list_snapshots))
        .route("/get_file", get(files::get_file))
        .route(
            "/delete_file",
            get(files::delete_file).delete(files::delete_file),
        )
        .route("/api/receipts", post(receipts::receipts_json))
        .route("/api/receipts/upload", post(receipts::receipts_upload))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .merge(guarded)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn home() -> &'static str {
    "✅ Delivery receipt API is running!"
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "time": iso_utc_now(),
    }))
}
