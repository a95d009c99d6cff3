//! HTTP API
//!
//! Maps requests onto the store: record submission, flush, snapshot listing,
//! download and deletion. Every data endpoint sits behind the API key guard.

pub mod auth;
pub mod http;
pub mod rest;
pub mod state;

pub use http::create_router;
pub use state::AppState;
