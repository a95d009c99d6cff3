//! Shared application state

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::store::{AppendCoordinator, StoreError, StoreResult};

use super::auth::ApiKeyAuth;

/// State shared by all handlers
pub struct AppState {
    /// The store; cloned into blocking tasks
    pub store: Arc<AppendCoordinator>,
    pub auth: ApiKeyAuth,
    pub config: ServiceConfig,
}

impl AppState {
    /// Open the store described by `config`
    pub fn new(config: ServiceConfig) -> StoreResult<Self> {
        let store = AppendCoordinator::open(config.layout.clone(), config.fields.clone())?;

        Ok(Self {
            store: Arc::new(store),
            auth: ApiKeyAuth::new(config.api_key.clone()),
            config,
        })
    }

    /// Run a store call on the blocking pool
    pub async fn with_store<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&AppendCoordinator) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}
