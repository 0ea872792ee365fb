//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::error::ApiError;
use classcom_core::ports::DocumentStore;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no database is configured or it could not be reached at startup.
    pub store: Option<Arc<dyn DocumentStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn DocumentStore>>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// The store, or `StoreUnavailable` for handlers that cannot work without one.
    pub fn store(&self) -> Result<&dyn DocumentStore, ApiError> {
        self.store.as_deref().ok_or(ApiError::StoreUnavailable)
    }
}
