pub mod db;
pub mod memory;

pub use db::PgDocumentStore;
pub use memory::MemoryDocumentStore;

use crate::config::{Config, StoreTarget};
use crate::error::ApiError;
use classcom_core::ports::DocumentStore;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Opens the store named by the configuration, or returns `None` when none is configured.
pub async fn connect(config: &Config) -> Result<Option<Arc<dyn DocumentStore>>, ApiError> {
    let Some(target) = config.store_target() else {
        return Ok(None);
    };

    match target {
        StoreTarget::Memory => {
            info!("Using the in-memory document store; data will not survive a restart.");
            Ok(Some(Arc::new(MemoryDocumentStore::new())))
        }
        StoreTarget::Postgres { url, database } => {
            info!("Connecting to database '{}'...", database);
            let options = PgConnectOptions::from_str(&url)?.database(&database);
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?;
            let store = PgDocumentStore::new(pool);
            info!("Running database migrations...");
            store.run_migrations().await?;
            info!("Database migrations complete.");
            Ok(Some(Arc::new(store)))
        }
    }
}
