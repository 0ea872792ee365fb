//! services/api/src/web/sync.rs
//!
//! One-shot sync flag kept in the meta collection.

use crate::error::ApiError;
use crate::web::schemas::SyncResponse;
use crate::web::state::AppState;
use axum::{extract::State, Json};
use classcom_core::domain::{Entity, Meta};
use classcom_core::ports::PortError;
use classcom_core::query::Filter;
use classcom_core::records;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const SYNCED_VALUE: &str = "true";

/// POST /api/admin/sync - Mark presentations as synced
#[utoipa::path(
    post,
    path = "/api/admin/sync",
    responses(
        (status = 200, description = "Sync state; `synced` is false only without a database", body = SyncResponse)
    )
)]
pub async fn sync_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncResponse>, ApiError> {
    let Some(store) = state.store.as_deref() else {
        return Ok(Json(SyncResponse {
            synced: false,
            message: Some("Database not configured".to_string()),
        }));
    };

    let filter = Filter::eq("key", Meta::SYNCED);
    match records::find_one::<Meta>(store, &filter).await? {
        Some(meta) if meta.record.value == SYNCED_VALUE => {
            return Ok(Json(SyncResponse {
                synced: true,
                message: Some("Already synced".to_string()),
            }));
        }
        Some(meta) => {
            store
                .update_one(Meta::COLLECTION, &Filter::Id(meta.id), json!({ "value": SYNCED_VALUE }))
                .await?;
        }
        None => {
            let flag = Meta {
                key: Meta::SYNCED.to_string(),
                value: SYNCED_VALUE.to_string(),
            };
            match records::insert(store, &flag).await {
                Ok(_) => {}
                // Another request set the flag first.
                Err(PortError::Conflict(_)) => {}
                Err(e) => warn!("Could not record the sync flag: {}", e),
            }
        }
    }

    info!("Presentations marked as synced.");
    Ok(Json(SyncResponse {
        synced: true,
        message: None,
    }))
}
