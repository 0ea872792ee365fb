//! crates/classcom_core/src/records.rs
//!
//! Typed helpers over a `DocumentStore`: they pick the collection from the
//! record type and decode the returned documents.

use crate::domain::{Entity, Stored};
use crate::ports::{DocumentStore, PortError, PortResult};
use crate::query::{Filter, Sort};
use uuid::Uuid;

pub async fn insert<T: Entity>(store: &dyn DocumentStore, record: &T) -> PortResult<Uuid> {
    let body = serde_json::to_value(record)
        .map_err(|e| PortError::InvalidDocument(e.to_string()))?;
    store.insert(T::COLLECTION, body).await
}

pub async fn find_one<T: Entity>(
    store: &dyn DocumentStore,
    filter: &Filter,
) -> PortResult<Option<Stored<T>>> {
    store
        .find_one(T::COLLECTION, filter)
        .await?
        .map(|d| d.decode())
        .transpose()
}

pub async fn find_many<T: Entity>(
    store: &dyn DocumentStore,
    filter: &Filter,
    sort: Option<&Sort>,
) -> PortResult<Vec<Stored<T>>> {
    store
        .find_many(T::COLLECTION, filter, sort)
        .await?
        .into_iter()
        .map(|d| d.decode())
        .collect()
}

/// Fetches a record by id, failing with `NotFound` when it does not exist.
pub async fn get<T: Entity>(store: &dyn DocumentStore, id: Uuid) -> PortResult<Stored<T>> {
    find_one(store, &Filter::Id(id))
        .await?
        .ok_or_else(|| PortError::NotFound(format!("{} {}", T::COLLECTION, id)))
}
