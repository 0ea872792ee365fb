//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DocumentStore` port. Selected with
//! `DATABASE_URL=memory://` for local runs and used by the test suite.

use async_trait::async_trait;
use chrono::Utc;
use classcom_core::ports::{
    merge_patch, stamp_new_document, Document, DocumentStore, PortError, PortResult,
};
use classcom_core::query::{Filter, IndexSpec, Sort};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collection {
    documents: Vec<Document>,
    /// Field lists of the unique indexes on this collection.
    unique_keys: Vec<Vec<String>>,
}

impl Collection {
    /// Returns the first unique index `candidate` would violate, ignoring the document `skip`.
    fn violated_index(&self, candidate: &Value, skip: Option<Uuid>) -> Option<String> {
        self.unique_keys.iter().find_map(|fields| {
            let key: Vec<Option<&Value>> = fields.iter().map(|f| candidate.get(f)).collect();
            let taken = self.documents.iter().any(|doc| {
                Some(doc.id) != skip
                    && fields.iter().map(|f| doc.body.get(f)).eq(key.iter().copied())
            });
            taken.then(|| fields.join(", "))
        })
    }
}

/// Documents grouped by collection name, behind an async read/write lock.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, mut document: Value) -> PortResult<Uuid> {
        stamp_new_document(&mut document, Utc::now())?;
        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_default();
        if let Some(index) = entry.violated_index(&document, None) {
            return Err(PortError::Conflict(format!("{} ({})", collection, index)));
        }
        let id = Uuid::new_v4();
        entry.documents.push(Document { id, body: document });
        Ok(id)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> PortResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.documents.iter().find(|d| filter.matches(d)))
            .cloned())
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> PortResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .filter(|d| filter.matches(d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        if let Some(sort) = sort {
            // Stable sort keeps insertion order among equal keys.
            documents.sort_by(|a, b| sort.compare(a, b));
        }
        Ok(documents)
    }

    async fn update_one(&self, collection: &str, filter: &Filter, patch: Value) -> PortResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let Some(position) = entry.documents.iter().position(|d| filter.matches(d)) else {
            return Ok(0);
        };

        let mut updated = entry.documents[position].body.clone();
        merge_patch(&mut updated, &patch)?;
        let id = entry.documents[position].id;
        if let Some(index) = entry.violated_index(&updated, Some(id)) {
            return Err(PortError::Conflict(format!("{} ({})", collection, index)));
        }
        entry.documents[position].body = updated;
        Ok(1)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> PortResult<u64> {
        let mut collections = self.collections.write().await;
        let Some(entry) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match entry.documents.iter().position(|d| filter.matches(d)) {
            Some(position) => {
                entry.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, collection: &str, filter: &Filter) -> PortResult<u64> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|c| c.documents.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> PortResult<()> {
        if !index.unique {
            return Ok(());
        }
        let fields: Vec<String> = index.fields().map(str::to_string).collect();
        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_default();
        if entry.unique_keys.contains(&fields) {
            return Ok(());
        }

        let mut seen: Vec<Vec<Option<&Value>>> = Vec::new();
        for doc in &entry.documents {
            let key: Vec<Option<&Value>> = fields.iter().map(|f| doc.body.get(f)).collect();
            if seen.contains(&key) {
                return Err(PortError::Conflict(format!(
                    "cannot create {}: duplicate values",
                    index.name(collection)
                )));
            }
            seen.push(key);
        }
        entry.unique_keys.push(fields);
        Ok(())
    }

    async fn list_collections(&self) -> PortResult<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections
            .iter()
            .filter(|(_, c)| !c.documents.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
