//! crates/classcom_core/src/ports.rs
//!
//! Defines the storage contract for the application.
//! The trait forms the boundary of the hexagonal architecture, so the handlers
//! never depend on a specific database.

use crate::domain::Stored;
use crate::query::{Filter, IndexSpec, Sort};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from the underlying database.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// A write would have violated a unique index.
    #[error("Duplicate key: {0}")]
    Conflict(String),
    #[error("Malformed document: {0}")]
    InvalidDocument(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Documents
//=========================================================================================

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// A raw stored document: the store-generated id plus the JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub body: Value,
}

impl Document {
    /// Decodes the body into a typed record, keeping the id and timestamps.
    pub fn decode<T: DeserializeOwned>(self) -> PortResult<Stored<T>> {
        let created_at = read_timestamp(&self.body, CREATED_AT);
        let updated_at = read_timestamp(&self.body, UPDATED_AT);
        let record = serde_json::from_value(self.body)
            .map_err(|e| PortError::InvalidDocument(format!("document {}: {}", self.id, e)))?;
        Ok(Stored {
            id: self.id,
            record,
            created_at,
            updated_at,
        })
    }
}

/// Formats a timestamp the way every adapter stores it. The fixed precision
/// keeps lexicographic order equal to chronological order.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn read_timestamp(body: &Value, field: &str) -> Option<DateTime<Utc>> {
    body.get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

/// Sets `created_at` and `updated_at` on a document about to be inserted.
pub fn stamp_new_document(body: &mut Value, now: DateTime<Utc>) -> PortResult<()> {
    let object = body
        .as_object_mut()
        .ok_or_else(|| PortError::InvalidDocument("documents must be JSON objects".to_string()))?;
    let stamp = Value::String(format_timestamp(now));
    object.insert(CREATED_AT.to_string(), stamp.clone());
    object.insert(UPDATED_AT.to_string(), stamp);
    Ok(())
}

/// Shallow-merges `patch` into `body`, replacing top-level fields.
pub fn merge_patch(body: &mut Value, patch: &Value) -> PortResult<()> {
    let (Some(target), Some(fields)) = (body.as_object_mut(), patch.as_object()) else {
        return Err(PortError::InvalidDocument(
            "patches must be JSON objects".to_string(),
        ));
    };
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
    Ok(())
}

//=========================================================================================
// Store Port (Trait)
//=========================================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document, stamping its timestamps, and returns the new id.
    async fn insert(&self, collection: &str, document: Value) -> PortResult<Uuid>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> PortResult<Option<Document>>;

    /// Returns all matching documents, in insertion order unless a sort is given.
    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> PortResult<Vec<Document>>;

    /// Merges `patch` into the first matching document. Returns the matched count (0 or 1).
    async fn update_one(&self, collection: &str, filter: &Filter, patch: Value) -> PortResult<u64>;

    /// Deletes the first matching document. Returns the deleted count (0 or 1).
    async fn delete_one(&self, collection: &str, filter: &Filter) -> PortResult<u64>;

    async fn count(&self, collection: &str, filter: &Filter) -> PortResult<u64>;

    /// Creates the index if it does not exist yet.
    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> PortResult<()>;

    /// Names of the collections currently holding documents.
    async fn list_collections(&self) -> PortResult<Vec<String>>;

    /// A short human-readable name for the backend, used in diagnostics.
    fn describe(&self) -> String;
}
