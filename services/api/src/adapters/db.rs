//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. Every collection lives in one
//! `documents` table as JSONB, accessed through `sqlx`.

use async_trait::async_trait;
use chrono::Utc;
use classcom_core::ports::{stamp_new_document, Document, DocumentStore, PortError, PortResult};
use classcom_core::query::{Filter, IndexSpec, Sort, SortDirection};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port on PostgreSQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Record Struct and Helpers
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    body: Json<Value>,
}
impl DocumentRecord {
    fn to_domain(self) -> Document {
        Document {
            id: self.id,
            body: self.body.0,
        }
    }
}

fn map_sqlx(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            PortError::Conflict(db.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

/// Appends `filter` as a parenthesised SQL condition over the `body` column.
/// Field names and values are always bound as parameters.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    match filter {
        Filter::All => {
            qb.push("TRUE");
        }
        Filter::Id(id) => {
            qb.push("id = ").push_bind(*id);
        }
        Filter::Eq(field, Value::Null) => {
            qb.push("(body -> ")
                .push_bind(field.clone())
                .push(" IS NULL OR body -> ")
                .push_bind(field.clone())
                .push(" = 'null'::jsonb)");
        }
        Filter::Eq(field, value) => {
            qb.push("body -> ")
                .push_bind(field.clone())
                .push(" = ")
                .push_bind(Json(value.clone()));
        }
        Filter::Or(filters) => push_group(qb, filters, " OR ", "FALSE"),
        Filter::And(filters) => push_group(qb, filters, " AND ", "TRUE"),
    }
}

fn push_group(qb: &mut QueryBuilder<'_, Postgres>, filters: &[Filter], joiner: &str, empty: &str) {
    if filters.is_empty() {
        qb.push(empty);
        return;
    }
    qb.push("(");
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            qb.push(joiner);
        }
        qb.push("(");
        push_filter(qb, filter);
        qb.push(")");
    }
    qb.push(")");
}

/// Appends ` WHERE collection = $n AND (<filter>)`.
fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    qb.push(" WHERE collection = ")
        .push_bind(collection.to_string())
        .push(" AND (");
    push_filter(qb, filter);
    qb.push(")");
}

/// Starts `<prefix> WHERE collection = $1 AND (<filter>)`.
fn scoped<'a>(prefix: &str, collection: &str, filter: &Filter) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(prefix);
    push_scope(&mut qb, collection, filter);
    qb
}

/// Appends a subquery selecting the id of the first matching document, for
/// single-document writes.
fn push_first_match(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    qb.push("SELECT id FROM documents");
    push_scope(qb, collection, filter);
    qb.push(" ORDER BY created_at, id LIMIT 1");
}

/// Index DDL cannot take bind parameters, so names are restricted to identifier characters.
fn checked_identifier(name: &str) -> PortResult<&str> {
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(PortError::Unexpected(format!("invalid identifier '{}'", name)))
    }
}

fn index_sql(collection: &str, index: &IndexSpec) -> PortResult<String> {
    let collection = checked_identifier(collection)?;
    let mut keys = Vec::with_capacity(index.keys.len());
    for (field, direction) in &index.keys {
        let field = checked_identifier(field)?;
        let order = match direction {
            SortDirection::Ascending => "",
            SortDirection::Descending => " DESC",
        };
        keys.push(format!("(body ->> '{}'){}", field, order));
    }
    Ok(format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON documents ({}) WHERE collection = '{}'",
        if index.unique { "UNIQUE " } else { "" },
        index.name(collection),
        keys.join(", "),
        collection,
    ))
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn insert(&self, collection: &str, mut document: Value) -> PortResult<Uuid> {
        let now = Utc::now();
        stamp_new_document(&mut document, now)?;
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO documents (id, collection, body, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(collection)
        .bind(Json(document))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(id)
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> PortResult<Option<Document>> {
        let mut qb = scoped("SELECT id, body FROM documents", collection, filter);
        qb.push(" ORDER BY created_at, id LIMIT 1");
        let record = qb
            .build_query_as::<DocumentRecord>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(record.map(DocumentRecord::to_domain))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> PortResult<Vec<Document>> {
        let mut qb = scoped("SELECT id, body FROM documents", collection, filter);
        qb.push(" ORDER BY ");
        if let Some(sort) = sort {
            qb.push("body -> ").push_bind(sort.field.clone());
            qb.push(match sort.direction {
                SortDirection::Ascending => " ASC NULLS FIRST, ",
                SortDirection::Descending => " DESC NULLS LAST, ",
            });
        }
        qb.push("created_at, id");
        let records = qb
            .build_query_as::<DocumentRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(records.into_iter().map(DocumentRecord::to_domain).collect())
    }

    async fn update_one(&self, collection: &str, filter: &Filter, patch: Value) -> PortResult<u64> {
        if !patch.is_object() {
            return Err(PortError::InvalidDocument(
                "patches must be JSON objects".to_string(),
            ));
        }
        let mut qb = QueryBuilder::new("UPDATE documents SET body = body || ");
        qb.push_bind(Json(patch)).push(" WHERE id = (");
        push_first_match(&mut qb, collection, filter);
        qb.push(")");
        let result = qb.build().execute(&self.pool).await.map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> PortResult<u64> {
        let mut qb = QueryBuilder::new("DELETE FROM documents WHERE id = (");
        push_first_match(&mut qb, collection, filter);
        qb.push(")");
        let result = qb.build().execute(&self.pool).await.map_err(map_sqlx)?;
        Ok(result.rows_affected())
    }

    async fn count(&self, collection: &str, filter: &Filter) -> PortResult<u64> {
        let mut qb = scoped("SELECT COUNT(*) FROM documents", collection, filter);
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(count.max(0) as u64)
    }

    async fn ensure_index(&self, collection: &str, index: &IndexSpec) -> PortResult<()> {
        let sql = index_sql(collection, index)?;
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }

    async fn list_collections(&self) -> PortResult<Vec<String>> {
        sqlx::query_scalar("SELECT DISTINCT collection FROM documents ORDER BY collection")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    fn describe(&self) -> String {
        "postgres".to_string()
    }
}
