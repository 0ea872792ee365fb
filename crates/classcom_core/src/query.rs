//! crates/classcom_core/src/query.rs
//!
//! The small query vocabulary understood by every `DocumentStore` adapter:
//! filters over top-level document fields, a single-field sort, and index specs.

use crate::ports::Document;
use serde_json::Value;
use std::cmp::Ordering;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering of a result set by one top-level field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Compares two documents by the sort field. Missing fields sort first.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        let ordering = compare_values(a.body.get(&self.field), b.body.get(&self.field));
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A predicate over stored documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Id(Uuid),
    /// Field equality. `Eq(field, Value::Null)` also matches documents without the field.
    Eq(String, Value),
    Or(Vec<Filter>),
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn is_null(field: impl Into<String>) -> Self {
        Filter::Eq(field.into(), Value::Null)
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Id(id) => document.id == *id,
            Filter::Eq(field, Value::Null) => {
                matches!(document.body.get(field), None | Some(Value::Null))
            }
            Filter::Eq(field, value) => document.body.get(field) == Some(value),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(document)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
        }
    }
}

/// An index over one or more top-level fields of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub keys: Vec<(String, SortDirection)>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn unique(field: impl Into<String>) -> Self {
        Self {
            keys: vec![(field.into(), SortDirection::Ascending)],
            unique: true,
        }
    }

    pub fn compound<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = (S, SortDirection)>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(|(f, d)| (f.into(), d)).collect(),
            unique: false,
        }
    }

    /// A stable name derived from the collection and key fields, e.g. `student_roll_number_idx`.
    pub fn name(&self, collection: &str) -> String {
        let fields: Vec<&str> = self.keys.iter().map(|(f, _)| f.as_str()).collect();
        format!("{}_{}_idx", collection, fields.join("_"))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(f, _)| f.as_str())
    }
}

/// Total order over JSON values: missing/null < bool < number < string < array < object.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
