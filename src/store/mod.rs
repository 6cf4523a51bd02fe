//! Document store abstraction.
//!
//! Every collection the portal touches (`forms`, `project-approve`, `Task`,
//! `teacher`, `users`, `project-availability`) is a set of schemaless JSON
//! documents addressed by opaque string ids. Routes talk to the store only
//! through [`DocumentStore`], so the same handlers run against Postgres in
//! production and against [`MemoryStore`] in tests and local development.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub type Fields = Map<String, Value>;

// ============================================================================
// Collections
// ============================================================================

pub mod collections {
    pub const FORMS: &str = "forms";
    pub const PROJECTS: &str = "project-approve";
    pub const TASKS: &str = "Task";
    pub const TEACHERS: &str = "teacher";
    pub const USERS: &str = "users";
    pub const AVAILABILITY: &str = "project-availability";
}

// ============================================================================
// Documents and queries
// ============================================================================

/// A stored document with its id and write version.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
    /// Starts at 1 and increases by one on every successful update.
    pub version: i64,
}

impl Document {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// The document body flattened together with its id under `"id"`.
    ///
    /// A stored `id` field takes precedence over the document id; user
    /// records carry their auth uid there.
    pub fn into_json_with_id(self) -> Value {
        let mut data = self.data;
        data.entry("id").or_insert(Value::String(self.id));
        Value::Object(data)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    /// Matches string fields starting with the given prefix.
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Prefix(prefix.into()),
        }
    }

    pub fn matches(&self, data: &Fields) -> bool {
        let Some(value) = data.get(&self.field) else {
            return false;
        };
        match &self.op {
            FilterOp::Eq(expected) => value == expected,
            FilterOp::Prefix(prefix) => value
                .as_str()
                .map(|s| s.starts_with(prefix.as_str()))
                .unwrap_or(false),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {collection}/{id} not found")]
    NotFound { collection: String, id: String },

    #[error("version conflict: expected {expected}, found {actual}")]
    VersionConflict { expected: i64, actual: i64 },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Backend(format!("invalid document body: {}", err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================================
// Store trait
// ============================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// All documents matching every filter, ordered by id.
    async fn list(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>>;

    /// Insert under a freshly generated id.
    async fn insert(&self, collection: &str, data: Fields) -> StoreResult<Document>;

    /// Create or replace the document at `id`. Replacing bumps the version.
    async fn set(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document>;

    /// Shallow-merge `patch` into the document's top-level fields.
    ///
    /// When `expected_version` is set the write only happens if the stored
    /// version still equals it; otherwise `StoreError::VersionConflict`.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
        expected_version: Option<i64>,
    ) -> StoreResult<Document>;

    /// Returns whether the document existed.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Delete every match in a single batch, returning how many were removed.
    async fn delete_where(&self, collection: &str, filters: &[Filter]) -> StoreResult<usize>;
}

pub(crate) fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
