//! Document Store Module
//!
//! Persistence for every document in the system (modules, workspaces,
//! boards, groups, items, users). Documents are JSON objects addressed by
//! `(collection, id)`.
//!
//! # Backends
//!
//! - **`MemoryStore`** - In-process maps; used by tests and when no
//!   `DATABASE_URL` is configured
//! - **`PgStore`** - PostgreSQL with one JSONB `documents` table
//!
//! # Array Operations
//!
//! Parents reference children through id arrays. `push_to_array` and
//! `pull_from_array` mutate those arrays in a single store operation, so two
//! concurrent "add child" calls can never drop one another's push.
//!
//! Arrays of objects (workspace members, the notification inbox) are keyed
//! by one field of their elements and use the `*_keyed` / `patch_elements`
//! operations instead.
//!
//! Updates never rewrite a whole document: `merge_fields` replaces only the
//! top-level keys it is given, so array operations racing with an update
//! are kept.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub mod document;
pub mod memory;
pub mod postgres;

pub use document::Document;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Fixed collection names (item collections come from `ItemKind::collection`)
pub mod collections {
    pub const MODULES: &str = "modules";
    pub const WORKSPACES: &str = "workspaces";
    pub const BOARDS: &str = "boards";
    pub const GROUPS: &str = "groups";
    pub const USERS: &str = "users";
}

/// Document store failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend-specific failure (connection, query, ...)
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Insert with an id that already exists in the collection
    #[error("Document {id} already exists in {collection}")]
    Duplicate {
        collection: String,
        id: Uuid,
    },

    /// Array operation on a field that holds something else
    #[error("Field '{field}' of {collection}/{id} is not an array")]
    NotAnArray {
        collection: String,
        id: Uuid,
        field: String,
    },

    /// A stored document could not be (de)serialized
    #[error("Document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Selects the array elements whose `key` field equals `value`
#[derive(Debug, Clone, Copy)]
pub struct ElementMatch<'a> {
    pub key: &'a str,
    pub value: &'a Value,
}

impl<'a> ElementMatch<'a> {
    pub fn new(key: &'a str, value: &'a Value) -> Self {
        Self { key, value }
    }

    pub fn matches(&self, element: &Value) -> bool {
        element.get(self.key) == Some(self.value)
    }
}

/// Abstract document store
///
/// Each method is a single round-trip; there is no multi-document
/// transaction.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a new document; fails with `Duplicate` if the id exists
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), StoreError>;

    /// Fetch one document
    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError>;

    /// Overwrite the given top-level keys, leaving every other key as stored
    ///
    /// Returns the updated document, or `None` if it does not exist.
    async fn merge_fields(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;

    /// Delete a document; returns `false` if it did not exist
    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    /// All documents of a collection in insertion order
    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// Documents whose top-level `field` equals `value`, in insertion order
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError>;

    /// Append `value` to the array `field` unless an equal element is present
    ///
    /// A missing field is treated as an empty array. Returns `false` if the
    /// document does not exist.
    async fn push_to_array(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        value: Value,
    ) -> Result<bool, StoreError>;

    /// Remove every element equal to `value` from the array `field`
    ///
    /// Returns `false` if the document does not exist.
    async fn pull_from_array(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        value: &Value,
    ) -> Result<bool, StoreError>;

    /// Append `value` unless an element with the same `key` field is present
    ///
    /// Returns `None` if the document does not exist and `Some(false)` if an
    /// element with that key was already there.
    async fn push_keyed(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        key: &str,
        value: Value,
    ) -> Result<Option<bool>, StoreError>;

    /// Remove every element of `field` selected by `matching`
    ///
    /// Returns `false` if the document does not exist.
    async fn pull_keyed(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        matching: ElementMatch<'_>,
    ) -> Result<bool, StoreError>;

    /// Merge `patch` into the object elements of `field`
    ///
    /// Only the elements selected by `matching` are patched, or all of them
    /// when it is `None`. Returns the updated document, or `None` if it does
    /// not exist.
    async fn patch_elements(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        matching: Option<ElementMatch<'_>>,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;
}
