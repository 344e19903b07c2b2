//! Typed access to the document store
//!
//! The store itself deals in `serde_json::Value`. These helpers convert to
//! and from the domain types so services never touch raw JSON.
//!
//! `save` writes a document's own fields only. Fields listed in
//! `Document::MANAGED_FIELDS` (reference arrays, an item's group link) are
//! owned by dedicated store operations and are never written back from an
//! in-memory copy.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{collections, DocumentStore, StoreError};
use crate::shared::model::{Board, Group, Item, ItemKind, Module, User, Workspace};

/// A domain type persisted as one document
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    /// Fields changed only through dedicated store operations
    const MANAGED_FIELDS: &'static [&'static str] = &[];

    /// Collection this document lives in
    fn collection(&self) -> &'static str;

    fn id(&self) -> Uuid;
}

impl Document for Module {
    const MANAGED_FIELDS: &'static [&'static str] = &["workspaces"];

    fn collection(&self) -> &'static str {
        collections::MODULES
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Document for Workspace {
    const MANAGED_FIELDS: &'static [&'static str] = &["boards", "members"];

    fn collection(&self) -> &'static str {
        collections::WORKSPACES
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Document for Board {
    const MANAGED_FIELDS: &'static [&'static str] = &["groups"];

    fn collection(&self) -> &'static str {
        collections::BOARDS
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Document for Group {
    const MANAGED_FIELDS: &'static [&'static str] = &ItemKind::COLLECTIONS;

    fn collection(&self) -> &'static str {
        collections::GROUPS
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Document for Item {
    const MANAGED_FIELDS: &'static [&'static str] = &["group_id"];

    fn collection(&self) -> &'static str {
        self.kind.collection()
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Document for User {
    const MANAGED_FIELDS: &'static [&'static str] = &["notifications"];

    fn collection(&self) -> &'static str {
        collections::USERS
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Fetch and deserialize one document
pub async fn load<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: Uuid,
) -> Result<Option<T>, StoreError> {
    match store.get(collection, id).await? {
        Some(body) => Ok(Some(serde_json::from_value(body)?)),
        None => Ok(None),
    }
}

/// Fetch and deserialize every document in a collection
pub async fn load_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
) -> Result<Vec<T>, StoreError> {
    store
        .find_all(collection)
        .await?
        .into_iter()
        .map(|body| serde_json::from_value(body).map_err(StoreError::from))
        .collect()
}

/// Documents whose top-level `field` equals `value`
pub async fn find<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    field: &str,
    value: Value,
) -> Result<Vec<T>, StoreError> {
    store
        .find_by_field(collection, field, &value)
        .await?
        .into_iter()
        .map(|body| serde_json::from_value(body).map_err(StoreError::from))
        .collect()
}

/// Insert a new document
pub async fn insert_doc<T: Document>(store: &dyn DocumentStore, doc: &T) -> Result<(), StoreError> {
    store
        .insert(doc.collection(), doc.id(), serde_json::to_value(doc)?)
        .await
}

/// Write a document's own fields and return it as now stored
///
/// Reference arrays come back as the store holds them, including pushes
/// that raced with this write. `None` if the document is gone.
pub async fn save<T: Document>(store: &dyn DocumentStore, doc: &T) -> Result<Option<T>, StoreError> {
    let mut fields = match serde_json::to_value(doc)? {
        Value::Object(fields) => fields,
        _ => return Err(StoreError::backend(format!("{} document is not an object", doc.collection()))),
    };
    fields.remove("id");
    for field in T::MANAGED_FIELDS {
        fields.remove(*field);
    }
    update_fields(store, doc.collection(), doc.id(), fields).await
}

/// Overwrite just `fields` of a stored document and return the result
pub async fn update_fields<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    id: Uuid,
    fields: Map<String, Value>,
) -> Result<Option<T>, StoreError> {
    match store.merge_fields(collection, id, fields).await? {
        Some(body) => Ok(Some(serde_json::from_value(body)?)),
        None => Ok(None),
    }
}

/// Delete a document
pub async fn remove<T: Document>(store: &dyn DocumentStore, doc: &T) -> Result<bool, StoreError> {
    store.delete(doc.collection(), doc.id()).await
}

/// Append a child id to a parent's reference array
pub async fn link_child(
    store: &dyn DocumentStore,
    collection: &str,
    parent: Uuid,
    field: &str,
    child: Uuid,
) -> Result<bool, StoreError> {
    store
        .push_to_array(collection, parent, field, serde_json::to_value(child)?)
        .await
}

/// Remove a child id from a parent's reference array
pub async fn unlink_child(
    store: &dyn DocumentStore,
    collection: &str,
    parent: Uuid,
    field: &str,
    child: Uuid,
) -> Result<bool, StoreError> {
    store
        .pull_from_array(collection, parent, field, &serde_json::to_value(child)?)
        .await
}
