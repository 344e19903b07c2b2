//! In-memory document store
//!
//! Collections are `HashMap`s behind a tokio `RwLock`. A global sequence
//! number preserves insertion order for `find_all`/`find_by_field`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, ElementMatch, StoreError};

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    body: Value,
}

/// Document store kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, HashMap<Uuid, Stored>>>,
    next_seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn sorted(docs: impl Iterator<Item = Stored>) -> Vec<Value> {
        let mut docs: Vec<Stored> = docs.collect();
        docs.sort_by_key(|d| d.seq);
        docs.into_iter().map(|d| d.body).collect()
    }

    fn array_field<'a>(
        body: &'a mut Value,
        collection: &str,
        id: Uuid,
        field: &str,
    ) -> Result<&'a mut Vec<Value>, StoreError> {
        let not_an_array = || StoreError::NotAnArray {
            collection: collection.to_string(),
            id,
            field: field.to_string(),
        };
        let object = body.as_object_mut().ok_or_else(not_an_array)?;
        let slot = object
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }
        slot.as_array_mut().ok_or_else(not_an_array)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, collection: &str, id: Uuid, doc: Value) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                id,
            });
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        docs.insert(id, Stored { seq, body: doc });
        Ok(())
    }

    async fn get(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|docs| docs.get(&id))
            .map(|stored| stored.body.clone()))
    }

    async fn merge_fields(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(None);
        };
        let object = stored
            .body
            .as_object_mut()
            .ok_or_else(|| StoreError::backend(format!("{}/{} is not an object", collection, id)))?;
        object.extend(fields);
        Ok(Some(stored.body.clone()))
    }

    async fn delete(&self, collection: &str, id: Uuid) -> Result<bool, StoreError> {
        Ok(self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|docs| docs.remove(&id))
            .is_some())
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| Self::sorted(docs.values().cloned()))
            .unwrap_or_default())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                Self::sorted(
                    docs.values()
                        .filter(|d| d.body.get(field) == Some(value))
                        .cloned(),
                )
            })
            .unwrap_or_default())
    }

    async fn push_to_array(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        value: Value,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(false);
        };
        let array = Self::array_field(&mut stored.body, collection, id, field)?;
        if !array.contains(&value) {
            array.push(value);
        }
        Ok(true)
    }

    async fn pull_from_array(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        value: &Value,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(false);
        };
        let array = Self::array_field(&mut stored.body, collection, id, field)?;
        array.retain(|v| v != value);
        Ok(true)
    }

    async fn push_keyed(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        key: &str,
        value: Value,
    ) -> Result<Option<bool>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(None);
        };
        let array = Self::array_field(&mut stored.body, collection, id, field)?;
        let taken = value
            .get(key)
            .map(|k| array.iter().any(|e| ElementMatch::new(key, k).matches(e)))
            .unwrap_or(false);
        if taken {
            return Ok(Some(false));
        }
        array.push(value);
        Ok(Some(true))
    }

    async fn pull_keyed(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        matching: ElementMatch<'_>,
    ) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(false);
        };
        let array = Self::array_field(&mut stored.body, collection, id, field)?;
        array.retain(|e| !matching.matches(e));
        Ok(true)
    }

    async fn patch_elements(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        matching: Option<ElementMatch<'_>>,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(stored) = collections.get_mut(collection).and_then(|docs| docs.get_mut(&id)) else {
            return Ok(None);
        };
        let array = Self::array_field(&mut stored.body, collection, id, field)?;
        for element in array.iter_mut() {
            if matching.is_some_and(|m| !m.matches(element)) {
                continue;
            }
            if let Some(object) = element.as_object_mut() {
                object.extend(patch.clone());
            }
        }
        Ok(Some(stored.body.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_get_merge_delete() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("boards", id, json!({"name": "A", "groups": ["g1"]})).await.unwrap();
        assert_eq!(
            store.get("boards", id).await.unwrap(),
            Some(json!({"name": "A", "groups": ["g1"]}))
        );

        let mut fields = Map::new();
        fields.insert("name".into(), json!("B"));
        let merged = store.merge_fields("boards", id, fields).await.unwrap().unwrap();
        assert_eq!(merged, json!({"name": "B", "groups": ["g1"]}));

        assert!(store.delete("boards", id).await.unwrap());
        assert!(!store.delete("boards", id).await.unwrap());
        assert!(store.get("boards", id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("users", id, json!({})).await.unwrap();
        let err = store.insert("users", id, json!({})).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn test_merge_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.merge_fields("boards", Uuid::new_v4(), Map::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_merge_keeps_concurrent_pushes() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store.insert("boards", id, json!({"name": "A", "groups": []})).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .push_to_array("boards", id, "groups", json!(Uuid::new_v4()))
                    .await
                    .unwrap();
                let mut fields = Map::new();
                fields.insert("name".into(), json!(format!("B{}", n)));
                store.merge_fields("boards", id, fields).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let doc = store.get("boards", id).await.unwrap().unwrap();
        assert_eq!(doc["groups"].as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_keyed_push_pull_and_patch() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("workspaces", id, json!({"members": []})).await.unwrap();

        let first = json!({"user_id": "u1", "role": "member", "joined_at": 1});
        let again = json!({"user_id": "u1", "role": "member", "joined_at": 2});
        let second = json!({"user_id": "u2", "role": "member", "joined_at": 3});
        assert_eq!(store.push_keyed("workspaces", id, "members", "user_id", first).await.unwrap(), Some(true));
        assert_eq!(store.push_keyed("workspaces", id, "members", "user_id", again).await.unwrap(), Some(false));
        assert_eq!(store.push_keyed("workspaces", id, "members", "user_id", second).await.unwrap(), Some(true));
        assert_eq!(
            store
                .push_keyed("workspaces", Uuid::new_v4(), "members", "user_id", json!({}))
                .await
                .unwrap(),
            None
        );

        let u2 = json!("u2");
        let mut patch = Map::new();
        patch.insert("role".into(), json!("admin"));
        let doc = store
            .patch_elements("workspaces", id, "members", Some(ElementMatch::new("user_id", &u2)), patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["members"][0]["role"], "member");
        assert_eq!(doc["members"][0]["joined_at"], 1);
        assert_eq!(doc["members"][1]["role"], "admin");

        let u1 = json!("u1");
        assert!(store
            .pull_keyed("workspaces", id, "members", ElementMatch::new("user_id", &u1))
            .await
            .unwrap());
        let doc = store.get("workspaces", id).await.unwrap().unwrap();
        assert_eq!(doc["members"].as_array().unwrap().len(), 1);
        assert_eq!(doc["members"][0]["user_id"], "u2");
    }

    #[tokio::test]
    async fn test_patch_all_elements() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .insert("users", id, json!({"notifications": [{"id": 1, "read": false}, {"id": 2, "read": false}]}))
            .await
            .unwrap();
        let mut patch = Map::new();
        patch.insert("read".into(), json!(true));
        let doc = store.patch_elements("users", id, "notifications", None, patch).await.unwrap().unwrap();
        assert_eq!(doc["notifications"], json!([{"id": 1, "read": true}, {"id": 2, "read": true}]));
    }

    #[tokio::test]
    async fn test_find_all_preserves_insertion_order() {
        let store = MemoryStore::new();
        for n in 0..5 {
            store.insert("groups", Uuid::new_v4(), json!({"n": n})).await.unwrap();
        }
        let ns: Vec<i64> = store
            .find_all("groups")
            .await
            .unwrap()
            .iter()
            .map(|d| d["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_find_by_field() {
        let store = MemoryStore::new();
        store.insert("users", Uuid::new_v4(), json!({"email": "a@x.io"})).await.unwrap();
        store.insert("users", Uuid::new_v4(), json!({"email": "b@x.io"})).await.unwrap();
        let found = store.find_by_field("users", "email", &json!("b@x.io")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["email"], "b@x.io");
    }

    #[tokio::test]
    async fn test_push_is_unique_and_pull_removes() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("boards", id, json!({"groups": []})).await.unwrap();
        let child = json!(Uuid::new_v4());

        assert!(store.push_to_array("boards", id, "groups", child.clone()).await.unwrap());
        assert!(store.push_to_array("boards", id, "groups", child.clone()).await.unwrap());
        assert_eq!(store.get("boards", id).await.unwrap().unwrap()["groups"], json!([child]));

        assert!(store.pull_from_array("boards", id, "groups", &child).await.unwrap());
        assert_eq!(store.get("boards", id).await.unwrap().unwrap()["groups"], json!([]));
    }

    #[tokio::test]
    async fn test_push_creates_missing_field_and_rejects_non_array() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.insert("users", id, json!({"name": "x"})).await.unwrap();
        store.push_to_array("users", id, "notifications", json!({"id": 1})).await.unwrap();
        assert_eq!(
            store.get("users", id).await.unwrap().unwrap()["notifications"],
            json!([{"id": 1}])
        );

        let err = store.push_to_array("users", id, "name", json!(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnArray { .. }));
    }

    #[tokio::test]
    async fn test_push_on_missing_document() {
        let store = MemoryStore::new();
        assert!(!store
            .push_to_array("boards", Uuid::new_v4(), "groups", json!("x"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_pushes_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let id = Uuid::new_v4();
        store.insert("boards", id, json!({"groups": []})).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .push_to_array("boards", id, "groups", json!(Uuid::new_v4()))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let doc = store.get("boards", id).await.unwrap().unwrap();
        assert_eq!(doc["groups"].as_array().unwrap().len(), 50);
    }
}
