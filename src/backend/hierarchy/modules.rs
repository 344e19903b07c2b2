//! Product module seeding
//!
//! The four modules are created once. Seeding is idempotent: a kind that is
//! already present is left untouched, so it is safe to run on every start.

use axum::http::StatusCode;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{
    collections,
    document::{insert_doc, load_all},
    DocumentStore,
};
use crate::shared::model::{Module, ModuleKind};

/// Insert any missing module documents and return all four
pub async fn seed_modules(store: &dyn DocumentStore) -> BackendResult<Vec<Module>> {
    let existing: Vec<Module> = load_all(store, collections::MODULES).await?;

    for kind in ModuleKind::ALL {
        if existing.iter().any(|m| m.kind == kind) {
            continue;
        }
        let module = Module::new(kind);
        insert_doc(store, &module).await?;
        tracing::info!("Seeded module {} ({})", kind.as_str(), module.id);
    }

    list_modules(store).await
}

pub async fn list_modules(store: &dyn DocumentStore) -> BackendResult<Vec<Module>> {
    Ok(load_all(store, collections::MODULES).await?)
}

/// The module document for `kind`
pub async fn module_for(store: &dyn DocumentStore, kind: ModuleKind) -> BackendResult<Module> {
    list_modules(store)
        .await?
        .into_iter()
        .find(|m| m.kind == kind)
        .ok_or_else(|| {
            tracing::error!("Module {} has not been seeded", kind.as_str());
            BackendError::handler(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Module {} is not available", kind.as_str()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;

    #[tokio::test]
    async fn test_seed_creates_four_modules() {
        let store = MemoryStore::new();
        let modules = seed_modules(&store).await.unwrap();
        assert_eq!(modules.len(), 4);
        for kind in ModuleKind::ALL {
            assert!(modules.iter().any(|m| m.kind == kind));
        }
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = MemoryStore::new();
        let first = seed_modules(&store).await.unwrap();
        let second = seed_modules(&store).await.unwrap();
        assert_eq!(second.len(), 4);
        assert_eq!(store.count(collections::MODULES).await, 4);
        let first_ids: Vec<_> = first.iter().map(|m| m.id).collect();
        assert!(second.iter().all(|m| first_ids.contains(&m.id)));
    }

    #[tokio::test]
    async fn test_module_for_unseeded_store() {
        let store = MemoryStore::new();
        let err = module_for(&store, ModuleKind::Crm).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
