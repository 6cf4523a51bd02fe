//! In-process document store.
//!
//! Used when no database URL is configured and by the integration tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    new_document_id, Document, DocumentStore, Fields, Filter, StoreError, StoreResult,
};

#[derive(Debug, Clone)]
struct Stored {
    data: Fields,
    version: i64,
}

type Collection = BTreeMap<String, Stored>;

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn to_document(id: &str, stored: &Stored) -> Document {
    Document {
        id: id.to_string(),
        data: stored.data.clone(),
        version: stored.version,
    }
}

fn matches_all(filters: &[Filter], data: &Fields) -> bool {
    filters.iter().all(|f| f.matches(data))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|stored| to_document(id, stored)))
    }

    async fn list(&self, collection: &str, filters: &[Filter]) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|(_, stored)| matches_all(filters, &stored.data))
            .map(|(id, stored)| to_document(id, stored))
            .collect())
    }

    async fn insert(&self, collection: &str, data: Fields) -> StoreResult<Document> {
        let id = new_document_id();
        let stored = Stored { data, version: 1 };
        let doc = to_document(&id, &stored);
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id, stored);
        Ok(doc)
    }

    async fn set(&self, collection: &str, id: &str, data: Fields) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();
        let version = docs.get(id).map(|s| s.version + 1).unwrap_or(1);
        let stored = Stored { data, version };
        let doc = to_document(id, &stored);
        docs.insert(id.to_string(), stored);
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        patch: Fields,
        expected_version: Option<i64>,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;

        if let Some(expected) = expected_version {
            if stored.version != expected {
                return Err(StoreError::VersionConflict {
                    expected,
                    actual: stored.version,
                });
            }
        }

        stored.data.extend(patch);
        stored.version += 1;
        Ok(to_document(id, stored))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn delete_where(&self, collection: &str, filters: &[Filter]) -> StoreResult<usize> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, stored| !matches_all(filters, &stored.data));
        Ok(before - docs.len())
    }
}
