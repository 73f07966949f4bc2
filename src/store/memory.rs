//! In-process document store.
//!
//! Used for dry runs and tests. Inserts behave like an ordered bulk insert
//! into a collection with a unique `_id` index: documents are written one by
//! one and the first duplicate identifier stops the batch, leaving the
//! already-written prefix in place.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::store::{CollectionHandle, DocumentStore, StoreError};
use crate::value::{DocumentData, ID_FIELD, Value};

type Collections = BTreeMap<String, Vec<DocumentData>>;

/// Shared in-memory collections. Clones observe the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

fn lock(collections: &Mutex<Collections>) -> MutexGuard<'_, Collections> {
    collections.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of `collection` without going through a handle.
    pub fn seed(&self, collection: impl Into<String>, documents: Vec<DocumentData>) {
        lock(&self.collections).insert(collection.into(), documents);
    }

    /// Names of the collections that currently exist.
    #[must_use]
    pub fn collection_names(&self) -> Vec<String> {
        lock(&self.collections).keys().cloned().collect()
    }

    /// Documents of `collection` in insertion order; empty when absent.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<DocumentData> {
        lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        lock(&self.collections).get(collection).map_or(0, Vec::len)
    }

    /// Find the document of `collection` whose `_id` equals `id`.
    #[must_use]
    pub fn find(&self, collection: &str, id: &Value) -> Option<DocumentData> {
        lock(&self.collections)
            .get(collection)?
            .iter()
            .find(|doc| doc.get(ID_FIELD) == Some(id))
            .cloned()
    }
}

impl DocumentStore for MemoryStore {
    type Handle = MemoryCollection;

    async fn open(&self, collection: &str) -> Result<Self::Handle, StoreError> {
        Ok(MemoryCollection {
            name: collection.to_owned(),
            collections: Arc::clone(&self.collections),
        })
    }
}

/// Handle onto one collection of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    collections: Arc<Mutex<Collections>>,
}

impl CollectionHandle for MemoryCollection {
    async fn drop_collection(&mut self) -> Result<(), StoreError> {
        lock(&self.collections).remove(&self.name);
        Ok(())
    }

    async fn insert_many(&mut self, documents: Vec<DocumentData>) -> Result<(), StoreError> {
        let mut guard = lock(&self.collections);
        let existing = guard.entry(self.name.clone()).or_default();
        for doc in documents {
            let duplicate = doc
                .get(ID_FIELD)
                .filter(|id| existing.iter().any(|d| d.get(ID_FIELD) == Some(*id)));
            if let Some(id) = duplicate {
                return Err(StoreError::msg(format!(
                    "duplicate key in {}: {ID_FIELD} {id:?}",
                    self.name
                )));
            }
            existing.push(doc);
        }
        Ok(())
    }

    async fn release(self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str) -> DocumentData {
        [(ID_FIELD, Value::from(id))].into_iter().collect()
    }

    #[tokio::test]
    async fn drop_is_idempotent() {
        let store = MemoryStore::new();
        let mut handle = store.open("users").await.expect("open");
        handle.drop_collection().await.expect("first drop");
        handle.drop_collection().await.expect("second drop");
        assert!(store.collection_names().is_empty());
    }

    #[tokio::test]
    async fn duplicate_ids_stop_the_batch_after_the_prefix() {
        let store = MemoryStore::new();
        let mut handle = store.open("users").await.expect("open");
        let err = handle
            .insert_many(vec![doc("a"), doc("b"), doc("a"), doc("c")])
            .await
            .expect_err("duplicate");
        assert!(err.to_string().contains("duplicate key"));
        assert_eq!(store.count("users"), 2);
        assert!(store.find("users", &Value::from("c")).is_none());
    }

    #[test]
    fn clones_share_collections() {
        let store = MemoryStore::new();
        store.clone().seed("users", vec![doc("a")]);
        assert_eq!(store.count("users"), 1);
        assert_eq!(store.find("users", &Value::from("a")), Some(doc("a")));
    }
}
