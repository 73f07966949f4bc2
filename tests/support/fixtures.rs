//! Shared helpers for loader integration tests.
//!
//! Points loaders at the checked-in `tests/fixtures` tree and provides a
//! store wrapper that records every call it receives.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use mongofixture::store::memory::{MemoryCollection, MemoryStore};
use mongofixture::store::{CollectionHandle, DocumentStore, StoreError};
use mongofixture::transform::convert_time;
use mongofixture::{DocumentData, FixtureConfig, FixtureFormat};

/// Directory holding the checked-in fixture files.
pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Configuration reading `tests/fixtures` with `users.created_at` converted
/// to a timestamp.
pub fn config(format: FixtureFormat) -> FixtureConfig {
    FixtureConfig::builder()
        .root_dir(fixture_root())
        .format(format)
        .pre_insert(convert_time("users", "created_at"))
        .build()
}

/// [`MemoryStore`] wrapper that logs each store call as text.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: MemoryStore,
    calls: Arc<Mutex<Vec<String>>>,
    fail_insert_into: Option<&'static str>,
}

impl RecordingStore {
    /// Store whose inserts into `collection` fail after writing nothing.
    pub fn failing_insert(collection: &'static str) -> Self {
        Self {
            fail_insert_into: Some(collection),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(calls: &Mutex<Vec<String>>, call: String) {
        calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

pub struct RecordingHandle {
    collection: String,
    inner: MemoryCollection,
    calls: Arc<Mutex<Vec<String>>>,
    fail_insert: bool,
}

impl DocumentStore for RecordingStore {
    type Handle = RecordingHandle;

    async fn open(&self, collection: &str) -> Result<Self::Handle, StoreError> {
        Self::record(&self.calls, format!("open {collection}"));
        Ok(RecordingHandle {
            collection: collection.to_owned(),
            inner: self.inner.open(collection).await?,
            calls: Arc::clone(&self.calls),
            fail_insert: self.fail_insert_into == Some(collection),
        })
    }
}

impl CollectionHandle for RecordingHandle {
    async fn drop_collection(&mut self) -> Result<(), StoreError> {
        RecordingStore::record(&self.calls, format!("drop {}", self.collection));
        self.inner.drop_collection().await
    }

    async fn insert_many(&mut self, documents: Vec<DocumentData>) -> Result<(), StoreError> {
        RecordingStore::record(
            &self.calls,
            format!("insert {} x{}", self.collection, documents.len()),
        );
        if self.fail_insert {
            return Err(StoreError::msg("connection reset"));
        }
        self.inner.insert_many(documents).await
    }

    async fn release(self) -> Result<(), StoreError> {
        RecordingStore::record(&self.calls, format!("release {}", self.collection));
        self.inner.release().await
    }
}
