//! Document store port.
//!
//! The loader never talks to a database directly. It opens one
//! [`CollectionHandle`] per collection through a [`DocumentStore`], drops the
//! collection, inserts the new documents and releases the handle.
//!
//! Two adapters ship with the crate: [`memory::MemoryStore`] and, behind the
//! `mongodb` feature, [`mongo::MongoStore`].

use std::fmt;

use thiserror::Error;

use crate::value::DocumentData;

pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

/// Failure reported by a store adapter.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(Box<dyn std::error::Error + Send + Sync>);

impl StoreError {
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self(message.into())
    }
}

/// Store call that failed, used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Open,
    Drop,
    Insert,
    Release,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Drop => "drop",
            Self::Insert => "insert",
            Self::Release => "release",
        })
    }
}

/// Source of per-collection handles.
#[allow(
    async_fn_in_trait,
    reason = "the loader is generic over the store, so futures need no Send bound"
)]
pub trait DocumentStore {
    type Handle: CollectionHandle;

    /// Connect and return a handle for `collection`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the connection cannot be established.
    async fn open(&self, collection: &str) -> Result<Self::Handle, StoreError>;
}

/// Connection-scoped access to one collection.
#[allow(
    async_fn_in_trait,
    reason = "the loader is generic over the store, so futures need no Send bound"
)]
pub trait CollectionHandle {
    /// Remove the collection and all of its documents. Succeeds when the
    /// collection does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the destination rejects the drop.
    async fn drop_collection(&mut self) -> Result<(), StoreError>;

    /// Insert `documents` in order. Not atomic: a failure may leave a prefix
    /// of `documents` written.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when any insert fails.
    async fn insert_many(&mut self, documents: Vec<DocumentData>) -> Result<(), StoreError>;

    /// Release connection resources.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when cleanup fails.
    async fn release(self) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_keep_their_message() {
        assert_eq!(StoreError::msg("connection refused").to_string(), "connection refused");
        let io = std::io::Error::other("broken pipe");
        assert_eq!(StoreError::new(io).to_string(), "broken pipe");
    }

    #[test]
    fn operations_render_lowercase() {
        assert_eq!(StoreOperation::Insert.to_string(), "insert");
    }
}
