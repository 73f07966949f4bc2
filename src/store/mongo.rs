//! MongoDB adapter for the store port.
//!
//! Every [`DocumentStore::open`] builds a fresh client from the parsed
//! options and [`CollectionHandle::release`] shuts it down again, so each
//! collection reset runs on its own connection.
//!
//! `drop` followed by `insert_many` is not transactional. MongoDB offers no
//! cross-operation atomicity outside replica-set transactions, and a failed
//! ordered insert leaves the documents before the failure in place.

use std::time::Duration;

use log::debug;
use mongodb::bson::{self, Binary, Bson, Document, doc, oid, spec::BinarySubtype};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};

use crate::error::FixtureError;
use crate::store::{CollectionHandle, DocumentStore, StoreError};
use crate::value::{DocumentData, Value};

/// MongoDB-backed [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct MongoStore {
    options: ClientOptions,
    database: String,
}

impl MongoStore {
    /// Parse `url` and prepare connections to `database`.
    ///
    /// `timeout` bounds connection establishment and server selection.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfig`] for an empty URL, database or
    /// timeout, and [`FixtureError::Store`] when the URL cannot be parsed.
    pub async fn new(url: &str, database: &str, timeout: Duration) -> Result<Self, FixtureError> {
        if url.is_empty() {
            return Err(FixtureError::InvalidConfig("empty URL".into()));
        }
        if database.is_empty() {
            return Err(FixtureError::InvalidConfig("empty database name".into()));
        }
        if timeout.is_zero() {
            return Err(FixtureError::InvalidConfig("invalid timeout".into()));
        }
        let mut options = ClientOptions::parse(url)
            .await
            .map_err(|e| FixtureError::Store {
                collection: String::new(),
                operation: crate::store::StoreOperation::Open,
                source: StoreError::new(e),
            })?;
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        Ok(Self {
            options,
            database: database.to_owned(),
        })
    }

    fn client(&self) -> Result<Client, StoreError> {
        Client::with_options(self.options.clone()).map_err(StoreError::new)
    }

    /// Check that the server answers a `ping`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the server cannot be reached.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let client = self.client()?;
        let result = client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(StoreError::new);
        client.shutdown().await;
        result
    }
}

impl DocumentStore for MongoStore {
    type Handle = MongoCollection;

    async fn open(&self, collection: &str) -> Result<Self::Handle, StoreError> {
        let client = self.client()?;
        let handle = client
            .database(&self.database)
            .collection::<Document>(collection);
        debug!("opened {}.{collection}", self.database);
        Ok(MongoCollection { client, handle })
    }
}

/// One collection on a dedicated client.
#[derive(Debug)]
pub struct MongoCollection {
    client: Client,
    handle: Collection<Document>,
}

impl CollectionHandle for MongoCollection {
    async fn drop_collection(&mut self) -> Result<(), StoreError> {
        // The driver treats a missing namespace as success.
        self.handle.drop().await.map_err(StoreError::new)
    }

    async fn insert_many(&mut self, documents: Vec<DocumentData>) -> Result<(), StoreError> {
        if documents.is_empty() {
            return Ok(());
        }
        let docs: Vec<Document> = documents.into_iter().map(to_document).collect();
        self.handle
            .insert_many(docs)
            .await
            .map(|_| ())
            .map_err(StoreError::new)
    }

    async fn release(self) -> Result<(), StoreError> {
        self.client.shutdown().await;
        Ok(())
    }
}

/// Convert fixture fields into a BSON document.
#[must_use]
pub fn to_document(doc: DocumentData) -> Document {
    doc.into_iter().map(|(k, v)| (k, to_bson(v))).collect()
}

/// Convert one fixture value into BSON. Integers that fit 32 bits are
/// stored as `int32`, larger ones as `int64`.
#[must_use]
pub fn to_bson(value: Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Int(n) => i32::try_from(n).map_or(Bson::Int64(n), Bson::Int32),
        Value::Float(n) => Bson::Double(n),
        Value::String(s) => Bson::String(s),
        Value::Timestamp(t) => Bson::DateTime(bson::DateTime::from_millis(t.timestamp_millis())),
        Value::Bytes(bytes) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes,
        }),
        Value::ObjectId(id) => Bson::ObjectId(oid::ObjectId::from_bytes(id.bytes())),
        Value::Array(items) => Bson::Array(items.into_iter().map(to_bson).collect()),
        Value::Document(doc) => Bson::Document(to_document(doc)),
    }
}
