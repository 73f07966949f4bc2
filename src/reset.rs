//! Replace the contents of one collection.
//!
//! A reset runs open → drop → insert → release, strictly in sequence:
//!
//! - a failed open returns immediately; there is nothing to release;
//! - a failed drop skips the insert, so the collection may be unchanged;
//! - a failed insert is not compensated. Whatever the destination wrote
//!   before failing stays written and the collection is left partially
//!   populated;
//! - release runs on every path once the handle is open.
//!
//! Drop followed by insert is not atomic. Callers that need all-or-nothing
//! semantics must isolate runs themselves (for example a fresh database per
//! test run).

use log::{info, warn};

use crate::deadline::Deadline;
use crate::error::FixtureError;
use crate::store::{CollectionHandle, DocumentStore, StoreError, StoreOperation};
use crate::value::DocumentData;

fn store_err(collection: &str, operation: StoreOperation) -> impl FnOnce(StoreError) -> FixtureError {
    let collection = collection.to_owned();
    move |source| FixtureError::Store {
        collection,
        operation,
        source,
    }
}

/// Drop `collection` and insert `documents` into it.
///
/// An empty `documents` still drops the collection, leaving it empty.
///
/// # Errors
///
/// Returns [`FixtureError::Store`] for the first failing store call and
/// [`FixtureError::DeadlineExceeded`] when `deadline` elapses. A release
/// failure is only reported when every earlier step succeeded.
pub async fn reset_collection<S: DocumentStore>(
    store: &S,
    collection: &str,
    documents: Vec<DocumentData>,
    deadline: Deadline,
) -> Result<usize, FixtureError> {
    let mut handle = deadline
        .run(|| format!("connecting for {collection}"), store.open(collection))
        .await?
        .map_err(store_err(collection, StoreOperation::Open))?;

    let count = documents.len();
    let outcome = replace(&mut handle, collection, documents, deadline).await;
    let released = handle
        .release()
        .await
        .map_err(store_err(collection, StoreOperation::Release));

    match (outcome, released) {
        (Ok(()), Ok(())) => {
            info!("reset collection {collection} with {count} document(s)");
            Ok(count)
        }
        (Ok(()), Err(err)) | (Err(err), Ok(())) => Err(err),
        (Err(err), Err(release_err)) => {
            warn!("{release_err} after earlier failure");
            Err(err)
        }
    }
}

async fn replace<H: CollectionHandle>(
    handle: &mut H,
    collection: &str,
    documents: Vec<DocumentData>,
    deadline: Deadline,
) -> Result<(), FixtureError> {
    deadline
        .run(|| format!("dropping {collection}"), handle.drop_collection())
        .await?
        .map_err(store_err(collection, StoreOperation::Drop))?;
    if documents.is_empty() {
        return Ok(());
    }
    deadline
        .run(
            || format!("inserting into {collection}"),
            handle.insert_many(documents),
        )
        .await?
        .map_err(store_err(collection, StoreOperation::Insert))
}
