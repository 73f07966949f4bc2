//! Fold several datasets into one with last-writer-wins precedence.
//!
//! Precedence is applied independently at three levels. A later dataset may
//! add a collection, add a document to an existing collection or override
//! single fields of an existing document; anything it does not mention is
//! left untouched. Field values are replaced wholesale, so nested documents
//! and arrays are never deep-merged.

use std::collections::btree_map::Entry;

use crate::value::{CollectionData, Dataset, DocumentData};

/// Merge `datasets` in order; later entries win on conflict.
///
/// # Examples
///
/// ```
/// use mongofixture::merge::merge_datasets;
/// use mongofixture::value::{Dataset, DocumentData, Value};
///
/// fn users(doc: DocumentData) -> Dataset {
///     Dataset::from([("users".into(), [("admin1".into(), doc)].into())])
/// }
///
/// let a = users([("name", Value::from("x")), ("age", Value::Int(1))].into_iter().collect());
/// let b = users([("age", Value::Int(2))].into_iter().collect());
/// let merged = merge_datasets(vec![a, b]);
/// let admin1 = &merged["users"]["admin1"];
/// assert_eq!(admin1.get("name"), Some(&Value::from("x")));
/// assert_eq!(admin1.get("age"), Some(&Value::Int(2)));
/// ```
#[must_use]
pub fn merge_datasets(datasets: Vec<Dataset>) -> Dataset {
    datasets.into_iter().fold(Dataset::new(), |mut merged, ds| {
        for (name, coll) in ds {
            match merged.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(coll);
                }
                Entry::Occupied(mut slot) => merge_collection(slot.get_mut(), coll),
            }
        }
        merged
    })
}

/// Merge the documents of `later` into `earlier`.
pub fn merge_collection(earlier: &mut CollectionData, later: CollectionData) {
    for (id, doc) in later {
        match earlier.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(doc);
            }
            Entry::Occupied(mut slot) => merge_document(slot.get_mut(), doc),
        }
    }
}

/// Overlay the fields of `later` onto `earlier`.
pub fn merge_document(earlier: &mut DocumentData, later: DocumentData) {
    earlier.overlay(later);
}
