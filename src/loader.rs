//! Fixture loading entry point.
//!
//! A load runs its stages strictly one after another: validate the
//! configuration, resolve every name, parse every file, merge, transform
//! every collection, then reset the collections one at a time in name order.
//! The first failure aborts everything after it. Collections reset before
//! the failure keep their new contents; nothing is rolled back.

use log::debug;
use serde::Serialize;

use crate::config::FixtureConfig;
use crate::deadline::Deadline;
use crate::error::FixtureError;
use crate::merge::merge_datasets;
use crate::parse::parse_file;
use crate::reset::reset_collection;
use crate::resolve::{FixtureName, resolve};
use crate::store::DocumentStore;
use crate::value::{CollectionData, Dataset, DocumentData, ID_FIELD, Value};

/// Collections written by a load, with their document counts, in reset
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    collections: Vec<(String, usize)>,
}

impl LoadReport {
    #[must_use]
    pub fn collections(&self) -> &[(String, usize)] {
        &self.collections
    }

    /// Documents written to `collection`, if it was reset.
    #[must_use]
    pub fn count(&self, collection: &str) -> Option<usize> {
        self.collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, n)| *n)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.collections.iter().map(|(_, n)| n).sum()
    }
}

/// Loads named fixtures into a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct FixtureLoader<S> {
    config: FixtureConfig,
    store: S,
}

impl<S: DocumentStore> FixtureLoader<S> {
    #[must_use]
    pub const fn new(config: FixtureConfig, store: S) -> Self {
        Self { config, store }
    }

    #[must_use]
    pub const fn config(&self) -> &FixtureConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Load `names` with no overall deadline. Each reset is still bounded by
    /// the configured timeout.
    ///
    /// # Errors
    ///
    /// See [`FixtureLoader::load_with_deadline`].
    pub async fn load<N: AsRef<str>>(&self, names: &[N]) -> Result<LoadReport, FixtureError> {
        self.load_with_deadline(names, Deadline::none()).await
    }

    /// Replace every collection named in the merged fixtures of `names`.
    ///
    /// `deadline` bounds every file and store call. Each reset is further
    /// bounded by the configured timeout, whichever ends first.
    ///
    /// # Errors
    ///
    /// Returns the first [`FixtureError`] raised by any stage. Configuration,
    /// resolution, parse and transform errors happen before the store is
    /// touched.
    pub async fn load_with_deadline<N: AsRef<str>>(
        &self,
        names: &[N],
        deadline: Deadline,
    ) -> Result<LoadReport, FixtureError> {
        let config = self.config.validate()?;
        let dataset = read_dataset(&config, names, deadline).await?;
        let prepared = dataset
            .iter()
            .map(|(collection, data)| {
                prepare(&config, collection, data).map(|docs| (collection.as_str(), docs))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = LoadReport::default();
        for (collection, documents) in prepared {
            let bound = deadline.min(Deadline::after(config.timeout()));
            let count = reset_collection(&self.store, collection, documents, bound).await?;
            report.collections.push((collection.to_owned(), count));
        }
        Ok(report)
    }

    /// Resolve, parse and merge `names` without touching the store.
    ///
    /// # Errors
    ///
    /// Returns configuration, resolution and parse errors.
    pub async fn load_dataset<N: AsRef<str>>(&self, names: &[N]) -> Result<Dataset, FixtureError> {
        let config = self.config.validate()?;
        read_dataset(&config, names, Deadline::none()).await
    }

    /// Inject `_id` into every document of `data` and run the pipeline, as
    /// a load would just before writing `collection`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Transform`] for the first rejected document.
    pub fn prepare_documents(
        &self,
        collection: &str,
        data: &CollectionData,
    ) -> Result<Vec<DocumentData>, FixtureError> {
        prepare(&self.config, collection, data)
    }
}

async fn read_dataset<N: AsRef<str>>(
    config: &FixtureConfig,
    names: &[N],
    deadline: Deadline,
) -> Result<Dataset, FixtureError> {
    let names = names
        .iter()
        .map(|n| FixtureName::parse(n.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let mut paths = Vec::with_capacity(names.len());
    for name in &names {
        paths.push(resolve(config.root_dir(), name, deadline).await?);
    }
    let mut datasets = Vec::with_capacity(paths.len());
    for path in &paths {
        datasets.push(parse_file(path, config.format(), deadline).await?);
    }
    let merged = merge_datasets(datasets);
    debug!(
        "merged {} fixture(s) into {} collection(s)",
        names.len(),
        merged.len()
    );
    Ok(merged)
}

/// Documents are emitted in identifier order. A stored `_id` field is
/// replaced by the map key.
fn prepare(
    config: &FixtureConfig,
    collection: &str,
    data: &CollectionData,
) -> Result<Vec<DocumentData>, FixtureError> {
    data.iter()
        .map(|(id, doc)| {
            let mut doc = doc.clone();
            doc.insert(ID_FIELD, Value::String(id.clone()));
            config
                .pipeline()
                .run(collection, doc)
                .map_err(|source| FixtureError::Transform {
                    collection: collection.to_owned(),
                    id: id.clone(),
                    source,
                })
        })
        .collect()
}
