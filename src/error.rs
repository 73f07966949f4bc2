//! Error taxonomy for fixture loading.
//!
//! Every stage reports through [`FixtureError`]; [`FixtureError::kind`]
//! collapses the variants into the coarse families callers usually match on.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::{StoreError, StoreOperation};
use crate::transform::TransformError;

/// Coarse classification of a [`FixtureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid settings; raised before any I/O.
    Configuration,
    /// A fixture name matched zero or several files, or listing failed.
    Resolution,
    /// File content could not be read or decoded.
    Parse,
    /// A pre-insert transform rejected a document.
    Transform,
    /// The document store failed to open, drop, insert or release.
    Store,
    /// The caller's deadline elapsed before an external call finished.
    Deadline,
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("configuration error: {0}")]
    InvalidConfig(String),
    #[error("configuration error: {0}")]
    Settings(#[from] Box<ortho_config::OrthoError>),
    #[error("invalid fixture name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("fixture {name:?} not found in {}", .root.display())]
    NotFound { name: String, root: PathBuf },
    #[error("fixture {name:?} is ambiguous: {}", display_paths(.candidates))]
    Ambiguous {
        name: String,
        candidates: Vec<PathBuf>,
    },
    #[error("failed to list {}: {source}", .dir.display())]
    ListDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unrecognized fixture format: {}", .path.display())]
    UnknownFormat { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse error in {} at {at}: {source}", .path.display())]
    Json {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("parse error in {} at {at}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("transform failed for {collection}/{id}: {source}")]
    Transform {
        collection: String,
        id: String,
        #[source]
        source: TransformError,
    },
    #[error("store {operation} failed for collection {collection}: {source}")]
    Store {
        collection: String,
        operation: StoreOperation,
        #[source]
        source: StoreError,
    },
    #[error("deadline exceeded while {stage}")]
    DeadlineExceeded { stage: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ortho_config::OrthoError> for FixtureError {
    fn from(err: ortho_config::OrthoError) -> Self {
        Self::Settings(Box::new(err))
    }
}

impl FixtureError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) | Self::Settings(_) => ErrorKind::Configuration,
            Self::InvalidName { .. }
            | Self::NotFound { .. }
            | Self::Ambiguous { .. }
            | Self::ListDir { .. } => ErrorKind::Resolution,
            Self::UnknownFormat { .. } | Self::Read { .. } | Self::Json { .. } | Self::Yaml { .. } => {
                ErrorKind::Parse
            }
            Self::Transform { .. } => ErrorKind::Transform,
            Self::Store { .. } => ErrorKind::Store,
            Self::DeadlineExceeded { .. } => ErrorKind::Deadline,
        }
    }
}

pub type Result<T, E = FixtureError> = std::result::Result<T, E>;
