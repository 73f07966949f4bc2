//! Declarative test fixtures for document databases.
//!
//! Fixture files (JSON or YAML) map collection names to documents keyed by
//! identifier. [`FixtureLoader`] resolves a list of fixture names, merges
//! their files with later names taking precedence field by field, runs each
//! document through a [`transform::Pipeline`] and replaces the contents of
//! every affected collection through a [`store::DocumentStore`].
//!
//! ```no_run
//! use mongofixture::{FixtureConfig, FixtureLoader, store::memory::MemoryStore};
//! use mongofixture::transform::convert_time;
//!
//! # async fn run() -> Result<(), mongofixture::FixtureError> {
//! let config = FixtureConfig::builder()
//!     .root_dir("tests/fixtures")
//!     .pre_insert(convert_time("users", "created_at"))
//!     .build();
//! let loader = FixtureLoader::new(config, MemoryStore::new());
//! let report = loader.load(&["json/admin_users", "json/foo_users"]).await?;
//! assert_eq!(report.count("users"), Some(3));
//! # Ok(())
//! # }
//! ```

pub mod bool_predicates;
pub mod cli_args;
pub mod config;
pub mod deadline;
pub mod error;
pub mod format;
pub mod loader;
pub mod merge;
pub mod parse;
pub mod reset;
pub mod resolve;
pub mod store;
pub mod transform;
pub mod value;

pub use cli_args::{LoadArgs, PingArgs};
pub use config::{FixtureConfig, load_settings};
pub use deadline::Deadline;
pub use error::{ErrorKind, FixtureError, Result};
pub use format::FixtureFormat;
pub use loader::{FixtureLoader, LoadReport};
pub use value::{CollectionData, Dataset, DocumentData, Value};
