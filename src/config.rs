//! Loader configuration.
//!
//! [`FixtureConfig`] is the immutable value a [`crate::FixtureLoader`] is
//! built from. The binary gathers its inputs with [`load_settings`];
//! precedence stays: defaults < file < env < CLI.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::CommandFactory;
use log::debug;
use ortho_config::{OrthoConfig, load_and_merge_subcommand_for};
use serde::Serialize;

use crate::error::FixtureError;
use crate::format::FixtureFormat;
use crate::transform::{PreInsert, Pipeline};

/// Per-connection timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Settings file looked up when no path is configured.
pub const CONFIG_FILE: &str = ".mongofixture.toml";
/// Environment variable naming an alternative settings file.
pub const CONFIG_PATH_ENV: &str = "MONGOFIXTURE_CONFIG_PATH";

/// Validated inputs of a fixture load.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    root_dir: PathBuf,
    format: FixtureFormat,
    timeout: Duration,
    pipeline: Pipeline,
}

impl FixtureConfig {
    #[must_use]
    pub fn builder() -> FixtureConfigBuilder {
        FixtureConfigBuilder::default()
    }

    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    #[must_use]
    pub const fn format(&self) -> FixtureFormat {
        self.format
    }

    /// Bound applied to each collection reset.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Check the configuration and return a copy with an absolute root.
    ///
    /// Touches neither files nor connections; the root is resolved against
    /// the working directory but need not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfig`] for an empty root or a zero
    /// timeout.
    pub fn validate(&self) -> Result<Self, FixtureError> {
        if self.root_dir.as_os_str().is_empty() {
            return Err(FixtureError::InvalidConfig(
                "fixture root directory is empty".into(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(FixtureError::InvalidConfig("timeout must be positive".into()));
        }
        let root_dir = std::path::absolute(&self.root_dir).map_err(|e| {
            FixtureError::InvalidConfig(format!(
                "cannot resolve root {}: {e}",
                self.root_dir.display()
            ))
        })?;
        Ok(Self {
            root_dir,
            ..self.clone()
        })
    }
}

/// Builder for [`FixtureConfig`].
#[derive(Debug, Clone, Default)]
pub struct FixtureConfigBuilder {
    root_dir: PathBuf,
    format: FixtureFormat,
    timeout: Option<Duration>,
    pipeline: Pipeline,
}

impl FixtureConfigBuilder {
    #[must_use]
    pub fn root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    #[must_use]
    pub const fn format(mut self, format: FixtureFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the whole pipeline.
    #[must_use]
    pub fn pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Append one step to the pipeline.
    #[must_use]
    pub fn pre_insert(mut self, step: impl PreInsert + 'static) -> Self {
        self.pipeline.push(step);
        self
    }

    /// Finish the configuration. Validation happens when a load starts.
    #[must_use]
    pub fn build(self) -> FixtureConfig {
        FixtureConfig {
            root_dir: self.root_dir,
            format: self.format,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            pipeline: self.pipeline,
        }
    }
}

/// Layer the settings file and environment beneath `cli`.
///
/// The file is `MONGOFIXTURE_CONFIG_PATH` when set, otherwise
/// [`CONFIG_FILE`]; only its `[cmds.<name>]` section applies, where `<name>`
/// is the sub-command. `MONGOFIXTURECMDS_<NAME>_<FIELD>` variables override
/// the file, and flags given on the command line override both.
///
/// # Errors
///
/// Returns [`FixtureError::Settings`] when a source holds a malformed value.
pub fn load_settings<T>(cli: &T) -> Result<T, FixtureError>
where
    T: OrthoConfig + Serialize + Default + CommandFactory,
{
    let merged = load_and_merge_subcommand_for::<T>(cli)?;
    debug!("settings merged for {}", T::command().get_name());
    Ok(merged)
}
