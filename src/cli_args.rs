//! Command-line argument structures.
//!
//! Each sub-command's arguments derive `OrthoConfig`, so
//! [`crate::config::load_settings`] can layer the `[cmds.<name>]` section of
//! `.mongofixture.toml` and `MONGOFIXTURECMDS_<NAME>_*` variables beneath
//! the flags given on the command line.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, Subcommand};
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_TIMEOUT, FixtureConfig};
use crate::error::FixtureError;
use crate::format::FixtureFormat;
use crate::transform::{Pipeline, convert_time};

#[derive(Parser, Debug)]
#[command(
    name = "mongofixture",
    version,
    about = "Replace document collections with the contents of fixture files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Load fixtures, replacing every collection they name
    Load(LoadArgs),
    /// Check that the configured database answers
    Ping(PingArgs),
}

/// Parameters accepted by the `load` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default, PartialEq, Eq)]
#[command(name = "load")]
#[ortho_config(prefix = "MONGOFIXTURE")]
pub struct LoadArgs {
    /// Fixture root directory
    #[arg(long = "root", value_name = "DIR")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,
    /// Force a file format instead of detecting it from the extension
    #[arg(long, value_enum)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FixtureFormat>,
    /// Per-collection timeout in seconds
    #[arg(long = "timeout", value_name = "SECS")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// MongoDB connection string
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Target database
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Parse a text field as a UTC timestamp before inserting
    #[arg(long = "convert-time", value_name = "COLLECTION.FIELD")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub convert_time: Vec<FieldRef>,
    /// Load into memory and print the resulting collections as JSON
    #[arg(long)]
    // `not` keeps an absent flag from masking `dry_run = true` in the file.
    #[serde(default, skip_serializing_if = "crate::bool_predicates::not")]
    pub dry_run: bool,
    /// Fixture names relative to the root, without extension
    #[arg(required = true, value_name = "NAME")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl LoadArgs {
    /// Pipeline built from the conversion flags, in flag order.
    #[must_use]
    pub fn pipeline(&self) -> Pipeline {
        self.convert_time
            .iter()
            .fold(Pipeline::new(), |pipeline, r| {
                pipeline.with(convert_time(r.collection.as_str(), r.field.as_str()))
            })
    }

    /// Build the loader configuration from merged arguments.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidConfig`] when no root directory is set.
    pub fn to_config(&self) -> Result<FixtureConfig, FixtureError> {
        let root_dir = self
            .root_dir
            .clone()
            .ok_or_else(|| FixtureError::InvalidConfig("fixture root directory is not set".into()))?;
        Ok(FixtureConfig::builder()
            .root_dir(root_dir)
            .format(self.format.unwrap_or_default())
            .timeout(timeout(self.timeout_secs))
            .pipeline(self.pipeline())
            .build())
    }
}

/// Parameters accepted by the `ping` sub-command.
#[derive(Parser, Deserialize, Serialize, Debug, OrthoConfig, Clone, Default, PartialEq, Eq)]
#[command(name = "ping")]
#[ortho_config(prefix = "MONGOFIXTURE")]
pub struct PingArgs {
    /// MongoDB connection string
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Target database
    #[arg(long)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Connection timeout in seconds
    #[arg(long = "timeout", value_name = "SECS")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl PingArgs {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        timeout(self.timeout_secs)
    }
}

fn timeout(secs: Option<u64>) -> Duration {
    secs.map_or(DEFAULT_TIMEOUT, Duration::from_secs)
}

/// `COLLECTION.FIELD` reference. The first `.` separates the two parts, so
/// field paths may themselves contain dots.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldRef {
    pub collection: String,
    pub field: String,
}

impl FromStr for FieldRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((collection, field)) if !collection.is_empty() && !field.is_empty() => Ok(Self {
                collection: collection.to_owned(),
                field: field.to_owned(),
            }),
            _ => Err(format!("expected COLLECTION.FIELD, got '{s}'")),
        }
    }
}

impl TryFrom<String> for FieldRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<FieldRef> for String {
    fn from(r: FieldRef) -> Self {
        r.to_string()
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.collection, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::value::{DocumentData, Value};
    use rstest::rstest;
    use std::path::Path;

    fn load_args(cli: Cli) -> LoadArgs {
        match cli.command {
            Command::Load(args) => args,
            Command::Ping(_) => panic!("expected load"),
        }
    }

    #[test]
    fn parses_load_flags() {
        let cli = Cli::try_parse_from([
            "mongofixture",
            "load",
            "--root",
            "fixtures",
            "--format",
            "yaml",
            "--timeout",
            "3",
            "--convert-time",
            "users.created_at",
            "--dry-run",
            "json/admin_users",
            "json/foo_users",
        ])
        .expect("parse");
        let args = load_args(cli);
        assert_eq!(args.root_dir, Some(PathBuf::from("fixtures")));
        assert_eq!(args.format, Some(FixtureFormat::Yaml));
        assert_eq!(args.timeout_secs, Some(3));
        assert!(args.dry_run);
        assert_eq!(args.names, ["json/admin_users", "json/foo_users"]);
        assert_eq!(args.pipeline().len(), 1);
    }

    #[test]
    fn names_are_required() {
        assert!(Cli::try_parse_from(["mongofixture", "load", "--dry-run"]).is_err());
    }

    #[test]
    fn parses_ping_flags() {
        let cli = Cli::try_parse_from(["mongofixture", "ping", "--url", "mongodb://db"])
            .expect("parse");
        let Command::Ping(args) = cli.command else {
            panic!("expected ping");
        };
        assert_eq!(args.url.as_deref(), Some("mongodb://db"));
        assert_eq!(args.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn unset_flags_are_not_serialized() {
        let args = LoadArgs {
            names: vec!["users".into()],
            ..LoadArgs::default()
        };
        let json = serde_json::to_value(&args).expect("serialize");
        assert_eq!(json, serde_json::json!({ "names": ["users"] }));
    }

    #[rstest]
    #[case("users.created_at", "users", "created_at")]
    #[case("users.meta.created_at", "users", "meta.created_at")]
    fn field_refs_split_on_first_dot(
        #[case] input: &str,
        #[case] collection: &str,
        #[case] field: &str,
    ) {
        let r: FieldRef = input.parse().expect("valid reference");
        assert_eq!(r.collection, collection);
        assert_eq!(r.field, field);
        assert_eq!(r.to_string(), input);
    }

    #[rstest]
    #[case("users")]
    #[case(".created_at")]
    #[case("users.")]
    fn malformed_field_refs_are_rejected(#[case] input: &str) {
        assert!(input.parse::<FieldRef>().is_err());
        assert!(serde_json::from_value::<FieldRef>(serde_json::json!(input)).is_err());
    }

    #[test]
    fn conversion_flags_build_time_steps() {
        let args = LoadArgs {
            convert_time: vec!["users.created_at".parse().expect("valid reference")],
            ..LoadArgs::default()
        };
        let doc: DocumentData = [("created_at", "2019-01-02T12:34:56Z")].into_iter().collect();
        let out = args.pipeline().run("users", doc).expect("convert");
        assert!(matches!(out.get("created_at"), Some(Value::Timestamp(_))));
    }

    #[test]
    fn to_config_requires_root() {
        let err = LoadArgs::default().to_config().expect_err("no root");
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let args = LoadArgs {
            root_dir: Some(PathBuf::from("/fixtures")),
            timeout_secs: Some(2),
            ..LoadArgs::default()
        };
        let config = args.to_config().expect("config");
        assert_eq!(config.root_dir(), Path::new("/fixtures"));
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.format(), FixtureFormat::Auto);
    }
}
