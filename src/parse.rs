//! Decode fixture files into [`Dataset`]s.
//!
//! Both grammars share one shape: a mapping from collection name to a
//! mapping from document identifier to a mapping of fields. Decoding goes
//! through `serde_path_to_error` so structural mismatches name the offending
//! location (for example `users.admin1`).

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;

use crate::deadline::Deadline;
use crate::error::FixtureError;
use crate::format::{FixtureFormat, detect};
use crate::value::{CollectionData, Dataset};

/// Decoded file before `null` collections are replaced by empty ones.
type RawDataset = Option<BTreeMap<String, Option<CollectionData>>>;

fn into_dataset(raw: RawDataset) -> Dataset {
    raw.unwrap_or_default()
        .into_iter()
        .map(|(name, docs)| (name, docs.unwrap_or_default()))
        .collect()
}

/// Read and decode the fixture file at `path`.
///
/// The format is detected per file from `policy` (see [`detect`]).
///
/// # Errors
///
/// Returns [`FixtureError::UnknownFormat`], [`FixtureError::Read`],
/// [`FixtureError::Json`], [`FixtureError::Yaml`] or
/// [`FixtureError::DeadlineExceeded`].
pub async fn parse_file(
    path: &Path,
    policy: FixtureFormat,
    deadline: Deadline,
) -> Result<Dataset, FixtureError> {
    let format = detect(path, policy)?;
    let bytes = deadline
        .run(
            || format!("reading {}", path.display()),
            tokio::fs::read(path),
        )
        .await?
        .map_err(|source| FixtureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let dataset = parse_bytes(path, format, &bytes)?;
    debug!(
        "parsed {} as {format}: {} collection(s)",
        path.display(),
        dataset.len()
    );
    Ok(dataset)
}

/// Decode `bytes` as `format`. `path` is only used for error reporting.
///
/// A `null` file (or an empty YAML file) decodes as an empty dataset, and
/// `null` collections and documents decode as empty ones.
///
/// # Errors
///
/// Returns [`FixtureError::Json`] or [`FixtureError::Yaml`] for malformed
/// syntax or a shape other than collection → identifier → fields. Passing
/// [`FixtureFormat::Auto`] yields [`FixtureError::UnknownFormat`].
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mongofixture::format::FixtureFormat;
/// use mongofixture::parse::parse_bytes;
///
/// let yaml = b"users:\n  admin1:\n    name: x\n";
/// let ds = parse_bytes(Path::new("users.yaml"), FixtureFormat::Yaml, yaml).unwrap();
/// assert_eq!(ds["users"]["admin1"].string_value("name"), Some("x"));
/// ```
pub fn parse_bytes(
    path: &Path,
    format: FixtureFormat,
    bytes: &[u8],
) -> Result<Dataset, FixtureError> {
    match format {
        FixtureFormat::Json => parse_json(path, bytes),
        FixtureFormat::Yaml => parse_yaml(path, bytes),
        FixtureFormat::Auto => Err(FixtureError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn parse_json(path: &Path, bytes: &[u8]) -> Result<Dataset, FixtureError> {
    let json_err = |at: String, source| FixtureError::Json {
        path: path.to_path_buf(),
        at,
        source,
    };
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let raw: RawDataset = serde_path_to_error::deserialize(&mut de)
        .map_err(|e| json_err(e.path().to_string(), e.into_inner()))?;
    de.end().map_err(|e| json_err(".".to_owned(), e))?;
    Ok(into_dataset(raw))
}

fn is_blank_yaml(bytes: &[u8]) -> bool {
    String::from_utf8_lossy(bytes).lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn parse_yaml(path: &Path, bytes: &[u8]) -> Result<Dataset, FixtureError> {
    if is_blank_yaml(bytes) {
        return Ok(Dataset::new());
    }
    let de = serde_yaml::Deserializer::from_slice(bytes);
    let raw: RawDataset = serde_path_to_error::deserialize(de).map_err(|e| FixtureError::Yaml {
        path: path.to_path_buf(),
        at: e.path().to_string(),
        source: e.into_inner(),
    })?;
    Ok(into_dataset(raw))
}
