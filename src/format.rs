//! Fixture file formats and per-file format detection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FixtureError;

/// Decision policy for the serialisation format of fixture files.
///
/// `Auto` picks the format from each file's extension; the other variants
/// force one format for every file regardless of extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FixtureFormat {
    #[default]
    Auto,
    Json,
    Yaml,
}

impl fmt::Display for FixtureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

impl FromStr for FixtureFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(format!("unknown fixture format '{other}'")),
        }
    }
}

/// Decide which format `path` must be parsed with under `policy`.
///
/// A forced policy wins unconditionally. Under `Auto` the extension is
/// matched case-insensitively: `.json` is JSON, `.yaml` and `.yml` are YAML.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownFormat`] when `policy` is `Auto` and the
/// extension is missing or unrecognised.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mongofixture::format::{FixtureFormat, detect};
///
/// let path = Path::new("fixtures/users.YML");
/// assert_eq!(detect(path, FixtureFormat::Auto).unwrap(), FixtureFormat::Yaml);
/// assert_eq!(detect(path, FixtureFormat::Json).unwrap(), FixtureFormat::Json);
/// ```
pub fn detect(path: &Path, policy: FixtureFormat) -> Result<FixtureFormat, FixtureError> {
    if policy != FixtureFormat::Auto {
        return Ok(policy);
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => Ok(FixtureFormat::Json),
        Some("yaml" | "yml") => Ok(FixtureFormat::Yaml),
        _ => Err(FixtureError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case("users.json", FixtureFormat::Json)]
    #[case("users.JSON", FixtureFormat::Json)]
    #[case("users.yaml", FixtureFormat::Yaml)]
    #[case("users.yml", FixtureFormat::Yaml)]
    #[case("dir.d/users.Yaml", FixtureFormat::Yaml)]
    fn auto_detects_from_extension(#[case] file: &str, #[case] expected: FixtureFormat) {
        let got = detect(Path::new(file), FixtureFormat::Auto).expect("known extension");
        assert_eq!(got, expected);
    }

    #[rstest]
    #[case("users.txt")]
    #[case("users")]
    #[case("users.json.bak")]
    fn auto_rejects_unknown_extensions(#[case] file: &str) {
        let err = detect(Path::new(file), FixtureFormat::Auto).expect_err("unknown extension");
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("unrecognized fixture format"));
    }

    #[rstest]
    #[case(FixtureFormat::Json)]
    #[case(FixtureFormat::Yaml)]
    fn forced_policy_ignores_extension(#[case] policy: FixtureFormat) {
        let got = detect(Path::new("users.txt"), policy).expect("forced");
        assert_eq!(got, policy);
    }

    #[rstest]
    #[case("AUTO", FixtureFormat::Auto)]
    #[case("json", FixtureFormat::Json)]
    #[case("Yml", FixtureFormat::Yaml)]
    fn parses_policy_names(#[case] text: &str, #[case] expected: FixtureFormat) {
        assert_eq!(text.parse::<FixtureFormat>(), Ok(expected));
    }
}
