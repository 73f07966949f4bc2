//! Map logical fixture names onto files under the fixture root.
//!
//! A name such as `json/admin_users` is split on `/`: the last segment is
//! the extension-free base name and the rest are subdirectories of the root.
//! The search directory must contain exactly one non-directory entry whose
//! stem equals the base name.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::deadline::Deadline;
use crate::error::FixtureError;

/// Validated slash-delimited fixture name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixtureName {
    raw: String,
    segments: Vec<String>,
}

impl FixtureName {
    /// Parse and validate `name`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidName`] for empty names, empty segments
    /// (`a//b`, trailing `/`) and the relative segments `.` and `..`.
    pub fn parse(name: &str) -> Result<Self, FixtureError> {
        let invalid = |reason| FixtureError::InvalidName {
            name: name.to_owned(),
            reason,
        };
        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        let segments: Vec<String> = name.split('/').map(str::to_owned).collect();
        if segments.iter().any(String::is_empty) {
            return Err(invalid("empty path segment"));
        }
        if segments.iter().any(|s| s == "." || s == "..") {
            return Err(invalid("relative path segment"));
        }
        Ok(Self {
            raw: name.to_owned(),
            segments,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Extension-free file name the fixture resolves to.
    #[must_use]
    pub fn base(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Subdirectories between the root and the file.
    #[must_use]
    pub fn dirs(&self) -> &[String] {
        self.segments.split_last().map_or(&[], |(_, dirs)| dirs)
    }

    /// Directory under `root` that must contain the fixture file.
    #[must_use]
    pub fn search_dir(&self, root: &Path) -> PathBuf {
        self.dirs().iter().fold(root.to_path_buf(), |dir, s| dir.join(s))
    }
}

impl FromStr for FixtureName {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FixtureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn matches_base(file_name: &Path, base: &str) -> bool {
    file_name.file_stem().and_then(|s| s.to_str()) == Some(base)
}

/// Resolve `name` to the single matching file under `root`.
///
/// # Errors
///
/// - [`FixtureError::ListDir`] when the search directory cannot be listed.
/// - [`FixtureError::NotFound`] when no file matches.
/// - [`FixtureError::Ambiguous`] when several files share the base name.
/// - [`FixtureError::DeadlineExceeded`] when `deadline` elapses.
pub async fn resolve(
    root: &Path,
    name: &FixtureName,
    deadline: Deadline,
) -> Result<PathBuf, FixtureError> {
    let dir = name.search_dir(root);
    let list_err = |source| FixtureError::ListDir {
        dir: dir.clone(),
        source,
    };
    let stage = || format!("listing {}", dir.display());

    let mut entries = deadline
        .run(stage, tokio::fs::read_dir(&dir))
        .await?
        .map_err(list_err)?;
    let mut candidates = Vec::new();
    while let Some(entry) = deadline
        .run(stage, entries.next_entry())
        .await?
        .map_err(list_err)?
    {
        let file_name = PathBuf::from(entry.file_name());
        if !matches_base(&file_name, name.base()) {
            continue;
        }
        let file_type = deadline
            .run(stage, entry.file_type())
            .await?
            .map_err(list_err)?;
        // Symlinks count as files unless they point at a directory.
        let is_dir = if file_type.is_symlink() {
            deadline
                .run(stage, tokio::fs::metadata(entry.path()))
                .await?
                .is_ok_and(|m| m.is_dir())
        } else {
            file_type.is_dir()
        };
        if !is_dir {
            candidates.push(entry.path());
        }
    }
    candidates.sort();

    if candidates.len() > 1 {
        return Err(FixtureError::Ambiguous {
            name: name.to_string(),
            candidates,
        });
    }
    let Some(path) = candidates.pop() else {
        return Err(FixtureError::NotFound {
            name: name.to_string(),
            root: dir,
        });
    };
    debug!("fixture {name} resolved to {}", path.display());
    Ok(path)
}
