//! On-disk fixture documents.
//!
//! Each scenario owns a directory `<root>/<domain>/<title>/` holding two
//! documents:
//!
//! - `raw-fixture.json`: the fixtures as captured, minus credentials
//! - `normalized-fixture.json`: the output of the normalization pipeline
//!
//! Documents are pretty-printed JSON arrays with a trailing newline, so
//! they diff cleanly under version control. Writes are atomic: a crash
//! leaves either the old or the new document, never a truncated one.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::fixture::Fixture;

/// File name of the captured document.
pub const RAW_FIXTURE_FILE: &str = "raw-fixture.json";

/// File name of the normalized document.
pub const NORMALIZED_FIXTURE_FILE: &str = "normalized-fixture.json";

/// Errors from reading or writing fixture documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// A stored document is not a valid fixture array.
    #[error("invalid fixture document {}: {source}", path.display())]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Fixtures could not be serialized.
    #[error("failed to serialize fixtures: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from parsing a [`ScenarioId`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid scenario id '{0}': expected <domain>/<title>")]
pub struct InvalidScenarioId(pub String);

/// A scenario address, written `<domain>/<title>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScenarioId {
    domain: String,
    title: String,
}

impl ScenarioId {
    /// Creates an id from its parts.
    #[must_use]
    pub fn new(domain: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            title: title.into(),
        }
    }

    /// API host, e.g. `api.github.com`.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Scenario title, e.g. `get-repository`.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.title)
    }
}

impl FromStr for ScenarioId {
    type Err = InvalidScenarioId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid_part =
            |part: &str| !part.is_empty() && part != "." && part != ".." && !part.contains('\\');
        match s.split_once('/') {
            Some((domain, title))
                if valid_part(domain) && valid_part(title) && !title.contains('/') =>
            {
                Ok(Self::new(domain, title))
            },
            _ => Err(InvalidScenarioId(s.to_string())),
        }
    }
}

/// Reads and writes fixture documents below a root directory.
#[derive(Debug, Clone)]
pub struct FixtureStore {
    root: PathBuf,
}

impl FixtureStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one scenario.
    #[must_use]
    pub fn scenario_dir(&self, id: &ScenarioId) -> PathBuf {
        self.root.join(id.domain()).join(id.title())
    }

    /// Reads the raw document, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a fixture
    /// array.
    pub fn read_raw(&self, id: &ScenarioId) -> Result<Option<Vec<Fixture>>, StoreError> {
        read_document(&self.scenario_dir(id).join(RAW_FIXTURE_FILE))
    }

    /// Reads the normalized document, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a fixture
    /// array.
    pub fn read_normalized(&self, id: &ScenarioId) -> Result<Option<Vec<Fixture>>, StoreError> {
        read_document(&self.scenario_dir(id).join(NORMALIZED_FIXTURE_FILE))
    }

    /// Writes the raw document with request credentials removed.
    ///
    /// Everything else is written as captured.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_raw(&self, id: &ScenarioId, fixtures: &[Fixture]) -> Result<(), StoreError> {
        let scrubbed: Vec<Fixture> = fixtures
            .iter()
            .cloned()
            .map(|mut fixture| {
                fixture.remove_credentials();
                fixture
            })
            .collect();
        self.write_document(id, RAW_FIXTURE_FILE, &scrubbed)
    }

    /// Writes the normalized document.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_normalized(&self, id: &ScenarioId, fixtures: &[Fixture]) -> Result<(), StoreError> {
        self.write_document(id, NORMALIZED_FIXTURE_FILE, fixtures)
    }

    /// Lists every scenario with at least one stored document, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be read. A missing root is
    /// an empty store.
    pub fn list(&self) -> Result<Vec<ScenarioId>, StoreError> {
        let mut ids = Vec::new();
        for domain in sub_directories(&self.root)? {
            for title in sub_directories(&self.root.join(&domain))? {
                let id = ScenarioId::new(domain.as_str(), title);
                let dir = self.scenario_dir(&id);
                if dir.join(RAW_FIXTURE_FILE).is_file() || dir.join(NORMALIZED_FIXTURE_FILE).is_file() {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn write_document(
        &self,
        id: &ScenarioId,
        file_name: &str,
        fixtures: &[Fixture],
    ) -> Result<(), StoreError> {
        let dir = self.scenario_dir(id);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut contents = serde_json::to_string_pretty(fixtures)?;
        contents.push('\n');

        let path = dir.join(file_name);
        write_atomic(&dir, &path, contents.as_bytes())?;
        debug!(path = %path.display(), fixtures = fixtures.len(), "wrote fixture document");
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<Option<Vec<Fixture>>, StoreError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        },
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes `bytes` to `path` via a temporary file in `dir`, fsync and rename.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
    temp.as_file_mut().write_all(bytes).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// Names of the sub-directories of `dir`, empty if `dir` does not exist.
fn sub_directories(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: dir.to_path_buf(),
                source,
            });
        },
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}
