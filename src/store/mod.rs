//! Artifact store - read-only view over a results directory
//!
//! Every run lives in its own directory under the results root:
//!
//! ```text
//! results/
//! └── <run_id>/
//!     ├── configuration.yaml
//!     ├── metadata.json
//!     └── run_logs/
//!         ├── timers.json
//!         ├── training_status.json
//!         └── *_over_time.json, episode_data.json, ...
//! ```
//!
//! A missing file is a normal state: lookups return `None`, never an error.
//! Directories that cannot be read are skipped and not reported as runs.

mod layout;

pub use layout::ArtifactKind;

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

/// Ordering of [`ArtifactStore::list_runs`] results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOrdering {
    /// Directory name ascending
    #[default]
    Name,
    /// Modification time, oldest first (ties by name)
    ModifiedOldestFirst,
    /// Modification time, newest first (ties by name)
    ModifiedNewestFirst,
}

/// Located artifacts of one run directory.
///
/// Constructed once per scan and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunArtifactSet {
    run_id: String,
    path: PathBuf,
    config: Option<PathBuf>,
    timers: Option<PathBuf>,
    status: Option<PathBuf>,
    size_bytes: u64,
    #[serde(skip)]
    modified: Option<SystemTime>,
}

impl RunArtifactSet {
    /// Inspect a run directory. Returns `None` if `path` is not a readable directory.
    fn inspect(path: &Path) -> Option<Self> {
        let metadata = match fs::metadata(path) {
            Ok(m) if m.is_dir() => m,
            Ok(_) => return None,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "skipping unreadable run directory");
                return None;
            }
        };
        // Permission errors surface here rather than on metadata().
        if let Err(e) = fs::read_dir(path) {
            debug!(path = %path.display(), error = %e, "skipping unreadable run directory");
            return None;
        }

        let run_id = path.file_name()?.to_string_lossy().into_owned();
        let existing = |kind: ArtifactKind| {
            let candidate = kind.path_in(path);
            candidate.is_file().then_some(candidate)
        };

        Some(Self {
            config: existing(ArtifactKind::Config),
            timers: existing(ArtifactKind::Timers),
            status: existing(ArtifactKind::TrainingStatus),
            size_bytes: dir_size(path),
            modified: metadata.modified().ok(),
            run_id,
            path: path.to_path_buf(),
        })
    }

    /// An artifact set not backed by a scanned directory, with nothing located.
    ///
    /// Used to classify runs assembled in memory.
    #[must_use]
    pub fn detached(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        Self {
            path: PathBuf::from(&run_id),
            run_id,
            config: None,
            timers: None,
            status: None,
            size_bytes: 0,
            modified: None,
        }
    }

    /// Record a required snapshot as present at `path`. Other kinds are ignored.
    #[must_use]
    pub fn with_artifact(mut self, kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        let path = Some(path.into());
        match kind {
            ArtifactKind::Config => self.config = path,
            ArtifactKind::Timers => self.timers = path,
            ArtifactKind::TrainingStatus => self.status = path,
            _ => {}
        }
        self
    }

    /// Set the directory byte size.
    #[must_use]
    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    /// Run identifier (the directory name).
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Run directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of one of the required snapshots, if present.
    ///
    /// Derived artifacts are not tracked here; use [`ArtifactStore::locate`].
    #[must_use]
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Path> {
        match kind {
            ArtifactKind::Config => self.config.as_deref(),
            ArtifactKind::Timers => self.timers.as_deref(),
            ArtifactKind::TrainingStatus => self.status.as_deref(),
            _ => None,
        }
    }

    /// Required snapshots that are missing, in check order.
    #[must_use]
    pub fn missing_required(&self) -> Vec<ArtifactKind> {
        ArtifactKind::REQUIRED
            .into_iter()
            .filter(|kind| self.artifact(*kind).is_none())
            .collect()
    }

    /// Total size in bytes of all files under the run directory.
    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Directory modification time, if the filesystem reports one.
    #[must_use]
    pub const fn modified(&self) -> Option<SystemTime> {
        self.modified
    }
}

/// Read-only store over a results directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root`. The directory does not need to exist.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Results root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all run directories.
    ///
    /// A missing results root yields an empty list. Entries that are not
    /// directories, or that cannot be read, are skipped.
    #[must_use]
    pub fn list_runs(&self, order: RunOrdering) -> Vec<RunArtifactSet> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "results directory not readable");
                return Vec::new();
            }
        };

        let mut runs: Vec<RunArtifactSet> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| RunArtifactSet::inspect(&entry.path()))
            .collect();

        match order {
            RunOrdering::Name => runs.sort_by(|a, b| a.run_id.cmp(&b.run_id)),
            RunOrdering::ModifiedOldestFirst => {
                runs.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.run_id.cmp(&b.run_id)));
            }
            RunOrdering::ModifiedNewestFirst => {
                runs.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.run_id.cmp(&b.run_id)));
            }
        }

        debug!(root = %self.root.display(), count = runs.len(), "listed runs");
        runs
    }

    /// Look up a single run by identifier.
    ///
    /// Identifiers that are not a plain directory name never match.
    #[must_use]
    pub fn run(&self, run_id: &str) -> Option<RunArtifactSet> {
        if !is_plain_name(run_id) {
            return None;
        }
        RunArtifactSet::inspect(&self.root.join(run_id))
    }

    /// Resolve the path of an artifact of a run, if the file exists.
    #[must_use]
    pub fn locate(&self, run_id: &str, kind: ArtifactKind) -> Option<PathBuf> {
        if !is_plain_name(run_id) {
            return None;
        }
        let path = kind.path_in(&self.root.join(run_id));
        path.is_file().then_some(path)
    }

    /// Read and deserialize a JSON artifact of a run.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactParse`] if the file exists but is malformed.
    pub fn read_json<T: DeserializeOwned>(&self, run_id: &str, kind: ArtifactKind) -> Result<Option<T>> {
        self.locate(run_id, kind)
            .map(|path| read_json_file(&path))
            .transpose()
    }

    /// Read and deserialize a YAML artifact of a run.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactParse`] if the file exists but is malformed.
    pub fn read_yaml<T: DeserializeOwned>(&self, run_id: &str, kind: ArtifactKind) -> Result<Option<T>> {
        self.locate(run_id, kind)
            .map(|path| read_yaml_file(&path))
            .transpose()
    }
}

/// Read a JSON file, mapping any failure to [`Error::ArtifactParse`].
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid JSON for `T`.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| Error::artifact_parse(file_label(path), e))?;
    serde_json::from_slice(&bytes).map_err(|e| Error::artifact_parse(file_label(path), e))
}

/// Read a YAML file, mapping any failure to [`Error::ArtifactParse`].
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid YAML for `T`.
pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| Error::artifact_parse(file_label(path), e))?;
    serde_yaml::from_str(&text).map_err(|e| Error::artifact_parse(file_label(path), e))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

fn is_plain_name(run_id: &str) -> bool {
    !run_id.is_empty()
        && run_id != "."
        && run_id != ".."
        && !run_id.contains(&['/', '\\'][..])
}

/// Recursive byte size of all regular files under `path`.
///
/// Unreadable entries are skipped. Symlinks are not followed.
#[must_use]
pub fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| match entry.file_type() {
            Ok(ft) if ft.is_dir() => dir_size(&entry.path()),
            Ok(ft) if ft.is_file() => entry.metadata().map_or(0, |m| m.len()),
            _ => 0,
        })
        .sum()
}

/// Human readable byte size with one decimal (`12.0KB`, `3.4MB`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1}{unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1}TB")
}
