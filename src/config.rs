//! Scan options
//!
//! Options come from defaults, an optional TOML file, and builder calls (the
//! binary maps its flags onto the builder):
//!
//! ```toml
//! results_dir = "results"
//! workers = 4
//! order = "modified_newest_first"
//! max_points = 500
//! min_duration_seconds = 10.0
//! small_run_bytes = 102400
//! comparative_limit = 10
//! ```

use crate::downsample::DEFAULT_MAX_POINTS;
use crate::health::HealthThresholds;
use crate::store::RunOrdering;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound of the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// Default number of runs in comparative training curves.
pub const DEFAULT_COMPARATIVE_LIMIT: usize = 10;

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, std::num::NonZeroUsize::get)
        .min(MAX_DEFAULT_WORKERS)
}

/// Options for scanning a results directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanOptions {
    /// Results root
    pub results_dir: PathBuf,
    /// Worker threads for the per-run pipeline
    pub workers: usize,
    /// Run listing order
    pub order: RunOrdering,
    /// Point cap for rendered series
    pub max_points: usize,
    /// Runs shorter than this are treated as crashed
    pub min_duration_seconds: f64,
    /// Runs smaller than this get a warning
    pub small_run_bytes: u64,
    /// Training runs included in comparative curves
    pub comparative_limit: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
            workers: default_workers(),
            order: RunOrdering::Name,
            max_points: DEFAULT_MAX_POINTS,
            min_duration_seconds: HealthThresholds::DEFAULT_MIN_DURATION_SECONDS,
            small_run_bytes: HealthThresholds::DEFAULT_SMALL_RUN_BYTES,
            comparative_limit: DEFAULT_COMPARATIVE_LIMIT,
        }
    }
}

impl ScanOptions {
    /// Create an options builder starting from defaults.
    #[must_use]
    pub fn builder() -> ScanOptionsBuilder {
        ScanOptionsBuilder::default()
    }

    /// Parse options from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the TOML is malformed, has unknown keys, or holds
    /// invalid values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text)?;
        options.validate()
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or [`ScanOptions::from_toml_str`] fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Classifier thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> HealthThresholds {
        HealthThresholds {
            min_duration_seconds: self.min_duration_seconds,
            small_run_bytes: self.small_run_bytes,
        }
    }

    fn validate(self) -> Result<Self> {
        if self.workers == 0 {
            return Err(Error::InvalidInput("workers must be at least 1".to_string()));
        }
        if self.max_points == 0 {
            return Err(Error::InvalidInput("max_points must be at least 1".to_string()));
        }
        if !self.min_duration_seconds.is_finite() || self.min_duration_seconds < 0.0 {
            return Err(Error::InvalidInput(format!(
                "min_duration_seconds must be a non-negative number, got {}",
                self.min_duration_seconds
            )));
        }
        Ok(self)
    }
}

/// Builder for [`ScanOptions`]
#[derive(Debug, Clone, Default)]
pub struct ScanOptionsBuilder {
    options: ScanOptions,
}

impl ScanOptionsBuilder {
    /// Start from already loaded options (e.g. a TOML file).
    #[must_use]
    pub const fn from_options(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Set the results root
    #[must_use]
    pub fn results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.results_dir = dir.into();
        self
    }

    /// Set the worker count
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.options.workers = workers;
        self
    }

    /// Set the run listing order
    #[must_use]
    pub fn order(mut self, order: RunOrdering) -> Self {
        self.options.order = order;
        self
    }

    /// Set the point cap for rendered series
    #[must_use]
    pub fn max_points(mut self, max_points: usize) -> Self {
        self.options.max_points = max_points;
        self
    }

    /// Set the crash threshold
    #[must_use]
    pub fn min_duration_seconds(mut self, seconds: f64) -> Self {
        self.options.min_duration_seconds = seconds;
        self
    }

    /// Set the small-run threshold
    #[must_use]
    pub fn small_run_bytes(mut self, bytes: u64) -> Self {
        self.options.small_run_bytes = bytes;
        self
    }

    /// Set the number of runs in comparative curves
    #[must_use]
    pub fn comparative_limit(mut self, limit: usize) -> Self {
        self.options.comparative_limit = limit;
        self
    }

    /// Build the options
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range (zero workers, zero point cap,
    /// negative duration threshold)
    pub fn build(self) -> Result<ScanOptions> {
        self.options.validate()
    }
}
