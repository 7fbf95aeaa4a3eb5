//! Parsed run artifacts
//!
//! ## Artifact Overview
//!
//! ```text
//! RunArtifactSet ──> ParsedRun
//!                      ├── Loaded<ConfigSnapshot>   (configuration.yaml)
//!                      ├── Loaded<TimersSnapshot>   (run_logs/timers.json)
//!                      └── Loaded<TrainingStatus>   (run_logs/training_status.json)
//! ```
//!
//! Every snapshot is in one of three states: absent, malformed (with the
//! parser message), or parsed. Loading a run never fails as a whole.

mod config;
mod derived;
mod status;
mod timers;

pub use config::{BehaviorSettings, ConfigSnapshot, EngineSettings};
pub use derived::{
    style_frequency, RewardBreakdown, RewardComponents, StaminaData, StaminaPoint,
    StaminaTrajectory, DEFAULT_STYLE_FREQUENCY,
};
pub use status::{BehaviorStatus, CheckpointRecord, TrainingStatus};
pub use timers::{GaugeStat, RunTiming, TimersSnapshot};

use crate::store::{ArtifactKind, RunArtifactSet};
use std::path::Path;
use tracing::debug;

/// Load state of one artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    /// File not present
    Absent,
    /// File present but not well-formed
    Malformed(String),
    /// Parsed successfully
    Parsed(T),
}

impl<T> Loaded<T> {
    /// Parsed value, if any.
    #[must_use]
    pub const fn parsed(&self) -> Option<&T> {
        match self {
            Self::Parsed(value) => Some(value),
            _ => None,
        }
    }

    /// Parser message, if the artifact is malformed.
    #[must_use]
    pub fn malformed(&self) -> Option<&str> {
        match self {
            Self::Malformed(message) => Some(message),
            _ => None,
        }
    }
}

/// A run with its three snapshots loaded.
#[derive(Debug, Clone)]
pub struct ParsedRun {
    artifacts: RunArtifactSet,
    config: Loaded<ConfigSnapshot>,
    timers: Loaded<TimersSnapshot>,
    status: Loaded<TrainingStatus>,
}

impl ParsedRun {
    /// Read and parse every located snapshot of `artifacts`.
    #[must_use]
    pub fn load(artifacts: RunArtifactSet) -> Self {
        let config = load_with(&artifacts, ArtifactKind::Config, ConfigSnapshot::from_yaml_str);
        let timers = load_with(&artifacts, ArtifactKind::Timers, TimersSnapshot::from_json_str);
        let status =
            load_with(&artifacts, ArtifactKind::TrainingStatus, TrainingStatus::from_json_str);
        Self { artifacts, config, timers, status }
    }

    /// Assemble from already loaded parts.
    #[must_use]
    pub const fn from_parts(
        artifacts: RunArtifactSet,
        config: Loaded<ConfigSnapshot>,
        timers: Loaded<TimersSnapshot>,
        status: Loaded<TrainingStatus>,
    ) -> Self {
        Self { artifacts, config, timers, status }
    }

    /// Located artifacts.
    #[must_use]
    pub const fn artifacts(&self) -> &RunArtifactSet {
        &self.artifacts
    }

    /// Run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.artifacts.run_id()
    }

    /// Configuration snapshot.
    #[must_use]
    pub const fn config(&self) -> &Loaded<ConfigSnapshot> {
        &self.config
    }

    /// Scalar-log snapshot.
    #[must_use]
    pub const fn timers(&self) -> &Loaded<TimersSnapshot> {
        &self.timers
    }

    /// Status snapshot.
    #[must_use]
    pub const fn status(&self) -> &Loaded<TrainingStatus> {
        &self.status
    }

    /// Load state of one required snapshot, type-erased to its parser message.
    #[must_use]
    pub fn malformed(&self, kind: ArtifactKind) -> Option<&str> {
        match kind {
            ArtifactKind::Config => self.config.malformed(),
            ArtifactKind::Timers => self.timers.malformed(),
            ArtifactKind::TrainingStatus => self.status.malformed(),
            _ => None,
        }
    }
}

fn load_with<T>(
    artifacts: &RunArtifactSet,
    kind: ArtifactKind,
    parse: impl Fn(&str) -> crate::Result<T>,
) -> Loaded<T> {
    let Some(path) = artifacts.artifact(kind) else {
        return Loaded::Absent;
    };
    match read_and_parse(path, parse) {
        Ok(value) => Loaded::Parsed(value),
        Err(message) => {
            debug!(run_id = %artifacts.run_id(), artifact = %kind, %message, "malformed artifact");
            Loaded::Malformed(message)
        }
    }
}

fn read_and_parse<T>(path: &Path, parse: impl Fn(&str) -> crate::Result<T>) -> Result<T, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    parse(&text).map_err(|e| match e {
        crate::Error::Json(inner) => inner.to_string(),
        crate::Error::Yaml(inner) => inner.to_string(),
        other => other.to_string(),
    })
}
