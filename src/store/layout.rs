//! File layout of a run directory

use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of artifact a run may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// `configuration.yaml`
    Config,
    /// `run_logs/timers.json` (scalar-log snapshot)
    Timers,
    /// `run_logs/training_status.json` (status snapshot)
    TrainingStatus,
    /// `run_logs/action_distribution_over_time.json`
    ActionDistribution,
    /// `run_logs/losses_over_time.json`
    Losses,
    /// `run_logs/entropy_over_time.json`
    Entropy,
    /// `run_logs/episode_data.json`
    EpisodeData,
    /// `run_logs/stamina_trajectories.json`
    StaminaTrajectories,
    /// `run_logs/reward_components.json`
    RewardComponents,
    /// `run_logs/scalars.json` (raw scalar dump)
    Scalars,
    /// `metadata.json`
    Metadata,
}

impl ArtifactKind {
    /// Snapshots every healthy run must carry, in check order.
    pub const REQUIRED: [Self; 3] = [Self::Config, Self::Timers, Self::TrainingStatus];

    /// Path relative to the run directory.
    #[must_use]
    pub const fn relative_path(self) -> &'static str {
        match self {
            Self::Config => "configuration.yaml",
            Self::Timers => "run_logs/timers.json",
            Self::TrainingStatus => "run_logs/training_status.json",
            Self::ActionDistribution => "run_logs/action_distribution_over_time.json",
            Self::Losses => "run_logs/losses_over_time.json",
            Self::Entropy => "run_logs/entropy_over_time.json",
            Self::EpisodeData => "run_logs/episode_data.json",
            Self::StaminaTrajectories => "run_logs/stamina_trajectories.json",
            Self::RewardComponents => "run_logs/reward_components.json",
            Self::Scalars => "run_logs/scalars.json",
            Self::Metadata => "metadata.json",
        }
    }

    /// Bare file name.
    #[must_use]
    pub fn file_name(self) -> &'static str {
        let path = self.relative_path();
        path.rsplit('/').next().unwrap_or(path)
    }

    /// Absolute path of this artifact inside `run_dir`.
    #[must_use]
    pub fn path_in(self, run_dir: &Path) -> PathBuf {
        self.relative_path()
            .split('/')
            .fold(run_dir.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}
