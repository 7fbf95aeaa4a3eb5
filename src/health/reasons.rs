//! Failure reasons and warnings

use crate::store::{format_size, ArtifactKind};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// Why a run is considered failed, in check order.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// A required artifact is absent
    MissingArtifact(ArtifactKind),
    /// A required artifact is present but not well-formed
    Corrupted {
        /// Which artifact
        kind: ArtifactKind,
        /// Parser message
        message: String,
    },
    /// No reward gauge resolved
    NoRewardMetric,
    /// Resolved reward is zero or negative
    NonPositiveReward(f64),
    /// Measured duration under the crash threshold
    CrashedImmediately(f64),
    /// Training run without checkpoints
    NoCheckpoints,
}

impl FailureReason {
    /// Stable key, used for grouping and JSON output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingArtifact(_) => "missing_artifact",
            Self::Corrupted { .. } => "corrupted",
            Self::NoRewardMetric => "no_reward_metric",
            Self::NonPositiveReward(_) => "non_positive_reward",
            Self::CrashedImmediately(_) => "crashed_immediately",
            Self::NoCheckpoints => "no_checkpoints",
        }
    }

    /// Artifact this reason is about, for structural and parse failures.
    #[must_use]
    pub const fn artifact(&self) -> Option<ArtifactKind> {
        match self {
            Self::MissingArtifact(kind) | Self::Corrupted { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArtifact(kind) => write!(f, "missing {kind}"),
            Self::Corrupted { kind, message } => write!(f, "corrupted {kind}: {message}"),
            Self::NoRewardMetric => f.write_str("no reward metric found"),
            Self::NonPositiveReward(reward) => write!(f, "zero or negative reward: {reward:.2}"),
            Self::CrashedImmediately(seconds) => {
                write!(f, "run crashed immediately (duration: {seconds:.1}s)")
            }
            Self::NoCheckpoints => f.write_str("no checkpoints saved (training run)"),
        }
    }
}

/// Non-fatal findings. Never cause a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthWarning {
    /// Inference run without checkpoints
    NoCheckpointsInference,
    /// Artifact bytes below the small-run threshold
    SmallSize(u64),
    /// A value used by the verdict came from a heuristic
    LowConfidence(String),
}

impl HealthWarning {
    /// Stable key, used for JSON output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NoCheckpointsInference => "no_checkpoints_inference",
            Self::SmallSize(_) => "small_size",
            Self::LowConfidence(_) => "low_confidence",
        }
    }
}

impl fmt::Display for HealthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCheckpointsInference => f.write_str("no checkpoints (inference mode)"),
            Self::SmallSize(bytes) => write!(f, "very small size: {}", format_size(*bytes)),
            Self::LowConfidence(what) => write!(f, "low confidence: {what}"),
        }
    }
}

fn serialize_tagged<S: Serializer>(serializer: S, kind: &str, message: String) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(2))?;
    map.serialize_entry("kind", kind)?;
    map.serialize_entry("message", &message)?;
    map.end()
}

impl Serialize for FailureReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, self.kind(), self.to_string())
    }
}

impl Serialize for HealthWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_tagged(serializer, self.kind(), self.to_string())
    }
}
