//! Run health classification
//!
//! ## Check Order
//!
//! ```text
//! Structural ──fail──> Failed (one reason per missing artifact)
//!     │ ok
//!     v
//! Parse ──────fail──> Failed (one reason per malformed artifact)
//!     │ ok
//!     v
//! Metrics (reward, duration, checkpoints: all evaluated)
//!     │
//!     v
//! Size heuristic (warning only)
//! ```
//!
//! A run is failed iff its reason list is non-empty. Reasons keep check
//! order, so the first one is the most fundamental.

mod mode;
mod reasons;

pub use mode::{detect_mode, RunMode};
pub use reasons::{FailureReason, HealthWarning};

use crate::artifact::ParsedRun;
use crate::schema::{resolve_behavior, resolve_reward, Provenance, Sourced, TagMatch};
use crate::store::ArtifactKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Classifier thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthThresholds {
    /// Runs shorter than this are treated as crashed
    pub min_duration_seconds: f64,
    /// Runs smaller than this get a warning
    pub small_run_bytes: u64,
}

impl HealthThresholds {
    /// Default crash threshold (seconds).
    pub const DEFAULT_MIN_DURATION_SECONDS: f64 = 10.0;
    /// Default small-run threshold (100 KiB).
    pub const DEFAULT_SMALL_RUN_BYTES: u64 = 100 * 1024;
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            min_duration_seconds: Self::DEFAULT_MIN_DURATION_SECONDS,
            small_run_bytes: Self::DEFAULT_SMALL_RUN_BYTES,
        }
    }
}

/// Last stage the classifier reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStage {
    /// Stopped on missing artifacts
    Structural,
    /// Stopped on malformed artifacts
    Parse,
    /// Metric checks ran
    Metrics,
}

/// Outcome of classifying one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthVerdict {
    /// Run identifier
    pub run_id: String,
    /// True iff `failures` is non-empty
    pub is_failed: bool,
    /// Failure reasons, most fundamental first
    pub failures: Vec<FailureReason>,
    /// Non-fatal findings
    pub warnings: Vec<HealthWarning>,
    /// Resolved reward (metric stage only)
    pub reward: Option<f64>,
    /// Gauge the reward was read from
    pub reward_source: Option<TagMatch>,
    /// [`Provenance::Defaulted`] when the gauge carried no value and `0.0` was assumed
    pub reward_provenance: Option<Provenance>,
    /// Measured duration (metric stage only)
    pub duration_seconds: Option<f64>,
    /// Checkpoints across all behaviors
    pub checkpoint_count: usize,
    /// Bytes under the run directory
    pub size_bytes: u64,
    /// Detected mode (metric stage only)
    pub mode: Option<Sourced<RunMode>>,
    /// Last stage reached
    pub stage: CheckStage,
}

impl HealthVerdict {
    fn new(run: &ParsedRun, stage: CheckStage, failures: Vec<FailureReason>) -> Self {
        Self {
            run_id: run.run_id().to_string(),
            is_failed: !failures.is_empty(),
            failures,
            warnings: Vec::new(),
            reward: None,
            reward_source: None,
            reward_provenance: None,
            duration_seconds: None,
            checkpoint_count: 0,
            size_bytes: run.artifacts().size_bytes(),
            mode: None,
            stage,
        }
    }

    /// First failure reason, if failed.
    #[must_use]
    pub fn primary_reason(&self) -> Option<&FailureReason> {
        self.failures.first()
    }

    /// One-line summary: `[OK] <reward>` or `[FAIL] <first two reasons>`.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.is_failed {
            let shown: Vec<String> = self.failures.iter().take(2).map(ToString::to_string).collect();
            format!("[FAIL] {}", shown.join(", "))
        } else {
            match self.reward {
                Some(reward) => format!("[OK] {reward:.2}"),
                None => "[OK]".to_string(),
            }
        }
    }
}

/// Classify one parsed run.
///
/// # Examples
///
/// ```rust
/// use runlens::artifact::{Loaded, ParsedRun};
/// use runlens::health::{classify, FailureReason, HealthThresholds};
/// use runlens::store::{ArtifactKind, RunArtifactSet};
///
/// let run = ParsedRun::from_parts(
///     RunArtifactSet::detached("empty_run"),
///     Loaded::Absent,
///     Loaded::Absent,
///     Loaded::Absent,
/// );
/// let verdict = classify(&run, &HealthThresholds::default());
/// assert!(verdict.is_failed);
/// assert_eq!(verdict.failures[0], FailureReason::MissingArtifact(ArtifactKind::Config));
/// assert_eq!(verdict.failures.len(), 3);
/// ```
#[must_use]
pub fn classify(run: &ParsedRun, thresholds: &HealthThresholds) -> HealthVerdict {
    // Structural
    let missing: Vec<FailureReason> = ArtifactKind::REQUIRED
        .into_iter()
        .filter(|kind| is_absent(run, *kind))
        .map(FailureReason::MissingArtifact)
        .collect();
    if !missing.is_empty() {
        debug!(run_id = %run.run_id(), missing = missing.len(), "structural check failed");
        return HealthVerdict::new(run, CheckStage::Structural, missing);
    }

    // Parse
    let corrupted: Vec<FailureReason> = ArtifactKind::REQUIRED
        .into_iter()
        .filter_map(|kind| {
            run.malformed(kind).map(|message| FailureReason::Corrupted {
                kind,
                message: message.to_string(),
            })
        })
        .collect();
    if !corrupted.is_empty() {
        debug!(run_id = %run.run_id(), corrupted = corrupted.len(), "parse check failed");
        return HealthVerdict::new(run, CheckStage::Parse, corrupted);
    }

    // Metrics
    let config = run.config().parsed();
    let timers = run.timers().parsed();
    let status = run.status().parsed();

    let mut failures = Vec::new();
    let mut warnings = Vec::new();

    let behavior = resolve_behavior(config, status);
    let resolved = timers.and_then(|t| resolve_reward(Some(&behavior.value), t.gauges()));
    let reward = resolved.as_ref().map(|r| match r.value {
        Some(value) => Sourced::new(value, Provenance::Observed),
        None => Sourced::new(0.0, Provenance::Defaulted),
    });
    if reward.is_some_and(|r| r.provenance == Provenance::Defaulted) {
        debug!(run_id = %run.run_id(), "reward gauge has no value, assuming 0.0");
        warnings.push(HealthWarning::LowConfidence("reward value missing, assumed 0.0".to_string()));
    }
    match reward.map(|r| r.value) {
        None => failures.push(FailureReason::NoRewardMetric),
        Some(value) if value <= 0.0 => failures.push(FailureReason::NonPositiveReward(value)),
        Some(_) => {}
    }
    if let Some(TagMatch::Heuristic(tag)) = resolved.as_ref().map(|r| &r.source) {
        warnings.push(HealthWarning::LowConfidence(format!("reward read from {tag}")));
    }

    let duration_seconds = timers.and_then(|t| t.timing().duration_seconds());
    if let Some(duration) = duration_seconds.filter(|d| *d < thresholds.min_duration_seconds) {
        failures.push(FailureReason::CrashedImmediately(duration));
    }

    let checkpoint_count = status.map_or(0, |s| s.checkpoint_count());
    let mode = detect_mode(config, run.run_id());
    if checkpoint_count == 0 {
        match mode.value {
            RunMode::Training => failures.push(FailureReason::NoCheckpoints),
            RunMode::Inference => warnings.push(HealthWarning::NoCheckpointsInference),
        }
        if mode.provenance == Provenance::Heuristic {
            warnings.push(HealthWarning::LowConfidence(format!(
                "{} mode guessed from run name",
                mode.value
            )));
        }
    }

    // Size heuristic
    let size_bytes = run.artifacts().size_bytes();
    if size_bytes < thresholds.small_run_bytes {
        warnings.push(HealthWarning::SmallSize(size_bytes));
    }

    HealthVerdict {
        run_id: run.run_id().to_string(),
        is_failed: !failures.is_empty(),
        failures,
        warnings,
        reward: reward.map(|r| r.value),
        reward_source: resolved.map(|r| r.source),
        reward_provenance: reward.map(|r| r.provenance),
        duration_seconds,
        checkpoint_count,
        size_bytes,
        mode: Some(mode),
        stage: CheckStage::Metrics,
    }
}

fn is_absent(run: &ParsedRun, kind: ArtifactKind) -> bool {
    run.artifacts().artifact(kind).is_none()
}
