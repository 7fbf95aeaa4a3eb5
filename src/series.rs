//! Per-run series for the presentation layer
//!
//! Each family is read from its derived file when present. Without one, the
//! action, loss and entropy families fall back to the final gauge values of
//! the scalar-log snapshot ([`FamilyData::FinalValuesOnly`]).
//!
//! [`reconcile_run`] rebuilds the derived files from a raw scalar dump and
//! [`ReconciledRun::persist`] writes them, never replacing a richer file.

use crate::artifact::{
    style_frequency, ParsedRun, RewardBreakdown, StaminaData, TrainingStatus,
};
use crate::compare::{training_curve, RunOverview, TrainingCurve};
use crate::downsample::reduce_combined;
use crate::reconcile::{
    choose_richer, reconstruct_episodes, CombinedSeries, DatasetChoice, EpisodeData, ScalarLog,
    SeriesFamily,
};
use crate::schema::{aliases, Sourced};
use crate::store::{read_json_file, ArtifactKind, ArtifactStore, RunArtifactSet};
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A family as available for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "availability", content = "series", rename_all = "snake_case")]
pub enum FamilyData {
    /// Full time series
    TimeSeries(CombinedSeries),
    /// Only the final value of each field
    FinalValuesOnly(BTreeMap<String, Option<f64>>),
    /// Nothing recorded
    Unavailable,
}

impl FamilyData {
    /// Reduce a time series to at most `max_points` rows; other states are unchanged.
    #[must_use]
    pub fn downsampled(self, max_points: usize) -> Self {
        match self {
            Self::TimeSeries(series) => Self::TimeSeries(reduce_combined(&series, max_points)),
            other => other,
        }
    }
}

fn require_run(store: &ArtifactStore, run_id: &str) -> Result<RunArtifactSet> {
    store.run(run_id).ok_or_else(|| Error::RunNotFound(run_id.to_string()))
}

/// Load one family of a run.
///
/// # Errors
///
/// Returns [`Error::RunNotFound`] for an unknown run and
/// [`Error::ArtifactParse`] if the derived file exists but is malformed.
pub fn load_family(store: &ArtifactStore, run_id: &str, family: SeriesFamily) -> Result<FamilyData> {
    let artifacts = require_run(store, run_id)?;

    if let Some(document) = store.read_json::<Value>(run_id, family.artifact())? {
        return Ok(FamilyData::TimeSeries(CombinedSeries::from_data_value(
            &document,
            family.fields(),
        )));
    }

    let overview = RunOverview::from_parsed(&ParsedRun::load(artifacts));
    if overview.key_metrics.is_none() {
        return Ok(FamilyData::Unavailable);
    }
    let finals: BTreeMap<String, Option<f64>> = family
        .final_value_gauges()
        .into_iter()
        .map(|(field, gauge)| (field.to_string(), overview.final_value(gauge)))
        .collect();

    if finals.values().all(Option::is_none) {
        return Ok(FamilyData::Unavailable);
    }
    debug!(run_id, ?family, "no derived series file, using final gauge values");
    Ok(FamilyData::FinalValuesOnly(finals))
}

/// Load `episode_data.json`. `Ok(None)` when absent.
///
/// # Errors
///
/// Returns error for an unknown run or a malformed file.
pub fn load_episodes(store: &ArtifactStore, run_id: &str) -> Result<Option<EpisodeData>> {
    require_run(store, run_id)?;
    Ok(store
        .read_json::<Value>(run_id, ArtifactKind::EpisodeData)?
        .map(|v| EpisodeData::from_value(&v)))
}

/// Load and validate `stamina_trajectories.json`. `Ok(None)` when absent.
///
/// # Errors
///
/// Returns error for an unknown run or a file that is not valid JSON.
pub fn load_stamina(store: &ArtifactStore, run_id: &str) -> Result<Option<StaminaData>> {
    require_run(store, run_id)?;
    Ok(store
        .read_json::<Value>(run_id, ArtifactKind::StaminaTrajectories)?
        .map(|v| StaminaData::from_value(&v)))
}

/// Load `reward_components.json`, rows sorted by step. `Ok(None)` when absent.
///
/// # Errors
///
/// Returns error for an unknown run or a malformed file.
pub fn load_reward_breakdown(store: &ArtifactStore, run_id: &str) -> Result<Option<RewardBreakdown>> {
    require_run(store, run_id)?;
    Ok(store
        .read_json::<RewardBreakdown>(run_id, ArtifactKind::RewardComponents)?
        .map(RewardBreakdown::sorted))
}

/// Reward over checkpoints. `Ok(None)` when no checkpoint carries a reward.
///
/// # Errors
///
/// Returns [`Error::RunNotFound`] for an unknown run.
pub fn load_training_curve(store: &ArtifactStore, run_id: &str) -> Result<Option<TrainingCurve>> {
    let artifacts = require_run(store, run_id)?;
    Ok(training_curve(&RunOverview::from_parsed(&ParsedRun::load(artifacts))))
}

/// Roll usage against the configured style episode frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollUsage {
    /// Style episode frequency
    pub style_frequency: Sourced<f64>,
    /// Final roll percentage, when logged
    pub roll_usage: Option<f64>,
}

/// Roll usage of a run.
///
/// An unreadable `metadata.json` is treated like a missing one.
///
/// # Errors
///
/// Returns [`Error::RunNotFound`] for an unknown run.
pub fn roll_usage(store: &ArtifactStore, run_id: &str) -> Result<RollUsage> {
    let artifacts = require_run(store, run_id)?;
    let metadata = store
        .read_json::<Value>(run_id, ArtifactKind::Metadata)
        .unwrap_or_else(|e| {
            debug!(run_id, error = %e, "ignoring unreadable run metadata");
            None
        });
    let frequency = style_frequency(metadata.as_ref());
    if frequency.provenance.is_lower_confidence() {
        debug!(run_id, value = frequency.value, "style frequency defaulted");
    }

    let overview = RunOverview::from_parsed(&ParsedRun::load(artifacts));
    Ok(RollUsage {
        style_frequency: frequency,
        roll_usage: overview.final_value(aliases::gauge::ROLL_PERCENTAGE),
    })
}

/// Checkpoint status snapshot of a run, if present and parseable.
///
/// # Errors
///
/// Returns error for an unknown run or a malformed file.
pub fn load_status(store: &ArtifactStore, run_id: &str) -> Result<Option<TrainingStatus>> {
    require_run(store, run_id)?;
    Ok(store
        .read_json::<Value>(run_id, ArtifactKind::TrainingStatus)?
        .map(|v| TrainingStatus::from_value(&v)))
}

/// Families rebuilt from a raw scalar dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRun {
    /// Run identifier
    pub run_id: String,
    /// Derived families; unavailable ones are absent
    pub families: BTreeMap<String, CombinedSeries>,
    /// Reconstructed episodes
    pub episodes: EpisodeData,
}

/// What [`ReconciledRun::persist`] did with one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    /// File written or kept
    pub artifact: ArtifactKind,
    /// Decision taken
    pub choice: DatasetChoice,
}

/// Rebuild the derived families of a run from `run_logs/scalars.json`.
///
/// # Errors
///
/// Returns [`Error::RunNotFound`] for an unknown run, or if the run has no
/// scalar dump; [`Error::ArtifactParse`] if the dump is malformed.
pub fn reconcile_run(store: &ArtifactStore, run_id: &str) -> Result<ReconciledRun> {
    require_run(store, run_id)?;
    let dump = store
        .read_json::<Value>(run_id, ArtifactKind::Scalars)?
        .ok_or_else(|| Error::RunNotFound(format!("{run_id} has no {}", ArtifactKind::Scalars)))?;
    let scalars = ScalarLog::from_value(&dump);

    let families = SeriesFamily::ALL
        .into_iter()
        .filter_map(|family| {
            family
                .derive(&scalars)
                .map(|series| (family.artifact().file_name().to_string(), series))
        })
        .collect();

    Ok(ReconciledRun {
        run_id: run_id.to_string(),
        families,
        episodes: reconstruct_episodes(&scalars),
    })
}

impl ReconciledRun {
    /// Write the derived files into `run_dir/run_logs`, keeping any existing
    /// file with at least as many rows.
    ///
    /// # Errors
    ///
    /// Returns error if a file cannot be written.
    pub fn persist(&self, run_dir: &Path) -> Result<Vec<PersistOutcome>> {
        let mut outcomes = Vec::new();

        for family in SeriesFamily::ALL {
            let artifact = family.artifact();
            let Some(series) = self.families.get(artifact.file_name()) else {
                continue;
            };
            let path = artifact.path_in(run_dir);
            let existing = existing_rows(&path, |v| {
                CombinedSeries::from_data_value(v, family.fields()).len()
            });
            let choice = choose_richer(existing, series.len());
            if choice == DatasetChoice::UseFresh {
                write_json(&path, series)?;
            }
            outcomes.push(PersistOutcome { artifact, choice });
        }

        if !self.episodes.is_empty() {
            let artifact = ArtifactKind::EpisodeData;
            let path = artifact.path_in(run_dir);
            let existing = existing_rows(&path, |v| EpisodeData::from_value(v).len());
            let choice = choose_richer(existing, self.episodes.len());
            if choice == DatasetChoice::UseFresh {
                write_json(&path, &self.episodes)?;
            } else {
                info!(
                    run_id = %self.run_id,
                    existing = existing.unwrap_or_default(),
                    fresh = self.episodes.len(),
                    "keeping existing episode data"
                );
            }
            outcomes.push(PersistOutcome { artifact, choice });
        }

        Ok(outcomes)
    }
}

fn existing_rows(path: &Path, rows: impl Fn(&Value) -> usize) -> Option<usize> {
    if !path.is_file() {
        return None;
    }
    match read_json_file::<Value>(path) {
        Ok(value) => Some(rows(&value)),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "existing file unreadable, replacing");
            None
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    debug!(path = %path.display(), "wrote derived series");
    Ok(())
}
