//! Cross-run comparison
//!
//! Summaries are ordered most recent start first, ties by run identifier.
//! Chart series omit runs without a value; a missing metric is never drawn
//! as zero.

mod overview;

pub use overview::{KeyMetrics, RunOverview, RunTimestamps};

use crate::health::RunMode;
use crate::schema::Provenance;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Per-run projection used for comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    /// Run identifier
    pub run_id: String,
    /// Training or inference
    pub mode: RunMode,
    /// How the mode was determined
    pub mode_source: Provenance,
    /// Start time
    pub started_at: Option<DateTime<Utc>>,
    /// Mean cumulative reward
    pub reward: Option<f64>,
    /// Best mean cumulative reward
    pub reward_max: Option<f64>,
    /// Mean episode length
    pub episode_length: Option<f64>,
    /// Total steps
    pub steps: Option<f64>,
    /// Duration in minutes
    pub duration_minutes: Option<f64>,
    /// Policy loss
    pub policy_loss: Option<f64>,
    /// Value loss
    pub value_loss: Option<f64>,
}

impl ComparisonSummary {
    /// Project an overview.
    #[must_use]
    pub fn from_overview(overview: &RunOverview) -> Self {
        let key = overview.key_metrics.unwrap_or_default();
        Self {
            run_id: overview.run_id.clone(),
            mode: overview.mode.value,
            mode_source: overview.mode.provenance,
            started_at: overview.started_at(),
            reward: key.cumulative_reward_mean,
            reward_max: key.cumulative_reward_max,
            episode_length: key.episode_length_mean,
            steps: key.total_steps,
            duration_minutes: overview.timestamps.and_then(|t| t.duration_minutes),
            policy_loss: key.policy_loss,
            value_loss: key.value_loss,
        }
    }
}

fn by_recency(a: &ComparisonSummary, b: &ComparisonSummary) -> Ordering {
    // Unknown start times sort last
    match (a.started_at, b.started_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.run_id.cmp(&b.run_id))
}

/// Summarize runs, most recent start first.
#[must_use]
pub fn summarize(runs: &[RunOverview]) -> Vec<ComparisonSummary> {
    let mut summaries: Vec<ComparisonSummary> = runs.iter().map(ComparisonSummary::from_overview).collect();
    summaries.sort_by(by_recency);
    summaries
}

/// One chart point: run identifier against a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Run identifier
    pub x: String,
    /// Metric value
    pub y: f64,
}

/// Chart points for one metric, in summary order. Runs where `selector`
/// yields `None` are omitted.
#[must_use]
pub fn chart_series<F>(summaries: &[ComparisonSummary], selector: F) -> Vec<ChartPoint>
where
    F: Fn(&ComparisonSummary) -> Option<f64>,
{
    summaries
        .iter()
        .filter_map(|s| selector(s).map(|y| ChartPoint { x: s.run_id.clone(), y }))
        .collect()
}

/// Metrics charted across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMetric {
    /// Mean cumulative reward
    CumulativeRewards,
    /// Mean episode length
    EpisodeLengths,
    /// Total steps
    Steps,
    /// Duration in minutes
    TrainingTimes,
    /// Policy loss
    PolicyLoss,
    /// Value loss
    ValueLoss,
}

impl ComparisonMetric {
    /// All charted metrics.
    pub const ALL: [Self; 6] = [
        Self::CumulativeRewards,
        Self::EpisodeLengths,
        Self::Steps,
        Self::TrainingTimes,
        Self::PolicyLoss,
        Self::ValueLoss,
    ];

    /// Extract this metric from a summary.
    #[must_use]
    pub fn select(self, summary: &ComparisonSummary) -> Option<f64> {
        match self {
            Self::CumulativeRewards => summary.reward,
            Self::EpisodeLengths => summary.episode_length,
            Self::Steps => summary.steps,
            Self::TrainingTimes => summary.duration_minutes,
            Self::PolicyLoss => summary.policy_loss,
            Self::ValueLoss => summary.value_loss,
        }
    }
}

/// Summaries plus one chart series per metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Summaries, most recent first
    pub runs: Vec<ComparisonSummary>,
    /// Chart series keyed by metric
    pub metrics: BTreeMap<ComparisonMetric, Vec<ChartPoint>>,
}

/// Build the full comparison for a set of runs.
#[must_use]
pub fn compare(runs: &[RunOverview]) -> ComparisonReport {
    let summaries = summarize(runs);
    let metrics = ComparisonMetric::ALL
        .into_iter()
        .map(|metric| (metric, chart_series(&summaries, |s| metric.select(s))))
        .collect();
    ComparisonReport { runs: summaries, metrics }
}

/// Reward over checkpoints for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingCurve {
    /// Run identifier
    pub run_id: String,
    /// Checkpoint steps, ascending
    pub steps: Vec<u64>,
    /// Reward at each step
    pub rewards: Vec<f64>,
}

/// Training curve of a run. Checkpoints without a reward are left out;
/// `None` when no checkpoint carries one.
#[must_use]
pub fn training_curve(run: &RunOverview) -> Option<TrainingCurve> {
    let (steps, rewards): (Vec<u64>, Vec<f64>) = run
        .checkpoints
        .iter()
        .filter_map(|c| c.reward.map(|r| (c.step, r)))
        .unzip();
    if steps.is_empty() {
        return None;
    }
    Some(TrainingCurve { run_id: run.run_id.clone(), steps, rewards })
}

/// Training curves of the first `limit` training runs, in the given order.
/// Runs in that window without a curve are skipped, not replaced.
#[must_use]
pub fn training_curves(runs: &[RunOverview], limit: usize) -> Vec<TrainingCurve> {
    runs.iter()
        .filter(|r| r.mode.value == RunMode::Training)
        .take(limit)
        .filter_map(training_curve)
        .collect()
}
