//! Per-run overview assembled from the three snapshots

use crate::artifact::{BehaviorSettings, CheckpointRecord, EngineSettings, GaugeStat, ParsedRun};
use crate::health::{detect_mode, RunMode};
use crate::schema::aliases::{self, gauge};
use crate::schema::{resolve_behavior, strip_behavior_prefix, Sourced};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Start, end and duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunTimestamps {
    /// Start time
    pub start: Option<DateTime<Utc>>,
    /// End time
    pub end: Option<DateTime<Utc>>,
    /// Duration in seconds, when both ends are known
    pub duration_seconds: Option<f64>,
    /// Duration in minutes, when both ends are known
    pub duration_minutes: Option<f64>,
}

/// Headline metrics read from the de-prefixed gauge namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KeyMetrics {
    /// Mean cumulative reward
    pub cumulative_reward_mean: Option<f64>,
    /// Best mean cumulative reward
    pub cumulative_reward_max: Option<f64>,
    /// Mean episode length
    pub episode_length_mean: Option<f64>,
    /// Total steps
    pub total_steps: Option<f64>,
    /// Policy entropy
    pub entropy: Option<f64>,
    /// Whether the trainer reported training
    pub is_training: bool,
    /// Policy loss
    pub policy_loss: Option<f64>,
    /// Lowest policy loss
    pub policy_loss_min: Option<f64>,
    /// Highest policy loss
    pub policy_loss_max: Option<f64>,
    /// Value loss
    pub value_loss: Option<f64>,
    /// Lowest value loss
    pub value_loss_min: Option<f64>,
    /// Highest value loss
    pub value_loss_max: Option<f64>,
    /// Final learning rate
    pub learning_rate_current: Option<f64>,
    /// Final PPO epsilon
    pub epsilon_current: Option<f64>,
    /// Final PPO beta
    pub beta_current: Option<f64>,
}

impl KeyMetrics {
    /// Pick the headline metrics out of a de-prefixed gauge mapping.
    #[must_use]
    pub fn from_metrics(metrics: &BTreeMap<String, GaugeStat>) -> Self {
        let stat = |name: &str| metrics.get(name).copied().unwrap_or_default();
        let reward = stat(aliases::CUMULATIVE_REWARD_GAUGE);
        let policy = stat(gauge::POLICY_LOSS);
        let value = stat(gauge::VALUE_LOSS);
        Self {
            cumulative_reward_mean: reward.value,
            cumulative_reward_max: reward.max,
            episode_length_mean: stat(gauge::EPISODE_LENGTH).value,
            total_steps: stat(gauge::STEP_SUM).value,
            entropy: stat(gauge::ENTROPY).value,
            is_training: stat(gauge::IS_TRAINING).value.is_some_and(|v| v > 0.0),
            policy_loss: policy.value,
            policy_loss_min: policy.min,
            policy_loss_max: policy.max,
            value_loss: value.value,
            value_loss_min: value.min,
            value_loss_max: value.max,
            learning_rate_current: stat(gauge::LEARNING_RATE).value,
            epsilon_current: stat(gauge::EPSILON).value,
            beta_current: stat(gauge::BETA).value,
        }
    }
}

/// Everything the presentation layer shows about one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOverview {
    /// Run identifier
    pub run_id: String,
    /// Primary behavior
    pub behavior: Sourced<String>,
    /// Training or inference
    pub mode: Sourced<RunMode>,
    /// Primary behavior settings, when the config names one
    pub config: Option<BehaviorSettings>,
    /// Engine settings, when the config parsed
    pub engine: Option<EngineSettings>,
    /// Checkpoints of the primary behavior, ascending by step
    pub checkpoints: Vec<CheckpointRecord>,
    /// Latest checkpoint of the primary behavior
    pub latest_checkpoint: Option<CheckpointRecord>,
    /// Timing, when the scalar-log snapshot parsed
    pub timestamps: Option<RunTimestamps>,
    /// Gauges of the primary behavior with the prefix removed
    pub metrics: BTreeMap<String, GaugeStat>,
    /// Headline metrics, when the scalar-log snapshot parsed
    pub key_metrics: Option<KeyMetrics>,
}

impl RunOverview {
    /// Build from whatever snapshots parsed. Never fails.
    #[must_use]
    pub fn from_parsed(run: &ParsedRun) -> Self {
        let config = run.config().parsed();
        let timers = run.timers().parsed();
        let status = run.status().parsed();

        let behavior = resolve_behavior(config, status);
        let mode = detect_mode(config, run.run_id());

        let checkpoints = status
            .and_then(|s| s.primary(Some(&behavior.value)))
            .map(|b| b.checkpoints.clone())
            .unwrap_or_default();

        let timestamps = timers.map(|t| {
            let timing = t.timing();
            let duration_seconds = timing.duration_seconds();
            RunTimestamps {
                start: timing.started_at(),
                end: timing.ended_at(),
                duration_seconds,
                duration_minutes: duration_seconds.map(|s| s / 60.0),
            }
        });

        let metrics = timers
            .map(|t| strip_behavior_prefix(&behavior.value, t.gauges()))
            .unwrap_or_default();
        let key_metrics = timers.map(|_| KeyMetrics::from_metrics(&metrics));

        Self {
            run_id: run.run_id().to_string(),
            config: config
                .and_then(|c| c.primary_behavior())
                .map(|(_, settings)| settings.clone()),
            engine: config.map(|c| c.engine().clone()),
            latest_checkpoint: checkpoints.last().copied(),
            checkpoints,
            timestamps,
            metrics,
            key_metrics,
            behavior,
            mode,
        }
    }

    /// Start time, if known.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.timestamps.and_then(|t| t.start)
    }

    /// Final value of a de-prefixed gauge.
    #[must_use]
    pub fn final_value(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).and_then(|stat| stat.value)
    }

    /// Final action percentages by action field.
    #[must_use]
    pub fn final_actions(&self) -> BTreeMap<&'static str, Option<f64>> {
        gauge::ACTIONS
            .iter()
            .map(|(field, name)| (*field, self.final_value(name)))
            .collect()
    }
}
