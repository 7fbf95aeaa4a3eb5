//! Derived per-run files written by the in-game logger or by reconciliation
//!
//! Combined `{data:[...]}` families are read by
//! [`CombinedSeries::from_data_value`](crate::reconcile::CombinedSeries::from_data_value);
//! this module covers the remaining shapes.

use crate::schema::{Provenance, Sourced};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default style episode frequency used when no run metadata records one.
pub const DEFAULT_STYLE_FREQUENCY: f64 = 0.4;

/// One sample of a stamina trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaminaPoint {
    /// Step within the episode
    pub timestep: f64,
    /// Stamina at that step
    pub stamina: f64,
}

/// Stamina over the course of one episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaminaTrajectory {
    /// Episode number
    pub episode_number: u64,
    /// Samples
    pub data_points: Vec<StaminaPoint>,
}

/// Result of reading `stamina_trajectories.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StaminaData {
    /// Trajectories that carry at least one data point
    Trajectories {
        /// Valid trajectories in file order
        trajectories: Vec<StaminaTrajectory>,
    },
    /// The file exists but holds nothing usable
    Invalid {
        /// What is wrong with the file
        reason: String,
    },
}

impl StaminaData {
    /// Validate a parsed `stamina_trajectories.json` document.
    ///
    /// Trajectories lacking `episodeNumber` or `dataPoints`, or with an
    /// empty `dataPoints` list, are dropped.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(raw) = value.get("trajectories") else {
            return Self::Invalid {
                reason: "missing 'trajectories' key".to_string(),
            };
        };
        let raw = raw.as_array().map(Vec::as_slice).unwrap_or_default();
        if raw.is_empty() {
            return Self::Invalid {
                reason: "file contains no trajectories".to_string(),
            };
        }

        let trajectories: Vec<StaminaTrajectory> = raw
            .iter()
            .filter_map(|t| serde_json::from_value::<StaminaTrajectory>(t.clone()).ok())
            .filter(|t| !t.data_points.is_empty())
            .collect();

        if trajectories.is_empty() {
            Self::Invalid {
                reason: "all trajectories have empty dataPoints arrays".to_string(),
            }
        } else {
            Self::Trajectories { trajectories }
        }
    }
}

/// Reward components of one logged step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RewardComponents {
    /// Training step
    pub step_count: u64,
    /// Forward progress reward
    pub progress_reward: Option<f64>,
    /// Base reward for rolling
    pub roll_base_reward: Option<f64>,
    /// Style bonus on rolls
    pub roll_style_bonus: Option<f64>,
    /// Reward for reaching the target
    pub target_reach_reward: Option<f64>,
    /// Reward for staying grounded
    pub grounded_reward: Option<f64>,
    /// Penalty for low stamina
    pub low_stamina_penalty: Option<f64>,
    /// Per-step time penalty
    pub time_penalty: Option<f64>,
    /// Penalty for falling
    pub fall_penalty: Option<f64>,
}

/// `reward_components.json`, rows ascending by step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    /// Rows
    #[serde(default)]
    pub rewards: Vec<RewardComponents>,
}

impl RewardBreakdown {
    /// Sort rows by step; the sort is stable so equal steps keep file order.
    #[must_use]
    pub fn sorted(mut self) -> Self {
        self.rewards.sort_by_key(|r| r.step_count);
        self
    }
}

/// Style episode frequency from `metadata.json`, falling back to
/// [`DEFAULT_STYLE_FREQUENCY`] with [`Provenance::Defaulted`].
///
/// A key set to `0` counts as unset, so the snake-case key and then the
/// default are tried next.
#[must_use]
pub fn style_frequency(metadata: Option<&Value>) -> Sourced<f64> {
    let set = |m: &Value, key: &str| m.get(key).and_then(Value::as_f64).filter(|f| *f != 0.0);
    metadata
        .and_then(|m| set(m, "styleEpisodeFrequency").or_else(|| set(m, "style_episode_frequency")))
        .map_or_else(
            || Sourced::new(DEFAULT_STYLE_FREQUENCY, Provenance::Defaulted),
            |f| Sourced::new(f, Provenance::Observed),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stamina_drops_empty_trajectories() {
        let data = StaminaData::from_value(&json!({
            "trajectories": [
                {"episodeNumber": 1, "dataPoints": []},
                {"episodeNumber": 2, "dataPoints": [{"timestep": 0, "stamina": 100.0}]},
                {"dataPoints": [{"timestep": 0, "stamina": 50.0}]}
            ]
        }));
        match data {
            StaminaData::Trajectories { trajectories } => {
                assert_eq!(trajectories.len(), 1);
                assert_eq!(trajectories[0].episode_number, 2);
            }
            StaminaData::Invalid { reason } => panic!("unexpected invalid: {reason}"),
        }
    }

    #[test]
    fn test_stamina_invalid_shapes() {
        assert!(matches!(StaminaData::from_value(&json!({})), StaminaData::Invalid { .. }));
        assert!(matches!(
            StaminaData::from_value(&json!({"trajectories": []})),
            StaminaData::Invalid { .. }
        ));
        assert!(matches!(
            StaminaData::from_value(&json!({"trajectories": [{"episodeNumber": 1, "dataPoints": []}]})),
            StaminaData::Invalid { .. }
        ));
    }

    #[test]
    fn test_reward_breakdown_sorted_with_missing_components() {
        let breakdown: RewardBreakdown = serde_json::from_value(json!({
            "rewards": [
                {"stepCount": 200, "progressReward": 1.0},
                {"stepCount": 100, "fallPenalty": -1.0}
            ]
        }))
        .unwrap();
        let breakdown = breakdown.sorted();
        assert_eq!(breakdown.rewards[0].step_count, 100);
        assert_eq!(breakdown.rewards[0].progress_reward, None);
        assert_eq!(breakdown.rewards[1].progress_reward, Some(1.0));
    }

    #[test]
    fn test_style_frequency_sources() {
        let observed = style_frequency(Some(&json!({"style_episode_frequency": 0.15})));
        assert_eq!(observed.value, 0.15);
        assert_eq!(observed.provenance, Provenance::Observed);

        let camel = style_frequency(Some(&json!({"styleEpisodeFrequency": 0.25})));
        assert_eq!(camel.value, 0.25);
        assert_eq!(camel.provenance, Provenance::Observed);

        let defaulted = style_frequency(None);
        assert_eq!(defaulted.value, DEFAULT_STYLE_FREQUENCY);
        assert!(defaulted.provenance.is_lower_confidence());
    }

    #[test]
    fn test_style_frequency_zero_counts_as_unset() {
        let zero = style_frequency(Some(&json!({"styleEpisodeFrequency": 0.0})));
        assert_eq!(zero.value, DEFAULT_STYLE_FREQUENCY);
        assert_eq!(zero.provenance, Provenance::Defaulted);

        let next_key = style_frequency(Some(&json!({
            "styleEpisodeFrequency": 0,
            "style_episode_frequency": 0.3
        })));
        assert_eq!(next_key.value, 0.3);
        assert_eq!(next_key.provenance, Provenance::Observed);
    }

    #[test]
    fn test_style_frequency_missing_metadata_key() {
        let missing = style_frequency(Some(&json!({"runId": "x"})));
        assert_eq!(missing.value, DEFAULT_STYLE_FREQUENCY);
        assert_eq!(missing.provenance, Provenance::Defaulted);
    }
}
