//! Episode reconstruction from length, distance and reward series

use super::ScalarLog;
use crate::schema::{aliases, Provenance};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// One episode row of `episode_data.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    /// 1-based position
    pub episode_number: u64,
    /// Training step the row was sampled at
    pub step_count: u64,
    /// Episode length, `0.0` when not sampled at this step
    pub length: f64,
    /// How `length` was obtained
    pub length_source: Provenance,
    /// Furthest distance reached, `0.0` when not sampled at this step
    pub max_distance: f64,
    /// How `max_distance` was obtained
    pub max_distance_source: Provenance,
    /// Total episode reward, `None` when not sampled at this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_reward: Option<f64>,
    /// Whether the episode succeeded
    pub success: bool,
    /// How `success` was obtained
    pub success_source: Provenance,
}

impl EpisodeRecord {
    fn from_value(value: &Value, position: u64) -> Option<Self> {
        let number = |key: &str| value.get(key).and_then(Value::as_f64);
        let step_count = value.get("stepCount").and_then(Value::as_u64)?;
        let (success, success_source) = match value.get("success").and_then(Value::as_bool) {
            Some(flag) => (flag, Provenance::Observed),
            None => (true, Provenance::Defaulted),
        };
        let (length, length_source) = or_zero(number("length"));
        let (max_distance, max_distance_source) = or_zero(number("maxDistance"));
        Some(Self {
            episode_number: value.get("episodeNumber").and_then(Value::as_u64).unwrap_or(position),
            step_count,
            length,
            length_source,
            max_distance,
            max_distance_source,
            total_reward: number("totalReward"),
            success,
            success_source,
        })
    }
}

/// A sampled value, or `0.0` marked [`Provenance::Defaulted`].
fn or_zero(value: Option<f64>) -> (f64, Provenance) {
    value.map_or((0.0, Provenance::Defaulted), |v| (v, Provenance::Observed))
}

/// Contents of `episode_data.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EpisodeData {
    /// Episodes in file order
    pub episodes: Vec<EpisodeRecord>,
}

impl EpisodeData {
    /// Parse an `{"episodes": [...]}` document.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not well-formed JSON.
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Build from a parsed document. Rows without a `stepCount` are
    /// skipped. A row without `success` is assumed successful, and a missing
    /// `length` or `maxDistance` reads as `0.0`; each such value is marked
    /// [`Provenance::Defaulted`].
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let episodes = value
            .get("episodes")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .zip(1..)
            .filter_map(|(row, position)| EpisodeRecord::from_value(row, position))
            .collect();
        Self { episodes }
    }

    /// Number of episodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// True if there are no episodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Share of episodes whose success flag was assumed rather than known.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn defaulted_success_ratio(&self) -> Option<f64> {
        if self.episodes.is_empty() {
            return None;
        }
        let defaulted = self
            .episodes
            .iter()
            .filter(|e| e.success_source == Provenance::Defaulted)
            .count();
        Some(defaulted as f64 / self.episodes.len() as f64)
    }
}

/// Rebuild episode rows from the scalar dump.
///
/// Rows exist at every step sampled by the length or max-distance series;
/// the reward series only contributes values. A length or distance not
/// sampled at a row's step is `0.0` ([`Provenance::Defaulted`]). Success is
/// `reward > 0` when a reward was sampled at that step
/// ([`Provenance::Derived`]), otherwise `true` ([`Provenance::Defaulted`]).
/// Returns an empty set when neither length nor distance is logged.
///
/// # Examples
///
/// ```rust
/// use runlens::reconcile::{reconstruct_episodes, MetricSeries, ScalarLog};
/// use runlens::schema::Provenance;
///
/// let scalars = ScalarLog::from_series([
///     MetricSeries::new("Episode/Length", [(10, 50.0), (20, 60.0)]),
///     MetricSeries::new("Episode/MaxDistance", [(10, 7.5)]),
/// ]);
/// let episodes = reconstruct_episodes(&scalars);
/// assert_eq!(episodes.len(), 2);
/// assert_eq!(episodes.episodes[1].max_distance, 0.0);
/// assert_eq!(episodes.episodes[1].max_distance_source, Provenance::Defaulted);
/// assert_eq!(episodes.episodes[1].success_source, Provenance::Defaulted);
/// ```
#[must_use]
pub fn reconstruct_episodes(scalars: &ScalarLog) -> EpisodeData {
    let length = scalars.get(aliases::EPISODE_LENGTH_TAG);
    let distance = scalars.get(aliases::EPISODE_MAX_DISTANCE_TAG);
    let reward = scalars.get(aliases::EPISODE_TOTAL_REWARD_TAG);

    let steps: BTreeSet<u64> = [length, distance]
        .into_iter()
        .flatten()
        .flat_map(|series| series.steps())
        .collect();

    let episodes = steps
        .into_iter()
        .filter_map(|step| {
            let length = length.and_then(|s| s.value_at(step));
            let max_distance = distance.and_then(|s| s.value_at(step));
            if length.is_none() && max_distance.is_none() {
                return None;
            }
            let total_reward = reward.and_then(|s| s.value_at(step));
            let (success, success_source) = match total_reward {
                Some(r) => (r > 0.0, Provenance::Derived),
                None => (true, Provenance::Defaulted),
            };
            let (length, length_source) = or_zero(length);
            let (max_distance, max_distance_source) = or_zero(max_distance);
            Some(EpisodeRecord {
                episode_number: 0,
                step_count: step,
                length,
                length_source,
                max_distance,
                max_distance_source,
                total_reward,
                success,
                success_source,
            })
        })
        .zip(1..)
        .map(|(record, episode_number)| EpisodeRecord { episode_number, ..record })
        .collect();

    EpisodeData { episodes }
}
