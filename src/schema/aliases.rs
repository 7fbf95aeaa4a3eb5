//! Known metric names across tool versions
//!
//! Scalar-log tags use `/` separators (`Losses/PolicyLoss`); gauge keys in
//! `timers.json` use `.` and carry a behavior prefix plus a statistic suffix
//! (`ParkourRunner.Losses.PolicyLoss.mean`).

use super::KeywordPair;

/// Behavior name assumed when neither the config nor the status snapshot names one.
pub const DEFAULT_BEHAVIOR: &str = "ParkourRunner";

/// Action percentage tags and the field each one fills, in output order.
pub const ACTION_TAGS: [(&str, &str); 5] = [
    ("jump", "Actions/JumpPercentage"),
    ("jog", "Actions/JogPercentage"),
    ("sprint", "Actions/SprintPercentage"),
    ("roll", "Actions/RollPercentage"),
    ("idle", "Actions/IdlePercentage"),
];

/// Policy loss tag aliases, highest priority first.
pub const POLICY_LOSS_TAGS: [&str; 5] = [
    "Policy/Loss",
    "Losses/PolicyLoss",
    "Losses/Policy Loss",
    "Policy Loss",
    "PolicyLoss",
];

/// Heuristic for policy loss tags of unknown versions.
pub const POLICY_LOSS_KEYWORDS: KeywordPair = KeywordPair("policy", "loss");

/// Value loss tag aliases, highest priority first.
pub const VALUE_LOSS_TAGS: [&str; 5] = [
    "Value/Loss",
    "Losses/ValueLoss",
    "Losses/Value Loss",
    "Value Loss",
    "ValueLoss",
];

/// Heuristic for value loss tags of unknown versions.
pub const VALUE_LOSS_KEYWORDS: KeywordPair = KeywordPair("value", "loss");

/// Entropy tag.
pub const ENTROPY_TAG: &str = "Policy/Entropy";

/// Episode length tag.
pub const EPISODE_LENGTH_TAG: &str = "Episode/Length";

/// Episode max distance tag.
pub const EPISODE_MAX_DISTANCE_TAG: &str = "Episode/MaxDistance";

/// Episode total reward tag.
pub const EPISODE_TOTAL_REWARD_TAG: &str = "Episode/TotalReward";

/// Environment-based reward gauge (without behavior prefix).
pub const CUMULATIVE_REWARD_GAUGE: &str = "Environment.CumulativeReward.mean";

/// Episode-based reward gauge (without behavior prefix).
pub const EPISODE_REWARD_GAUGE: &str = "Episode.TotalReward.mean";

/// Heuristic for reward gauges under an unknown behavior prefix.
pub const REWARD_GAUGE_KEYWORDS: KeywordPair = KeywordPair("cumulativereward", "mean");

/// Gauge names (without behavior prefix) read into key metrics.
pub mod gauge {
    /// Mean episode length
    pub const EPISODE_LENGTH: &str = "Environment.EpisodeLength.mean";
    /// Total steps
    pub const STEP_SUM: &str = "Step.sum";
    /// Policy entropy
    pub const ENTROPY: &str = "Policy.Entropy.mean";
    /// Training flag
    pub const IS_TRAINING: &str = "IsTraining.mean";
    /// Policy loss
    pub const POLICY_LOSS: &str = "Losses.PolicyLoss.mean";
    /// Value loss
    pub const VALUE_LOSS: &str = "Losses.ValueLoss.mean";
    /// Learning rate
    pub const LEARNING_RATE: &str = "Policy.LearningRate.mean";
    /// PPO epsilon
    pub const EPSILON: &str = "Policy.Epsilon.mean";
    /// PPO beta
    pub const BETA: &str = "Policy.Beta.mean";
    /// Final action percentages, by action field
    pub const ACTIONS: [(&str, &str); 5] = [
        ("idle", "Actions.IdlePercentage.mean"),
        ("jump", "Actions.JumpPercentage.mean"),
        ("jog", "Actions.JogPercentage.mean"),
        ("sprint", "Actions.SprintPercentage.mean"),
        ("roll", "Actions.RollPercentage.mean"),
    ];
    /// Roll percentage
    pub const ROLL_PERCENTAGE: &str = "Actions.RollPercentage.mean";
}

/// Reward gauge candidates for a run whose primary behavior is `behavior`.
///
/// Environment-based reward outranks episode-based reward; within each, the
/// run's own prefix outranks the default behavior, which outranks the bare
/// (unprefixed) key written by older tool versions.
#[must_use]
pub fn reward_gauge_candidates(behavior: Option<&str>) -> Vec<String> {
    let mut candidates = Vec::with_capacity(6);
    for metric in [CUMULATIVE_REWARD_GAUGE, EPISODE_REWARD_GAUGE] {
        for prefix in [behavior, Some(DEFAULT_BEHAVIOR)].into_iter().flatten() {
            let key = format!("{prefix}.{metric}");
            if !candidates.contains(&key) {
                candidates.push(key);
            }
        }
        candidates.push(metric.to_string());
    }
    candidates
}
