//! Status snapshot (`run_logs/training_status.json`)

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A saved model state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CheckpointRecord {
    /// Training step at which the checkpoint was written
    pub step: u64,
    /// Mean reward at that step (`None` when the status file omits it)
    pub reward: Option<f64>,
    /// Unix timestamp (seconds) of creation (`None` when omitted)
    pub creation_time: Option<f64>,
}

impl CheckpointRecord {
    /// Creation time as a UTC timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.creation_time.and_then(unix_seconds)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_value(value: &Value) -> Option<Self> {
        let step = match value.get("steps")? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)
            })?,
            _ => return None,
        };
        Some(Self {
            step,
            reward: value.get("reward").and_then(Value::as_f64),
            creation_time: value.get("creation_time").and_then(Value::as_f64),
        })
    }
}

/// Checkpoints recorded for one behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BehaviorStatus {
    /// Behavior name
    pub name: String,
    /// Checkpoints, unique by step, ascending
    pub checkpoints: Vec<CheckpointRecord>,
}

impl BehaviorStatus {
    /// Checkpoint with the highest step.
    #[must_use]
    pub fn latest(&self) -> Option<&CheckpointRecord> {
        self.checkpoints.last()
    }
}

/// Parsed status snapshot: behavior name to checkpoint history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrainingStatus {
    behaviors: Vec<BehaviorStatus>,
}

impl TrainingStatus {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not well-formed JSON.
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Build from a parsed JSON value.
    ///
    /// Entries that are not objects, the `metadata` entry, and checkpoints
    /// without a step are ignored. Duplicate steps keep the entry listed last.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        let behaviors = map
            .iter()
            .filter(|(name, data)| data.is_object() && name.as_str() != "metadata")
            .map(|(name, data)| {
                let mut by_step = BTreeMap::new();
                for checkpoint in data
                    .get("checkpoints")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(CheckpointRecord::from_value)
                {
                    by_step.insert(checkpoint.step, checkpoint);
                }
                BehaviorStatus {
                    name: name.clone(),
                    checkpoints: by_step.into_values().collect(),
                }
            })
            .collect();

        Self { behaviors }
    }

    /// All behaviors, in file order.
    #[must_use]
    pub fn behaviors(&self) -> &[BehaviorStatus] {
        &self.behaviors
    }

    /// Status of the named behavior.
    #[must_use]
    pub fn behavior(&self, name: &str) -> Option<&BehaviorStatus> {
        self.behaviors.iter().find(|b| b.name == name)
    }

    /// Status of `preferred` if present, else the first behavior.
    #[must_use]
    pub fn primary(&self, preferred: Option<&str>) -> Option<&BehaviorStatus> {
        preferred
            .and_then(|name| self.behavior(name))
            .or_else(|| self.behaviors.first())
    }

    /// Total checkpoints across all behaviors.
    #[must_use]
    pub fn checkpoint_count(&self) -> usize {
        self.behaviors.iter().map(|b| b.checkpoints.len()).sum()
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn unix_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.trunc();
    let nanos = ((seconds - whole) * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}
