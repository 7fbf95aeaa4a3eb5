//! Scalar-log snapshot (`run_logs/timers.json`)

use super::status::unix_seconds;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Summary statistic of one gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GaugeStat {
    /// Last recorded value
    pub value: Option<f64>,
    /// Minimum over the run
    pub min: Option<f64>,
    /// Maximum over the run
    pub max: Option<f64>,
    /// Number of samples
    pub count: Option<f64>,
}

impl GaugeStat {
    fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name).and_then(Value::as_f64);
        Self {
            value: field("value"),
            min: field("min"),
            max: field("max"),
            count: field("count"),
        }
    }
}

/// Run start/end as recorded in the snapshot metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RunTiming {
    /// `start_time_seconds`
    pub start_seconds: Option<f64>,
    /// `end_time_seconds`
    pub end_seconds: Option<f64>,
}

impl RunTiming {
    /// Wall-clock duration, when both ends are recorded and non-zero.
    #[must_use]
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.start_seconds, self.end_seconds) {
            (Some(start), Some(end)) if start != 0.0 && end != 0.0 => Some(end - start),
            _ => None,
        }
    }

    /// Start as a UTC timestamp.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.start_seconds.filter(|s| *s != 0.0).and_then(unix_seconds)
    }

    /// End as a UTC timestamp.
    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.end_seconds.filter(|s| *s != 0.0).and_then(unix_seconds)
    }
}

/// Parsed scalar-log snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimersSnapshot {
    timing: RunTiming,
    gauges: BTreeMap<String, GaugeStat>,
    metadata: Value,
}

impl TimersSnapshot {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not well-formed JSON.
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Build from a parsed JSON value. Unexpected shapes read as absent.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let metadata = value.get("metadata").cloned().unwrap_or(Value::Null);
        let timing = RunTiming {
            start_seconds: timestamp(metadata.get("start_time_seconds")),
            end_seconds: timestamp(metadata.get("end_time_seconds")),
        };
        let gauges = value
            .get("gauges")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(key, stat)| (key.clone(), GaugeStat::from_value(stat)))
                    .collect()
            })
            .unwrap_or_default();

        Self { timing, gauges, metadata }
    }

    /// Run timing.
    #[must_use]
    pub const fn timing(&self) -> &RunTiming {
        &self.timing
    }

    /// All gauges keyed by their full (behavior-prefixed) name.
    #[must_use]
    pub const fn gauges(&self) -> &BTreeMap<String, GaugeStat> {
        &self.gauges
    }

    /// Raw metadata section.
    #[must_use]
    pub const fn metadata(&self) -> &Value {
        &self.metadata
    }
}

/// Timestamps are written either as numbers or as numeric strings.
fn timestamp(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
