//! Training vs. inference mode detection

use crate::artifact::ConfigSnapshot;
use crate::schema::{Provenance, Sourced};
use serde::Serialize;
use tracing::debug;

/// What a run was doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Policy was being trained (checkpoints expected)
    Training,
    /// Existing policy was evaluated (no checkpoints expected)
    Inference,
}

impl RunMode {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Inference => "inference",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the run mode.
///
/// A non-empty config decides: `checkpoint_settings.inference` if set,
/// otherwise training. Without a usable config the run name is checked for
/// `inference` (case-insensitive), which is reported as
/// [`Provenance::Heuristic`].
#[must_use]
pub fn detect_mode(config: Option<&ConfigSnapshot>, run_id: &str) -> Sourced<RunMode> {
    if let Some(config) = config.filter(|c| !c.is_empty()) {
        let mode = if config.inference_flag().unwrap_or(false) {
            RunMode::Inference
        } else {
            RunMode::Training
        };
        return Sourced::new(mode, Provenance::Observed);
    }

    let mode = if run_id.to_lowercase().contains("inference") {
        RunMode::Inference
    } else {
        RunMode::Training
    };
    debug!(run_id, %mode, "run mode guessed from run name");
    Sourced::new(mode, Provenance::Heuristic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_flag_wins_over_name() {
        let config =
            ConfigSnapshot::from_yaml_str("checkpoint_settings:\n  inference: true\n").unwrap();
        let mode = detect_mode(Some(&config), "training_run");
        assert_eq!(mode.value, RunMode::Inference);
        assert_eq!(mode.provenance, Provenance::Observed);

        let config = ConfigSnapshot::from_yaml_str("behaviors: {}\n").unwrap();
        assert_eq!(detect_mode(Some(&config), "inference_42").value, RunMode::Training);
    }

    #[test]
    fn test_name_fallback_is_heuristic() {
        let mode = detect_mode(None, "Inference_Test_7");
        assert_eq!(mode.value, RunMode::Inference);
        assert!(mode.provenance.is_lower_confidence());

        let empty = ConfigSnapshot::from_yaml_str("").unwrap();
        let mode = detect_mode(Some(&empty), "run_1");
        assert_eq!(mode.value, RunMode::Training);
        assert_eq!(mode.provenance, Provenance::Heuristic);
    }
}
