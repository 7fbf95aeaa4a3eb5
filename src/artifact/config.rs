//! Configuration snapshot (`configuration.yaml`)
//!
//! Extraction is lenient: a well-formed YAML document always yields a
//! snapshot, and fields with an unexpected shape read as absent.

use serde::Serialize;
use serde_yaml::Value;

/// Hyperparameters and settings of one behavior.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BehaviorSettings {
    /// Trainer type (e.g. `ppo`)
    pub trainer_type: Option<String>,
    /// Step budget
    pub max_steps: Option<f64>,
    /// Learning rate
    pub learning_rate: Option<f64>,
    /// Batch size
    pub batch_size: Option<f64>,
    /// Buffer size
    pub buffer_size: Option<f64>,
    /// Hidden units per layer
    pub hidden_units: Option<f64>,
    /// Number of hidden layers
    pub num_layers: Option<f64>,
    /// Time horizon
    pub time_horizon: Option<f64>,
    /// Discount factor of the extrinsic reward signal
    pub gamma: Option<f64>,
}

impl BehaviorSettings {
    fn from_value(value: &Value) -> Self {
        let hyper = value.get("hyperparameters");
        let network = value.get("network_settings");
        Self {
            trainer_type: value.get("trainer_type").and_then(Value::as_str).map(str::to_owned),
            max_steps: number(value.get("max_steps")),
            learning_rate: number(hyper.and_then(|h| h.get("learning_rate"))),
            batch_size: number(hyper.and_then(|h| h.get("batch_size"))),
            buffer_size: number(hyper.and_then(|h| h.get("buffer_size"))),
            hidden_units: number(network.and_then(|n| n.get("hidden_units"))),
            num_layers: number(network.and_then(|n| n.get("num_layers"))),
            time_horizon: number(value.get("time_horizon")),
            gamma: number(
                value
                    .get("reward_signals")
                    .and_then(|r| r.get("extrinsic"))
                    .and_then(|e| e.get("gamma")),
            ),
        }
    }
}

/// Engine settings of the simulation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineSettings {
    /// Simulation time scale
    pub time_scale: Option<f64>,
    /// Rendering quality level
    pub quality_level: Option<f64>,
    /// Headless mode
    pub no_graphics: Option<bool>,
}

/// Parsed configuration snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    behaviors: Vec<(String, BehaviorSettings)>,
    engine: EngineSettings,
    inference: Option<bool>,
    empty: bool,
    #[serde(rename = "full_config")]
    raw: Value,
}

impl ConfigSnapshot {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not well-formed YAML.
    pub fn from_yaml_str(text: &str) -> crate::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::from_value(Value::Null));
        }
        let value: Value = serde_yaml::from_str(text)?;
        Ok(Self::from_value(value))
    }

    /// Build a snapshot from an already parsed YAML value.
    #[must_use]
    pub fn from_value(raw: Value) -> Self {
        let behaviors = raw
            .get("behaviors")
            .and_then(Value::as_mapping)
            .map(|mapping| {
                mapping
                    .iter()
                    .filter_map(|(name, settings)| {
                        Some((name.as_str()?.to_owned(), BehaviorSettings::from_value(settings)))
                    })
                    .collect()
            })
            .unwrap_or_default();

        let engine = raw.get("engine_settings").map_or_else(EngineSettings::default, |e| {
            EngineSettings {
                time_scale: number(e.get("time_scale")),
                quality_level: number(e.get("quality_level")),
                no_graphics: e.get("no_graphics").and_then(Value::as_bool),
            }
        });

        let inference = raw
            .get("checkpoint_settings")
            .and_then(|c| c.get("inference"))
            .and_then(Value::as_bool);

        let empty = match &raw {
            Value::Null => true,
            Value::Mapping(m) => m.is_empty(),
            _ => false,
        };

        Self { behaviors, engine, inference, empty, raw }
    }

    /// Behaviors in file order.
    #[must_use]
    pub fn behaviors(&self) -> &[(String, BehaviorSettings)] {
        &self.behaviors
    }

    /// First behavior in file order.
    #[must_use]
    pub fn primary_behavior(&self) -> Option<(&str, &BehaviorSettings)> {
        self.behaviors.first().map(|(name, settings)| (name.as_str(), settings))
    }

    /// Engine settings.
    #[must_use]
    pub const fn engine(&self) -> &EngineSettings {
        &self.engine
    }

    /// Explicit `checkpoint_settings.inference` flag, if the config sets one.
    #[must_use]
    pub const fn inference_flag(&self) -> Option<bool> {
        self.inference
    }

    /// True when the document carried no content (empty file or empty mapping).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.empty
    }

    /// The full parsed document.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }
}

/// Numeric field that may be written as an integer, a float or a numeric string.
pub(crate) fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
behaviors:
  ParkourRunner:
    trainer_type: ppo
    max_steps: 2000000
    time_horizon: 128
    hyperparameters:
      learning_rate: 0.0003
      batch_size: 1024
      buffer_size: 10240
    network_settings:
      hidden_units: 256
      num_layers: 2
    reward_signals:
      extrinsic:
        gamma: 0.99
  Zeta:
    trainer_type: sac
engine_settings:
  time_scale: 20
  no_graphics: true
checkpoint_settings:
  inference: false
";

    #[test]
    fn test_parse_sample() {
        let config = ConfigSnapshot::from_yaml_str(SAMPLE).unwrap();
        let (name, behavior) = config.primary_behavior().unwrap();
        assert_eq!(name, "ParkourRunner");
        assert_eq!(behavior.trainer_type.as_deref(), Some("ppo"));
        assert_eq!(behavior.batch_size, Some(1024.0));
        assert_eq!(behavior.gamma, Some(0.99));
        assert_eq!(config.behaviors().len(), 2);
        assert_eq!(config.engine().time_scale, Some(20.0));
        assert_eq!(config.engine().no_graphics, Some(true));
        assert_eq!(config.inference_flag(), Some(false));
        assert!(!config.is_empty());
    }

    #[test]
    fn test_behaviors_keep_file_order() {
        let config = ConfigSnapshot::from_yaml_str("behaviors:\n  Zed: {}\n  Alpha: {}\n").unwrap();
        assert_eq!(config.primary_behavior().unwrap().0, "Zed");
    }

    #[test]
    fn test_empty_document() {
        let config = ConfigSnapshot::from_yaml_str("").unwrap();
        assert!(config.is_empty());
        assert!(config.primary_behavior().is_none());
        assert!(config.inference_flag().is_none());
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        assert!(ConfigSnapshot::from_yaml_str("behaviors: [unclosed").is_err());
    }

    #[test]
    fn test_wrong_shapes_read_as_absent() {
        let config =
            ConfigSnapshot::from_yaml_str("behaviors:\n  B:\n    max_steps: lots\n").unwrap();
        assert_eq!(config.primary_behavior().unwrap().1.max_steps, None);
    }
}
