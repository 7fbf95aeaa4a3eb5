//! Scalar dumps and the metric families derived from them

use super::{combine, CombinedSeries, MetricSeries, SeriesPoint};
use crate::schema::{aliases, resolve_tag, TagMatch};
use crate::store::ArtifactKind;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// All scalar series of one run, keyed by tag.
///
/// Read from a dump shaped `{"<tag>": [{"step", "value", "wall_time"}, ..]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalarLog {
    series: BTreeMap<String, MetricSeries>,
}

impl ScalarLog {
    /// Parse a scalar dump.
    ///
    /// # Errors
    ///
    /// Returns error if the text is not well-formed JSON.
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(&value))
    }

    /// Build from a parsed dump. Tags whose value is not a list, and points
    /// without a numeric step and value, are skipped.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let series = value
            .as_object()
            .into_iter()
            .flatten()
            .filter_map(|(tag, points)| {
                let points = points.as_array()?.iter().filter_map(|p| {
                    Some(SeriesPoint {
                        step: p.get("step")?.as_u64()?,
                        value: p.get("value")?.as_f64()?,
                        wall_time: p.get("wall_time").and_then(Value::as_f64),
                    })
                });
                Some((tag.clone(), MetricSeries::from_points(tag.clone(), points)))
            })
            .collect();
        Self { series }
    }

    /// Build from already normalized series.
    #[must_use]
    pub fn from_series(series: impl IntoIterator<Item = MetricSeries>) -> Self {
        Self {
            series: series.into_iter().map(|s| (s.name().to_string(), s)).collect(),
        }
    }

    /// Available tags, sorted.
    #[must_use]
    pub fn tags(&self) -> BTreeSet<String> {
        self.series.keys().cloned().collect()
    }

    /// Series of one tag.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&MetricSeries> {
        self.series.get(tag)
    }

    /// True if no tags were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Resolve a tag through the alias tiers and return its series.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(
        &self,
        candidates: &[S],
        fallback: Option<crate::schema::KeywordPair>,
    ) -> (TagMatch, Option<&MetricSeries>) {
        let found = resolve_tag(candidates, fallback, &self.tags());
        let series = found.tag().and_then(|tag| self.get(tag));
        (found, series)
    }
}

/// Policy/value loss family with the tags each side resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossSeries {
    /// Rows with `policy_loss` and `value_loss` fields
    pub series: CombinedSeries,
    /// Tag used for policy loss
    pub policy_tag: TagMatch,
    /// Tag used for value loss
    pub value_tag: TagMatch,
}

/// Families of related series rendered together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesFamily {
    /// Action percentages (jump, jog, sprint, roll, idle)
    ActionDistribution,
    /// Policy and value loss
    Losses,
    /// Policy entropy
    Entropy,
}

impl SeriesFamily {
    /// All families.
    pub const ALL: [Self; 3] = [Self::ActionDistribution, Self::Losses, Self::Entropy];

    /// Output fields in slot order.
    #[must_use]
    pub const fn fields(self) -> &'static [&'static str] {
        match self {
            Self::ActionDistribution => &["jump", "jog", "sprint", "roll", "idle"],
            Self::Losses => &["policy_loss", "value_loss"],
            Self::Entropy => &["entropy"],
        }
    }

    /// File the family is persisted to.
    #[must_use]
    pub const fn artifact(self) -> ArtifactKind {
        match self {
            Self::ActionDistribution => ArtifactKind::ActionDistribution,
            Self::Losses => ArtifactKind::Losses,
            Self::Entropy => ArtifactKind::Entropy,
        }
    }

    /// Gauge (without behavior prefix) holding the final value of each field.
    #[must_use]
    pub fn final_value_gauges(self) -> Vec<(&'static str, &'static str)> {
        match self {
            Self::ActionDistribution => aliases::gauge::ACTIONS.to_vec(),
            Self::Losses => vec![
                ("policy_loss", aliases::gauge::POLICY_LOSS),
                ("value_loss", aliases::gauge::VALUE_LOSS),
            ],
            Self::Entropy => vec![("entropy", aliases::gauge::ENTROPY)],
        }
    }

    /// Parse a family name as used on the command line.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "action_distribution" | "actions" => Some(Self::ActionDistribution),
            "losses" | "loss" | "policy_value_loss" => Some(Self::Losses),
            "entropy" => Some(Self::Entropy),
            _ => None,
        }
    }

    /// Derive the family from a scalar dump. `None` when no member tag exists.
    #[must_use]
    pub fn derive(self, scalars: &ScalarLog) -> Option<CombinedSeries> {
        match self {
            Self::ActionDistribution => action_distribution(scalars),
            Self::Losses => losses(scalars).map(|l| l.series),
            Self::Entropy => entropy(scalars),
        }
    }
}

fn action_distribution(scalars: &ScalarLog) -> Option<CombinedSeries> {
    let family: Vec<(&str, Option<&MetricSeries>)> = aliases::ACTION_TAGS
        .iter()
        .map(|(field, tag)| (*field, scalars.get(tag)))
        .collect();
    let combined = combine(&family);
    (!combined.is_empty()).then_some(combined)
}

/// Derive the loss family, resolving both loss tags through their aliases.
///
/// `None` when neither side resolves.
#[must_use]
pub fn losses(scalars: &ScalarLog) -> Option<LossSeries> {
    let (policy_tag, policy) =
        scalars.resolve(&aliases::POLICY_LOSS_TAGS, Some(aliases::POLICY_LOSS_KEYWORDS));
    let (value_tag, value) =
        scalars.resolve(&aliases::VALUE_LOSS_TAGS, Some(aliases::VALUE_LOSS_KEYWORDS));

    if policy.is_none() && value.is_none() {
        debug!(
            loss_tags = ?scalars.tags().into_iter().filter(|t| t.to_lowercase().contains("loss")).collect::<Vec<_>>(),
            "no loss tags resolved"
        );
        return None;
    }

    let series = combine(&[("policy_loss", policy), ("value_loss", value)]);
    Some(LossSeries { series, policy_tag, value_tag })
}

fn entropy(scalars: &ScalarLog) -> Option<CombinedSeries> {
    let series = scalars.get(aliases::ENTROPY_TAG)?;
    Some(combine(&[("entropy", Some(series))]))
}
