//! Schema normalization - metric naming drift across tool versions
//!
//! The upstream trainer has renamed its metrics more than once. Lookups go
//! through two tiers:
//!
//! 1. an ordered list of exact aliases (known versions), then
//! 2. one case-insensitive keyword-pair predicate over the available tags in
//!    sorted order (unknown versions, may produce false positives).
//!
//! The result is a [`TagMatch`] so callers can record which tier resolved it.

pub mod aliases;

use crate::artifact::{ConfigSnapshot, GaugeStat, TrainingStatus};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// How a value was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Read directly from an artifact
    #[default]
    Observed,
    /// Computed from other observed values
    Derived,
    /// Resolved through a heuristic (keyword match, run-name guess)
    Heuristic,
    /// Filled in with a fixed default because the source had nothing
    Defaulted,
}

impl Provenance {
    /// Heuristic and defaulted values carry lower confidence.
    #[must_use]
    pub const fn is_lower_confidence(self) -> bool {
        matches!(self, Self::Heuristic | Self::Defaulted)
    }
}

/// A value together with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sourced<T> {
    /// The value
    pub value: T,
    /// How it was obtained
    pub provenance: Provenance,
}

impl<T> Sourced<T> {
    /// Pair a value with its provenance.
    pub const fn new(value: T, provenance: Provenance) -> Self {
        Self { value, provenance }
    }

    /// Map the value, keeping the provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced { value: f(self.value), provenance: self.provenance }
    }
}

/// Two keyword fragments that must both occur (case-insensitively) in a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordPair(pub &'static str, pub &'static str);

impl KeywordPair {
    /// True if both fragments occur in `tag`, ignoring case.
    #[must_use]
    pub fn matches(&self, tag: &str) -> bool {
        let lower = tag.to_lowercase();
        lower.contains(&self.0.to_lowercase()) && lower.contains(&self.1.to_lowercase())
    }
}

/// Outcome of alias resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "match", content = "tag", rename_all = "snake_case")]
pub enum TagMatch {
    /// One of the known aliases is present
    Exact(String),
    /// No alias present; the keyword heuristic picked this tag
    Heuristic(String),
    /// Feature unavailable for this run
    NoMatch,
}

impl TagMatch {
    /// The resolved tag, regardless of tier.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Exact(tag) | Self::Heuristic(tag) => Some(tag),
            Self::NoMatch => None,
        }
    }

    /// Provenance of the resolved tag.
    #[must_use]
    pub const fn provenance(&self) -> Option<Provenance> {
        match self {
            Self::Exact(_) => Some(Provenance::Observed),
            Self::Heuristic(_) => Some(Provenance::Heuristic),
            Self::NoMatch => None,
        }
    }

    /// True when the heuristic tier resolved the tag.
    #[must_use]
    pub const fn is_heuristic(&self) -> bool {
        matches!(self, Self::Heuristic(_))
    }
}

/// Resolve a metric name against the tags a run actually has.
///
/// Candidates are tried in order for exact membership; the first hit wins.
/// Otherwise the first tag in sorted order satisfying `fallback` is
/// returned as [`TagMatch::Heuristic`].
///
/// # Examples
///
/// ```rust
/// use runlens::schema::{resolve_tag, KeywordPair, TagMatch};
/// use std::collections::BTreeSet;
///
/// let available: BTreeSet<String> =
///     ["Losses/PolicyLoss", "Policy/Loss"].iter().map(|s| s.to_string()).collect();
///
/// // Earlier alias wins
/// let found = resolve_tag(&["Policy/Loss", "Losses/PolicyLoss"], None, &available);
/// assert_eq!(found, TagMatch::Exact("Policy/Loss".to_string()));
///
/// let unknown: BTreeSet<String> = ["Train/Policy_Loss_v2".to_string()].into();
/// let found = resolve_tag(&["Policy/Loss"], Some(KeywordPair("policy", "loss")), &unknown);
/// assert!(found.is_heuristic());
/// ```
#[must_use]
pub fn resolve_tag<S: AsRef<str>>(
    candidates: &[S],
    fallback: Option<KeywordPair>,
    available: &BTreeSet<String>,
) -> TagMatch {
    if let Some(exact) = candidates
        .iter()
        .map(AsRef::as_ref)
        .find(|candidate| available.contains(*candidate))
    {
        return TagMatch::Exact(exact.to_string());
    }

    if let Some(tag) = fallback.and_then(|pair| available.iter().find(|tag| pair.matches(tag))) {
        debug!(%tag, "resolved metric through keyword heuristic");
        return TagMatch::Heuristic(tag.clone());
    }

    TagMatch::NoMatch
}

/// Restrict a flat `"<prefix>.<metric>"` mapping to one behavior and strip
/// the prefix. Keys outside that behavior are dropped.
#[must_use]
pub fn strip_behavior_prefix<V: Clone>(prefix: &str, flat: &BTreeMap<String, V>) -> BTreeMap<String, V> {
    let dotted = format!("{prefix}.");
    flat.iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(&dotted)
                .filter(|metric| !metric.is_empty())
                .map(|metric| (metric.to_string(), value.clone()))
        })
        .collect()
}

/// Behavior whose metrics describe the run.
///
/// The config's first behavior is authoritative; otherwise the first
/// behavior of the status snapshot; otherwise [`aliases::DEFAULT_BEHAVIOR`].
#[must_use]
pub fn resolve_behavior(
    config: Option<&ConfigSnapshot>,
    status: Option<&TrainingStatus>,
) -> Sourced<String> {
    if let Some((name, _)) = config.and_then(ConfigSnapshot::primary_behavior) {
        return Sourced::new(name.to_string(), Provenance::Observed);
    }
    if let Some(first) = status.and_then(|s| s.behaviors().first()) {
        return Sourced::new(first.name.clone(), Provenance::Derived);
    }
    Sourced::new(aliases::DEFAULT_BEHAVIOR.to_string(), Provenance::Defaulted)
}

/// A reward value together with the gauge it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedReward {
    /// Gauge key and resolution tier
    pub source: TagMatch,
    /// Gauge value (`None` when the gauge exists but carries no value)
    pub value: Option<f64>,
}

/// Resolve the run's reward gauge from the scalar-log snapshot.
///
/// Returns `None` when no gauge matches.
#[must_use]
pub fn resolve_reward(behavior: Option<&str>, gauges: &BTreeMap<String, GaugeStat>) -> Option<ResolvedReward> {
    let available: BTreeSet<String> = gauges.keys().cloned().collect();
    let candidates = aliases::reward_gauge_candidates(behavior);
    let source = resolve_tag(&candidates, Some(aliases::REWARD_GAUGE_KEYWORDS), &available);
    let value = gauges.get(source.tag()?).and_then(|stat| stat.value);
    Some(ResolvedReward { source, value })
}
