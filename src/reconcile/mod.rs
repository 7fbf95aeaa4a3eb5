//! Series reconciliation - step-aligned merging of independent series
//!
//! Each scalar tag is sampled on its own schedule. Combining a family of
//! series yields one row per step in the union of their steps; a field with
//! no sample at exactly that step is `None`. Values are never interpolated.
//!
//! ```text
//! jump:  0 ── 100 ── 200
//! roll:  0 ───────── 200
//!        │    │      │
//! rows: {0: j,r} {100: j,None} {200: j,r}
//! ```

mod episodes;
mod scalars;

pub use episodes::{reconstruct_episodes, EpisodeData, EpisodeRecord};
pub use scalars::{losses, LossSeries, ScalarLog, SeriesFamily};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// One sample of a scalar series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Training step
    pub step: u64,
    /// Sample value
    pub value: f64,
    /// Wall-clock time of the sample, if recorded
    pub wall_time: Option<f64>,
}

/// A named scalar series with strictly increasing steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    name: String,
    points: Vec<SeriesPoint>,
}

impl MetricSeries {
    /// Build a series from `(step, value)` pairs in any order.
    ///
    /// Steps are sorted; when a step repeats, the sample listed last wins.
    #[must_use]
    pub fn new(name: impl Into<String>, samples: impl IntoIterator<Item = (u64, f64)>) -> Self {
        Self::from_points(
            name,
            samples
                .into_iter()
                .map(|(step, value)| SeriesPoint { step, value, wall_time: None }),
        )
    }

    /// Build a series from full points in any order, normalizing as [`MetricSeries::new`].
    #[must_use]
    pub fn from_points(name: impl Into<String>, points: impl IntoIterator<Item = SeriesPoint>) -> Self {
        let by_step: BTreeMap<u64, SeriesPoint> = points.into_iter().map(|p| (p.step, p)).collect();
        Self {
            name: name.into(),
            points: by_step.into_values().collect(),
        }
    }

    /// Series name (the tag it was read from).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Points ordered by step.
    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the series has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Steps in ascending order.
    pub fn steps(&self) -> impl Iterator<Item = u64> + '_ {
        self.points.iter().map(|p| p.step)
    }

    /// Value sampled at exactly `step`.
    #[must_use]
    pub fn value_at(&self, step: u64) -> Option<f64> {
        self.points
            .binary_search_by_key(&step, |p| p.step)
            .ok()
            .map(|i| self.points[i].value)
    }
}

/// One step-aligned row of a combined family.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedRecord {
    /// Training step
    pub step: u64,
    /// One slot per family field, `None` where that series has no sample
    pub values: Vec<Option<f64>>,
}

/// A family of series merged into step-aligned rows.
///
/// Serializes as `{"data": [{"step": .., "<field>": value|null, ..}, ..]}`,
/// the format of the `*_over_time.json` files.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombinedSeries {
    fields: Vec<String>,
    records: Vec<CombinedRecord>,
}

impl CombinedSeries {
    /// Assemble from parts. Every record must carry one slot per field.
    ///
    /// # Panics
    ///
    /// Panics if a record's slot count differs from the field count.
    #[must_use]
    pub fn from_parts(fields: Vec<String>, records: Vec<CombinedRecord>) -> Self {
        assert!(
            records.iter().all(|r| r.values.len() == fields.len()),
            "every combined record needs one slot per field"
        );
        Self { fields, records }
    }

    /// Read a `{"data": [...]}` document for the given fields.
    ///
    /// Rows without a numeric `step` are skipped; non-numeric or missing
    /// field values read as `None`. Rows are ordered by step, the last row
    /// winning on duplicates.
    #[must_use]
    pub fn from_data_value(value: &Value, fields: &[&str]) -> Self {
        let mut rows = BTreeMap::new();
        for row in value.get("data").and_then(Value::as_array).into_iter().flatten() {
            let Some(step) = row.get("step").and_then(Value::as_u64) else {
                continue;
            };
            let values = fields
                .iter()
                .map(|field| row.get(*field).and_then(Value::as_f64))
                .collect();
            rows.insert(step, CombinedRecord { step, values });
        }
        Self {
            fields: fields.iter().map(|f| (*f).to_string()).collect(),
            records: rows.into_values().collect(),
        }
    }

    /// Field names in slot order.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Rows ascending by step.
    #[must_use]
    pub fn records(&self) -> &[CombinedRecord] {
        &self.records
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Slot index of a field.
    #[must_use]
    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// Value of `field` in row `row`.
    #[must_use]
    pub fn value(&self, row: usize, field: &str) -> Option<f64> {
        let index = self.field_index(field)?;
        self.records.get(row)?.values[index]
    }

    /// Present samples of one field as `(step, value)` pairs.
    #[must_use]
    pub fn column(&self, field: &str) -> Vec<(u64, f64)> {
        let Some(index) = self.field_index(field) else {
            return Vec::new();
        };
        self.records
            .iter()
            .filter_map(|r| r.values[index].map(|v| (r.step, v)))
            .collect()
    }

    /// Keep only the rows at the given positions (ascending, in bounds).
    #[must_use]
    pub fn select_rows(&self, positions: &[usize]) -> Self {
        Self {
            fields: self.fields.clone(),
            records: positions.iter().map(|&i| self.records[i].clone()).collect(),
        }
    }
}

struct RecordRow<'a> {
    fields: &'a [String],
    record: &'a CombinedRecord,
}

impl Serialize for RecordRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        map.serialize_entry("step", &self.record.step)?;
        for (field, value) in self.fields.iter().zip(&self.record.values) {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

struct RecordRows<'a>(&'a CombinedSeries);

impl Serialize for RecordRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.records.len()))?;
        for record in &self.0.records {
            seq.serialize_element(&RecordRow { fields: &self.0.fields, record })?;
        }
        seq.end()
    }
}

impl Serialize for CombinedSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("data", &RecordRows(self))?;
        map.end()
    }
}

/// Merge a family of series into step-aligned rows.
///
/// `family` lists `(field, series)` in output slot order; a field whose
/// series is `None` is kept with every slot `None`. The row set is the union
/// of all member steps, ascending.
///
/// # Examples
///
/// ```rust
/// use runlens::reconcile::{combine, MetricSeries};
///
/// let jump = MetricSeries::new("Actions/JumpPercentage", [(0, 0.5), (100, 0.4), (200, 0.3)]);
/// let roll = MetricSeries::new("Actions/RollPercentage", [(0, 0.1), (200, 0.2)]);
///
/// let combined = combine(&[("jump", Some(&jump)), ("roll", Some(&roll))]);
/// assert_eq!(combined.len(), 3);
/// assert_eq!(combined.value(1, "roll"), None);
/// ```
#[must_use]
pub fn combine(family: &[(&str, Option<&MetricSeries>)]) -> CombinedSeries {
    let steps: BTreeSet<u64> = family
        .iter()
        .filter_map(|(_, series)| *series)
        .flat_map(|series| series.steps())
        .collect();

    let records = steps
        .into_iter()
        .map(|step| CombinedRecord {
            step,
            values: family
                .iter()
                .map(|(_, series)| series.and_then(|s| s.value_at(step)))
                .collect(),
        })
        .collect();

    CombinedSeries {
        fields: family.iter().map(|(field, _)| (*field).to_string()).collect(),
        records,
    }
}

/// Which of two candidate datasets to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetChoice {
    /// The dataset already on disk is at least as rich
    KeepExisting,
    /// The freshly computed dataset has more rows (or nothing usable exists)
    UseFresh,
}

/// Choose the richer of an existing dataset and a freshly computed one.
///
/// More rows wins. On a tie the existing dataset is kept, so a dataset
/// written by a richer source is never replaced by an equal or sparser one.
/// `existing_rows` is `None` when there is no readable existing dataset.
#[must_use]
pub const fn choose_richer(existing_rows: Option<usize>, fresh_rows: usize) -> DatasetChoice {
    match existing_rows {
        Some(existing) if existing >= fresh_rows => DatasetChoice::KeepExisting,
        _ => DatasetChoice::UseFresh,
    }
}
