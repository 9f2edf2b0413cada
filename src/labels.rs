//! Label rows and the per-record metadata index.
//!
//! Several rows may point at one signal record.  The sub-sampling regime
//! draws one of them per item; the per-record regime collapses them into
//! one vote-weighted label:
//!
//! ```text
//! probs  = Σ wᵢ·pᵢ / Σ wᵢ
//! weight = mean(wᵢ)  or  Σ wᵢ      (see WeightReduction)
//! ```
use std::collections::BTreeMap;

use serde::Deserialize;

use crate::constants::NUM_CLASSES;

/// One labelled interval.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelRow {
    /// Signal record this interval belongs to.
    pub record_id: i64,
    /// Paired spectrogram record, if any.
    #[serde(default)]
    pub spectrogram_id: Option<i64>,
    /// Interval start in the signal's time base.
    pub signal_offset_sec: f64,
    /// Interval start in the spectrogram's time base.
    #[serde(default)]
    pub spectrogram_offset_sec: Option<f64>,
    /// Class probabilities, in [`LABELS`](crate::constants::LABELS) order.
    pub probs: [f32; NUM_CLASSES],
    /// Non-negative weight, typically the number of annotator votes.
    pub weight: f32,
}

impl LabelRow {
    /// Build a row from raw annotator vote counts:
    /// `probs = votes / Σvotes`, `weight = Σvotes`.
    pub fn from_votes(
        record_id: i64,
        signal_offset_sec: f64,
        votes: [f32; NUM_CLASSES],
    ) -> Self {
        let total: f32 = votes.iter().sum();
        let probs = if total > 0.0 {
            votes.map(|v| v / total)
        } else {
            [0.0; NUM_CLASSES]
        };
        Self {
            record_id,
            spectrogram_id: None,
            signal_offset_sec,
            spectrogram_offset_sec: None,
            probs,
            weight: total,
        }
    }

    /// Attach the paired spectrogram.
    pub fn with_spectrogram(mut self, spectrogram_id: i64, offset_sec: f64) -> Self {
        self.spectrogram_id = Some(spectrogram_id);
        self.spectrogram_offset_sec = Some(offset_sec);
        self
    }
}

/// How per-row weights combine into one record weight.
///
/// `Mean` keeps the per-interval annotator-agreement scale; `Sum` reflects
/// total annotation volume.  They are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightReduction {
    #[default]
    Mean,
    Sum,
}

/// All rows of one record collapsed into a single label.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLabel {
    pub probs: [f32; NUM_CLASSES],
    pub weight: f32,
    /// Spectrogram of the record's first row.
    pub spectrogram_id: Option<i64>,
    /// `spectrogram_offset_sec − signal_offset_sec` of the first row: where
    /// signal time 0 falls on the spectrogram's time base.
    pub spectrogram_shift_sec: Option<f64>,
}

/// Weighted combination of `rows` (must be non-empty).
pub fn aggregate_rows(rows: &[LabelRow], reduction: WeightReduction) -> RecordLabel {
    let total: f32 = rows.iter().map(|r| r.weight).sum();
    let mut probs = [0.0_f32; NUM_CLASSES];
    if total > 0.0 {
        for r in rows {
            for (acc, p) in probs.iter_mut().zip(r.probs) {
                *acc += r.weight * p;
            }
        }
        probs.iter_mut().for_each(|p| *p /= total);
    } else {
        // No votes at all: fall back to an unweighted mean.
        for r in rows {
            for (acc, p) in probs.iter_mut().zip(r.probs) {
                *acc += p;
            }
        }
        probs.iter_mut().for_each(|p| *p /= rows.len() as f32);
    }

    let weight = match reduction {
        WeightReduction::Mean => total / rows.len() as f32,
        WeightReduction::Sum => total,
    };

    let first = &rows[0];
    RecordLabel {
        probs,
        weight,
        spectrogram_id: first.spectrogram_id,
        spectrogram_shift_sec: first
            .spectrogram_offset_sec
            .map(|s| s - first.signal_offset_sec),
    }
}

/// Rows grouped by record id, plus the collapsed per-record label.
#[derive(Debug, Clone, Default)]
pub struct MetadataIndex {
    rows: BTreeMap<i64, Vec<LabelRow>>,
    labels: BTreeMap<i64, RecordLabel>,
}

impl MetadataIndex {
    /// Group `rows` by record id; rows keep their input order within a record.
    pub fn build(rows: impl IntoIterator<Item = LabelRow>, reduction: WeightReduction) -> Self {
        let mut grouped: BTreeMap<i64, Vec<LabelRow>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.record_id).or_default().push(row);
        }
        let labels = grouped
            .iter()
            .map(|(&id, rows)| (id, aggregate_rows(rows, reduction)))
            .collect();
        tracing::info!(records = grouped.len(), ?reduction, "metadata indexed");
        Self { rows: grouped, labels }
    }

    /// Index with no label rows; used for unlabelled inference over `ids`.
    pub fn unlabelled(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            rows: ids.into_iter().map(|id| (id, Vec::new())).collect(),
            labels: BTreeMap::new(),
        }
    }

    /// Record ids, ascending.
    pub fn record_ids(&self) -> Vec<i64> {
        self.rows.keys().copied().collect()
    }

    pub fn num_records(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self, record_id: i64) -> &[LabelRow] {
        self.rows.get(&record_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn label(&self, record_id: i64) -> Option<&RecordLabel> {
        self.labels.get(&record_id)
    }
}
