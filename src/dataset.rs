//! Sample assembly: one configurable dataset over a record cache.
//!
//! [`SamplingStrategy`] decides what an index means:
//!
//! | strategy   | `len()`            | item                                   |
//! |------------|--------------------|----------------------------------------|
//! | `Identity` | records            | whole record, padded to `record_pad`   |
//! | `RandomK`  | records × k        | random window (label row or uniform)   |
//! | `Sliding`  | precomputed windows| fixed `(record, start, end)` lookup    |
//!
//! Records are visited in ascending id order.  Random choices come from a
//! generator owned by the dataset, seeded from [`DatasetConfig::seed`] and
//! resettable with [`SampleDataset::reset`]; workers get independent
//! generators through [`SampleDataset::fork`].
use std::sync::Arc;

use ndarray::{s, Array1, Array2, Array3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use crate::align::DualRateAligner;
use crate::config::{DatasetConfig, SpectrogramConfig};
use crate::constants::NUM_PROBES;
use crate::error::{Result, WindowError};
use crate::labels::MetadataIndex;
use crate::pad::{pad, Anchor, FillMode, PadTarget};
use crate::records::{RecordCache, SignalRecord};
use crate::window::{enumerate_windows, sample_window};

/// Where a random window's start comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSource {
    /// Draw one of the record's label rows and start at its offset.
    #[default]
    LabelOffset,
    /// Draw a start uniformly over the record.
    Uniform,
}

/// Index → window mapping of a [`SampleDataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// One item per record covering the whole record.
    #[default]
    Identity,
    /// `samples_per_record` random windows per record.
    RandomK {
        samples_per_record: usize,
        #[serde(default)]
        source: WindowSource,
    },
    /// Every window at a fixed stride, trailing partial window dropped.
    Sliding { stride: usize },
}

/// One precomputed sliding window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRef {
    pub record_id: i64,
    pub start: usize,
    pub end: usize,
}

/// A fully materialised item.
#[derive(Debug, Clone)]
pub struct Sample {
    pub record_id: i64,
    /// `(T, C)` signal window.
    pub signal: Array2<f32>,
    /// `(T, C)` validity mask, zero over padding.
    pub mask: Array2<f32>,
    /// `(G, F, crop_to)` spectrogram crop.
    pub spectrogram: Option<Array3<f32>>,
    /// Class probabilities.
    pub label: Option<Array1<f32>>,
    /// Length-1 sample weight.
    pub weight: Option<Array1<f32>>,
}

#[derive(Debug, Clone)]
pub struct SampleDataset {
    config: Arc<DatasetConfig>,
    records: Arc<RecordCache>,
    index: Arc<MetadataIndex>,
    record_ids: Arc<Vec<i64>>,
    windows: Arc<Vec<WindowRef>>,
    /// Length every whole-record item is padded to.
    record_frames: usize,
    seed: u64,
    rng: StdRng,
}

impl SampleDataset {
    /// Build a ready dataset over the records named in `index`.
    ///
    /// # Errors
    ///
    /// * [`WindowError::RecordNotFound`] if `index` names a record missing
    ///   from `records`.
    /// * [`WindowError::InvalidDimension`] for a zero window, stride, rate or
    ///   samples-per-record.
    pub fn new(config: DatasetConfig, records: Arc<RecordCache>, index: Arc<MetadataIndex>) -> Result<Self> {
        validate(&config)?;

        let record_ids = index.record_ids();
        let mut longest = 0;
        for &id in &record_ids {
            longest = longest.max(records.signal(id)?.num_frames());
        }
        // Identity items all share one length.
        let record_frames = match config.strategy {
            SamplingStrategy::Identity => config.record_pad.resolve(longest)?,
            _ => config.window_frames,
        };

        let windows = match config.strategy {
            SamplingStrategy::Sliding { stride } => {
                sliding_windows(&records, &record_ids, config.window_frames, stride)?
            }
            _ => vec![],
        };

        let seed = config.seed;
        let ds = Self {
            config: Arc::new(config),
            records,
            index,
            record_ids: Arc::new(record_ids),
            windows: Arc::new(windows),
            record_frames,
            seed,
            rng: StdRng::seed_from_u64(seed),
        };
        info!(
            records = ds.record_ids.len(),
            items = ds.len(),
            strategy = ?ds.config.strategy,
            "dataset ready"
        );
        Ok(ds)
    }

    pub fn len(&self) -> usize {
        match self.config.strategy {
            SamplingStrategy::Identity => self.record_ids.len(),
            SamplingStrategy::RandomK { samples_per_record, .. } => {
                self.record_ids.len() * samples_per_record
            }
            SamplingStrategy::Sliding { .. } => self.windows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn record_ids(&self) -> &[i64] {
        &self.record_ids
    }

    /// Precomputed windows (empty unless the strategy is `Sliding`).
    pub fn windows(&self) -> &[WindowRef] {
        &self.windows
    }

    /// Padded length of whole-record items: `record_pad` resolved against
    /// the longest record.
    pub fn record_frames(&self) -> usize {
        self.record_frames
    }

    /// Seed the generator was last (re)seeded with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Reseed the generator.  The same seed replays the same draws.
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// A copy sharing records and index, with its generator seeded
    /// `seed ^ worker`.
    pub fn fork(&self, worker: usize) -> Self {
        let seed = self.seed ^ worker as u64;
        Self {
            config: Arc::clone(&self.config),
            records: Arc::clone(&self.records),
            index: Arc::clone(&self.index),
            record_ids: Arc::clone(&self.record_ids),
            windows: Arc::clone(&self.windows),
            record_frames: self.record_frames,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Produce item `index`.
    ///
    /// Errors are wrapped in [`WindowError::Sample`] with the offending
    /// record id.
    pub fn get_item(&mut self, index: usize) -> Result<Sample> {
        let len = self.len();
        if index >= len {
            return Err(WindowError::IndexOutOfBounds { index, len });
        }

        let strategy = self.config.strategy;
        let mut sample = match strategy {
            SamplingStrategy::Identity => {
                let id = self.record_ids[index];
                self.whole_record(id).map_err(|e| e.in_sample(id, "whole record"))?
            }
            SamplingStrategy::RandomK { samples_per_record, source } => {
                let id = self.record_ids[index / samples_per_record];
                match source {
                    WindowSource::LabelOffset => self
                        .label_window(id)
                        .map_err(|e| e.in_sample(id, "label window"))?,
                    WindowSource::Uniform => self
                        .uniform_window(id)
                        .map_err(|e| e.in_sample(id, "uniform window"))?,
                }
            }
            SamplingStrategy::Sliding { .. } => {
                let w = self.windows[index];
                self.fixed_window(w.record_id, w.start)
                    .map_err(|e| e.in_sample(w.record_id, "sliding window"))?
            }
        };

        if !self.config.augmentations.is_empty() {
            let id = sample.record_id;
            self.augment(&mut sample).map_err(|e| e.in_sample(id, "augment"))?;
        }
        Ok(sample)
    }

    /// Every item in index order.
    pub fn samples(&mut self) -> Result<Vec<Sample>> {
        (0..self.len()).map(|i| self.get_item(i)).collect()
    }

    // ── Item builders ─────────────────────────────────────────────────────

    /// The spectrogram crop stays aligned to the record's first frame, so
    /// with a `Left` or `Center` anchor it leads the padded signal by the
    /// leading pad.
    fn whole_record(&self, id: i64) -> Result<Sample> {
        let record = self.records.signal(id)?;
        let target = PadTarget::Exact(self.record_frames);
        let signal = pad(record.signal(), target, 0, self.config.anchor, self.config.fill)?;
        let mask = pad(record.mask(), target, 0, self.config.anchor, FillMode::Constant(0.0))?;
        let spectrogram = self.record_spectrogram(id, 0)?;
        Ok(self.with_record_label(Sample {
            record_id: id,
            signal,
            mask,
            spectrogram,
            label: None,
            weight: None,
        }))
    }

    fn label_window(&mut self, id: i64) -> Result<Sample> {
        let rows = self.index.rows(id);
        if rows.is_empty() {
            return Err(WindowError::MissingLabels(id));
        }
        let row = &rows[self.rng.random_range(0..rows.len())];

        let record = self.records.signal(id)?;
        let signal_aligner = DualRateAligner::new(
            self.config.signal_rate,
            self.config.window_sec(),
            self.config.window_frames,
        );
        let start = signal_aligner.frame_of(row.signal_offset_sec)?;
        let (signal, mask) = self.slice_window(id, record, start)?;

        let spectrogram = match (self.config.spectrogram, row.spectrogram_id, row.spectrogram_offset_sec) {
            (Some(cfg), Some(spec_id), Some(offset)) => Some(self.spectrogram_crop(&cfg, spec_id, offset)?),
            _ => None,
        };

        Ok(Sample {
            record_id: id,
            signal,
            mask,
            spectrogram,
            label: Some(Array1::from(row.probs.to_vec())),
            weight: Some(Array1::from(vec![row.weight])),
        })
    }

    fn uniform_window(&mut self, id: i64) -> Result<Sample> {
        let n_frames = self.records.signal(id)?.num_frames();
        let draw = sample_window(n_frames, self.config.window_frames, &mut self.rng);
        self.fixed_window(id, draw.start)
    }

    fn fixed_window(&self, id: i64, start: usize) -> Result<Sample> {
        let record = self.records.signal(id)?;
        let (signal, mask) = self.slice_window(id, record, start)?;
        let spectrogram = self.record_spectrogram(id, start)?;
        Ok(self.with_record_label(Sample {
            record_id: id,
            signal,
            mask,
            spectrogram,
            label: None,
            weight: None,
        }))
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// Slice `[start, start + window)` (truncated at the record end) and pad
    /// back to exactly `window_frames`.
    fn slice_window(&self, id: i64, record: &SignalRecord, start: usize) -> Result<(Array2<f32>, Array2<f32>)> {
        let n = record.num_frames();
        let wf = self.config.window_frames;
        let end = (start + wf).min(n);
        let start = start.min(end);

        let signal = record.signal().slice(s![start..end, ..]);
        let mask = record.mask().slice(s![start..end, ..]);
        if end - start < wf {
            debug!(record_id = id, start, available = end - start, window = wf, "padding short window");
        }
        let target = PadTarget::Exact(wf);
        Ok((
            pad(&signal, target, 0, self.config.anchor, self.config.fill)?,
            pad(&mask, target, 0, self.config.anchor, FillMode::Constant(0.0))?,
        ))
    }

    /// Spectrogram crop for a window starting at signal frame `start`, using
    /// the record-level time shift between the two modalities.
    fn record_spectrogram(&self, id: i64, start: usize) -> Result<Option<Array3<f32>>> {
        let Some(cfg) = self.config.spectrogram else {
            return Ok(None);
        };
        let Some(label) = self.index.label(id) else {
            return Ok(None);
        };
        match (label.spectrogram_id, label.spectrogram_shift_sec) {
            (Some(spec_id), Some(shift)) => {
                let offset = shift + start as f64 / self.config.signal_rate;
                Ok(Some(self.spectrogram_crop(&cfg, spec_id, offset)?))
            }
            _ => Ok(None),
        }
    }

    /// Align, crop and (if the record ends early or the window is narrow)
    /// right-pad with zeros to exactly `crop_to` time bins.
    fn spectrogram_crop(&self, cfg: &SpectrogramConfig, spec_id: i64, offset_sec: f64) -> Result<Array3<f32>> {
        let spec = self.records.spectrogram(spec_id)?;
        let aligned = DualRateAligner::new(cfg.rate, cfg.duration_sec, cfg.crop_to).align(offset_sec)?;
        let crop = aligned.absolute_crop();

        let n_t = spec.shape()[2];
        let end = crop.end.min(n_t);
        let start = crop.start.min(end);
        let view = spec.slice(s![.., .., start..end]);
        if end - start < cfg.crop_to {
            debug!(spectrogram_id = spec_id, start, available = end - start, crop_to = cfg.crop_to, "padding spectrogram crop");
        }
        pad(&view, PadTarget::Exact(cfg.crop_to), 2, Anchor::Right, FillMode::Constant(0.0))
    }

    fn with_record_label(&self, mut sample: Sample) -> Sample {
        if let Some(label) = self.index.label(sample.record_id) {
            sample.label = Some(Array1::from(label.probs.to_vec()));
            sample.weight = Some(Array1::from(vec![label.weight]));
        }
        sample
    }

    fn augment(&mut self, sample: &mut Sample) -> Result<()> {
        if sample.signal.ncols() < NUM_PROBES {
            return Err(WindowError::InvalidDimension(format!(
                "channel augmentation needs {NUM_PROBES} probe columns, got {}",
                sample.signal.ncols()
            )));
        }
        for aug in &self.config.augmentations {
            aug.maybe_apply(&mut sample.signal, &mut sample.mask, &mut self.rng);
        }
        Ok(())
    }
}

fn validate(config: &DatasetConfig) -> Result<()> {
    if config.window_frames == 0 {
        return Err(WindowError::InvalidDimension("window_frames must be > 0".into()));
    }
    if config.signal_rate <= 0.0 || !config.signal_rate.is_finite() {
        return Err(WindowError::InvalidDimension(format!(
            "signal_rate must be positive, got {}",
            config.signal_rate
        )));
    }
    match config.strategy {
        SamplingStrategy::RandomK { samples_per_record: 0, .. } => Err(WindowError::InvalidDimension(
            "samples_per_record must be > 0".into(),
        )),
        SamplingStrategy::Sliding { stride: 0 } => {
            Err(WindowError::InvalidDimension("stride must be > 0".into()))
        }
        _ => Ok(()),
    }
}

/// Every `(record, start, end)` in ascending record id then start order.
/// Records shorter than the window contribute one window `(0, window)` that
/// is padded at access time.
fn sliding_windows(records: &RecordCache, ids: &[i64], window: usize, stride: usize) -> Result<Vec<WindowRef>> {
    let mut out = Vec::new();
    for &id in ids {
        let n = records.signal(id)?.num_frames();
        let spans = enumerate_windows(n, window, stride);
        if spans.is_empty() {
            out.push(WindowRef { record_id: id, start: 0, end: window });
        } else {
            out.extend(spans.into_iter().map(|(start, end)| WindowRef { record_id: id, start, end }));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{LabelRow, WeightReduction};

    fn ramp_record(n: usize, ch: usize) -> SignalRecord {
        SignalRecord::unmasked(Array2::from_shape_fn((n, ch), |(t, c)| (t * 100 + c) as f32))
    }

    fn dataset(strategy: SamplingStrategy, lens: &[(i64, usize)]) -> SampleDataset {
        let mut cache = RecordCache::new();
        let mut rows = vec![];
        for &(id, n) in lens {
            cache.insert_signal(id, ramp_record(n, 3));
            rows.push(LabelRow::from_votes(id, 0.0, [1.0, 0.0, 0.0, 0.0, 0.0, 1.0]));
        }
        let cfg = DatasetConfig { window_frames: 100, strategy, ..DatasetConfig::default() };
        SampleDataset::new(
            cfg,
            Arc::new(cache),
            Arc::new(MetadataIndex::build(rows, WeightReduction::Mean)),
        )
        .unwrap()
    }

    #[test]
    fn identity_pads_to_multiple() {
        let mut ds = dataset(SamplingStrategy::Identity, &[(1, 600), (2, 100)]);
        assert_eq!(ds.len(), 2);
        let s = ds.get_item(0).unwrap();
        assert_eq!(s.record_id, 1);
        assert_eq!(s.signal.dim(), (1024, 3));
        assert_eq!(s.mask[[599, 0]], 1.0);
        assert_eq!(s.mask[[600, 0]], 0.0);
        assert_eq!(s.label.unwrap().to_vec(), vec![0.5, 0.0, 0.0, 0.0, 0.0, 0.5]);
        assert_eq!(s.weight.unwrap()[0], 2.0);

        let short = ds.get_item(1).unwrap();
        assert_eq!(short.signal.dim(), (1024, 3));
        assert_eq!(short.mask.slice(s![100.., ..]).sum(), 0.0);
    }

    #[test]
    fn sliding_index_is_ordered() {
        let ds = dataset(SamplingStrategy::Sliding { stride: 50 }, &[(5, 220), (3, 60)]);
        let w: Vec<(i64, usize)> = ds.windows().iter().map(|w| (w.record_id, w.start)).collect();
        assert_eq!(w, vec![(3, 0), (5, 0), (5, 50), (5, 100)]);
    }

    #[test]
    fn random_k_maps_index_to_record() {
        let mut ds = dataset(
            SamplingStrategy::RandomK { samples_per_record: 3, source: WindowSource::Uniform },
            &[(10, 500), (20, 500)],
        );
        assert_eq!(ds.len(), 6);
        assert_eq!(ds.get_item(2).unwrap().record_id, 10);
        assert_eq!(ds.get_item(3).unwrap().record_id, 20);
        assert!(matches!(ds.get_item(6), Err(WindowError::IndexOutOfBounds { index: 6, len: 6 })));
    }

    #[test]
    fn zero_stride_rejected() {
        let cfg = DatasetConfig {
            strategy: SamplingStrategy::Sliding { stride: 0 },
            ..DatasetConfig::default()
        };
        let err = SampleDataset::new(cfg, Arc::new(RecordCache::new()), Arc::new(MetadataIndex::default()))
            .unwrap_err();
        assert!(matches!(err, WindowError::InvalidDimension(_)));
    }

    #[test]
    fn fork_derives_worker_seed() {
        let ds = dataset(SamplingStrategy::Identity, &[(1, 10)]);
        assert_eq!(ds.fork(0).seed(), 42);
        assert_eq!(ds.fork(3).seed(), 42 ^ 3);
    }
}
