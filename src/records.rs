//! Preloaded signal and spectrogram records.
//!
//! The cache is filled once before sampling starts and is read-only
//! afterwards, so it is shared between workers behind an `Arc` without
//! locking.
use std::collections::HashMap;

use ndarray::{Array2, Array3};

use crate::error::{RecordKind, Result, WindowError};

/// A time-major `(num_frames, num_channels)` signal with its validity mask.
#[derive(Debug, Clone)]
pub struct SignalRecord {
    signal: Array2<f32>,
    mask: Array2<f32>,
}

impl SignalRecord {
    /// Pair a signal with its mask; both must have the same shape.
    pub fn new(signal: Array2<f32>, mask: Array2<f32>) -> Result<Self> {
        if signal.dim() != mask.dim() {
            return Err(WindowError::ShapeMismatch(format!(
                "signal {:?} vs mask {:?}",
                signal.dim(),
                mask.dim()
            )));
        }
        Ok(Self { signal, mask })
    }

    /// A signal trusted everywhere (all-ones mask).
    pub fn unmasked(signal: Array2<f32>) -> Self {
        let mask = Array2::ones(signal.raw_dim());
        Self { signal, mask }
    }

    pub fn signal(&self) -> &Array2<f32> {
        &self.signal
    }

    pub fn mask(&self) -> &Array2<f32> {
        &self.mask
    }

    pub fn num_frames(&self) -> usize {
        self.signal.nrows()
    }

    pub fn num_channels(&self) -> usize {
        self.signal.ncols()
    }
}

/// A `(channel_group, freq_bins, time_bins)` spectrogram.
pub type SpectrogramRecord = Array3<f32>;

/// Read-only id → record mappings for both modalities.
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    signals: HashMap<i64, SignalRecord>,
    spectrograms: HashMap<i64, SpectrogramRecord>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_signal(&mut self, id: i64, record: SignalRecord) {
        self.signals.insert(id, record);
    }

    pub fn insert_spectrogram(&mut self, id: i64, record: SpectrogramRecord) {
        self.spectrograms.insert(id, record);
    }

    pub fn signal(&self, id: i64) -> Result<&SignalRecord> {
        self.signals
            .get(&id)
            .ok_or(WindowError::RecordNotFound { kind: RecordKind::Signal, id })
    }

    pub fn spectrogram(&self, id: i64) -> Result<&SpectrogramRecord> {
        self.spectrograms
            .get(&id)
            .ok_or(WindowError::RecordNotFound { kind: RecordKind::Spectrogram, id })
    }

    /// Signal ids, ascending.
    pub fn signal_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.signals.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn num_signals(&self) -> usize {
        self.signals.len()
    }

    pub fn num_spectrograms(&self) -> usize {
        self.spectrograms.len()
    }
}
