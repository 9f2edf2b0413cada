//! Dataset configuration.
//!
//! [`DatasetConfig`] holds every tunable of sample assembly.  All fields have
//! defaults matching the training setup (40 Hz EEG, 50 s windows, 0.5 Hz
//! spectrograms cropped to 256 frames).
use serde::Deserialize;

use crate::augment::Augmentation;
use crate::dataset::SamplingStrategy;
use crate::labels::WeightReduction;
use crate::pad::{Anchor, FillMode, PadTarget};

/// Spectrogram alignment parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpectrogramConfig {
    /// Spectrogram frame rate in Hz.
    ///
    /// Default: `0.5` Hz (one column every 2 s).
    pub rate: f64,

    /// Span of the spectrogram window around a label, in seconds.
    ///
    /// At the defaults this covers **300** frames before cropping.
    ///
    /// Default: `600.0` s.
    pub duration_sec: f64,

    /// Exact width of every spectrogram crop.
    ///
    /// Default: `256`.
    pub crop_to: usize,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self { rate: 0.5, duration_sec: 600.0, crop_to: 256 }
    }
}

/// Configuration for one dataset instance.
///
/// All fields are `pub`, so struct-update syntax works:
///
/// ```
/// use eegwin::{DatasetConfig, SamplingStrategy};
///
/// let cfg = DatasetConfig {
///     window_frames: 2048,
///     strategy: SamplingStrategy::Sliding { stride: 1024 },
///     ..DatasetConfig::default()
/// };
/// assert_eq!(cfg.window_sec(), 51.2);
/// ```
///
/// It also deserialises from JSON; missing fields keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// EEG sampling rate in Hz.
    ///
    /// Default: `40.0` Hz.
    pub signal_rate: f64,

    /// Length of every signal window in frames.
    ///
    /// Windowed strategies pad shorter slices up to exactly this length.
    ///
    /// Default: `2000` (50 s at 40 Hz).
    pub window_frames: usize,

    /// Padding target for whole-record items ([`SamplingStrategy::Identity`]).
    ///
    /// Resolved once against the longest record, so every item of a dataset
    /// has the same length.
    ///
    /// Default: multiple of `512`.
    pub record_pad: PadTarget,

    /// Where signal padding goes.
    ///
    /// Whole-record spectrograms are aligned to the first recorded frame,
    /// not to the start of the padded item.
    ///
    /// Default: [`Anchor::Right`].
    pub anchor: Anchor,

    /// How padded signal frames are filled.  Masks are always zero-filled.
    ///
    /// Default: [`FillMode::Reflect`].
    pub fill: FillMode,

    /// Spectrogram alignment; `None` produces samples without a spectrogram.
    ///
    /// Default: `None`.
    pub spectrogram: Option<SpectrogramConfig>,

    /// How several label rows of one record combine their weights.
    ///
    /// Default: [`WeightReduction::Mean`].
    pub weight_reduction: WeightReduction,

    /// Index → window mapping.
    ///
    /// Default: [`SamplingStrategy::Identity`].
    pub strategy: SamplingStrategy,

    /// Channel augmentations, applied in order to each item.
    ///
    /// Default: `[]`.
    pub augmentations: Vec<Augmentation>,

    /// Seed of the dataset generator; workers derive `seed ^ worker`.
    ///
    /// Default: `42`.
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            signal_rate: 40.0,
            window_frames: 2000,
            record_pad: PadTarget::MultipleOf(512),
            anchor: Anchor::Right,
            fill: FillMode::Reflect,
            spectrogram: None,
            weight_reduction: WeightReduction::Mean,
            strategy: SamplingStrategy::Identity,
            augmentations: vec![],
            seed: 42,
        }
    }
}

impl DatasetConfig {
    /// Window duration in seconds.
    pub fn window_sec(&self) -> f64 {
        self.window_frames as f64 / self.signal_rate
    }

    /// Parse a JSON config, keeping defaults for absent fields.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = DatasetConfig::from_json(
            r#"{
                "window_frames": 2048,
                "fill": {"mode": "constant", "value": 0.0},
                "strategy": {"random_k": {"samples_per_record": 4, "source": "label_offset"}},
                "spectrogram": {"crop_to": 128},
                "augmentations": [{"kind": "channel_drop", "rate": 0.1, "p": 0.3}]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.window_frames, 2048);
        assert_eq!(cfg.signal_rate, 40.0);
        assert_eq!(cfg.fill, FillMode::Constant(0.0));
        assert_eq!(cfg.spectrogram.unwrap().rate, 0.5);
        assert_eq!(cfg.spectrogram.unwrap().crop_to, 128);
        assert_eq!(cfg.augmentations[0].p, 0.3);
        assert!(matches!(cfg.strategy, SamplingStrategy::RandomK { samples_per_record: 4, .. }));
    }

    #[test]
    fn default_window_is_fifty_seconds() {
        assert_eq!(DatasetConfig::default().window_sec(), 50.0);
    }
}
