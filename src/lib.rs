//! # eegwin: EEG windowing and sample assembly
//!
//! `eegwin` turns cached EEG recordings (and their companion spectrograms)
//! into fixed-shape training samples: random or exhaustive temporal windows,
//! padding to a length or multiple, offset alignment between the 40 Hz
//! signal and the 0.5 Hz spectrogram, and per-channel-group aggregation.
//!
//! ## Pipeline overview
//!
//! ```text
//! records.safetensors + labels.json
//!   │
//!   ├─ io::load_records()        signal/<id>, mask/<id>, spectrogram/<id>
//!   ├─ MetadataIndex::build()    label rows grouped and averaged per record
//!   ├─ SampleDataset             index → window (identity / random-k / sliding)
//!   │    ├─ window               start draw or stride enumeration
//!   │    ├─ pad                  reflect / constant, left / right / center
//!   │    ├─ align                signal offset → spectrogram crop
//!   │    └─ augment              channel swaps, permutation, drop
//!   ├─ ParallelLoader            rayon fan-out, worker seeds `seed ^ w`
//!   └─ collate()                 (B, T, C) batch
//!        │
//!        └─→ batch.safetensors
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use eegwin::{DatasetConfig, MetadataIndex, ParallelLoader, SampleDataset, SamplingStrategy};
//! use eegwin::io::{load_label_rows, load_records};
//! use std::path::Path;
//!
//! let records = load_records(Path::new("records.safetensors")).unwrap();
//! let rows    = load_label_rows(Path::new("labels.json")).unwrap();
//! let index   = MetadataIndex::build(rows, Default::default());
//!
//! let cfg = DatasetConfig {
//!     strategy: SamplingStrategy::Sliding { stride: 1000 },
//!     ..DatasetConfig::default()
//! };
//! let ds = SampleDataset::new(cfg, Arc::new(records), Arc::new(index)).unwrap();
//! let batches = ParallelLoader::new(4).batches(&ds, 32).unwrap();
//! println!("{} batches", batches.len());
//! ```
//!
//! ## Group aggregation
//!
//! Spectrogram-shaped tensors `(B, G, F, T)` are reduced per channel group
//! by [`Aggregator`]; stacked EEG `(B, C, T)` is regrouped by
//! [`EegCollator`].  Neither runs inside [`SampleDataset`]; they sit between
//! the loader and the model.

pub mod aggregate;
pub mod align;
pub mod augment;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod io;
pub mod labels;
pub mod loader;
pub mod montage;
pub mod pad;
pub mod records;
pub mod window;

// ── Crate-root re-exports ─────────────────────────────────────────────────
//
// Everything a downstream user is likely to need is available directly as
// `eegwin::Foo` without having to know the internal module layout.

// config
pub use config::{DatasetConfig, SpectrogramConfig};

// error
pub use error::{RecordKind, Result, WindowError};

// pad
pub use pad::{pad, pad_time_axis, reflect_index, Anchor, FillMode, PadTarget};

// window
pub use window::{enumerate_windows, sample_window, sample_windows, WindowDraw};

// align
pub use align::{Alignment, DualRateAligner};

// aggregate
pub use aggregate::{
    collate_lr, dual_stack_channels, per_channel_stack,
    AggregationStrategy, Aggregator, ChannelGroups, EegCollator,
};

// montage / augment
pub use augment::{Augmentation, ChannelAugment};
pub use montage::bipolar_montage;

// labels / records
pub use labels::{aggregate_rows, LabelRow, MetadataIndex, RecordLabel, WeightReduction};
pub use records::{RecordCache, SignalRecord, SpectrogramRecord};

// dataset / loader
pub use dataset::{Sample, SampleDataset, SamplingStrategy, WindowRef, WindowSource};
pub use loader::{collate, Batch, ParallelLoader};

// io: safetensors helpers
pub use io::{load_label_rows, load_records, write_batch, StWriter};
