//! Error taxonomy for windowing, alignment and sample assembly.
//!
//! Every variant is fatal for the current pass: nothing in this crate
//! substitutes a degraded sample when one of these fires.
use thiserror::Error;

/// Which id space a missing record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Signal,
    Spectrogram,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Signal => f.write_str("signal"),
            RecordKind::Spectrogram => f.write_str("spectrogram"),
        }
    }
}

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("unsupported fill mode {0:?} (expected \"reflect\" or \"constant\")")]
    UnsupportedFillMode(String),

    #[error("unsupported anchor {0:?} (expected \"left\", \"right\" or \"center\")")]
    UnsupportedAnchor(String),

    #[error("crop size mismatch: window of {width} frames cropped to {got}, expected {expected}")]
    CropSizeMismatch { width: usize, got: usize, expected: usize },

    #[error("{kind} record {id} not found")]
    RecordNotFound { kind: RecordKind, id: i64 },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid offset {0} s")]
    InvalidOffset(f64),

    #[error("record {0} has no label rows to draw from")]
    MissingLabels(i64),

    #[error("index {index} out of bounds for dataset of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("non-uniform batch: item {index} has {field} shape {got:?}, expected {expected:?}")]
    NonUniformBatch {
        index: usize,
        field: &'static str,
        got: Vec<usize>,
        expected: Vec<usize>,
    },

    #[error("record {record_id}: {op} failed: {source}")]
    Sample {
        record_id: i64,
        op: &'static str,
        #[source]
        source: Box<WindowError>,
    },
}

impl WindowError {
    /// Attach the record id and operation that produced this error.
    pub fn in_sample(self, record_id: i64, op: &'static str) -> Self {
        WindowError::Sample { record_id, op, source: Box::new(self) }
    }
}

pub type Result<T, E = WindowError> = std::result::Result<T, E>;
