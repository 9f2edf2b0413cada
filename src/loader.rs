//! Parallel sample production and batch collation.
//!
//! [`ParallelLoader`] splits `0..len` into `num_workers` contiguous ranges.
//! Worker `w` owns `dataset.fork(w)`, i.e. a generator seeded `seed ^ w`,
//! so its draws are reproducible on their own and differ from every other
//! worker's.  Results come back in index order whatever the thread
//! scheduling; the partition depends only on `num_workers`, not on the
//! size of the rayon pool.
use std::ops::Range;

use ndarray::{stack, Array, Array2, Array3, Array4, ArrayView, Axis, Dimension, RemoveAxis};
use rayon::prelude::*;
use tracing::debug;

use crate::dataset::{Sample, SampleDataset};
use crate::error::{Result, WindowError};

/// Stacked samples.
#[derive(Debug, Clone)]
pub struct Batch {
    pub record_ids: Vec<i64>,
    /// `(B, T, C)`
    pub signal: Array3<f32>,
    /// `(B, T, C)`
    pub mask: Array3<f32>,
    /// `(B, G, F, W)`
    pub spectrogram: Option<Array4<f32>>,
    /// `(B, classes)`
    pub label: Option<Array2<f32>>,
    /// `(B, 1)`
    pub weight: Option<Array2<f32>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.record_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_ids.is_empty()
    }
}

/// Stack `samples` along a new leading axis.
///
/// # Errors
///
/// * [`WindowError::NonUniformBatch`] if any field's shape (or presence)
///   differs from the first sample's.
/// * [`WindowError::InvalidDimension`] for an empty slice.
pub fn collate(samples: &[Sample]) -> Result<Batch> {
    if samples.is_empty() {
        return Err(WindowError::InvalidDimension("cannot collate an empty batch".into()));
    }
    Ok(Batch {
        record_ids: samples.iter().map(|s| s.record_id).collect(),
        signal: stack_field(samples, "signal", |s| Some(s.signal.view()))?
            .ok_or_else(|| WindowError::InvalidDimension("missing signal".into()))?,
        mask: stack_field(samples, "mask", |s| Some(s.mask.view()))?
            .ok_or_else(|| WindowError::InvalidDimension("missing mask".into()))?,
        spectrogram: stack_field(samples, "spectrogram", |s| s.spectrogram.as_ref().map(|a| a.view()))?,
        label: stack_field(samples, "label", |s| s.label.as_ref().map(|a| a.view()))?,
        weight: stack_field(samples, "weight", |s| s.weight.as_ref().map(|a| a.view()))?,
    })
}

fn stack_field<'a, D, F>(
    samples: &'a [Sample],
    field: &'static str,
    get: F,
) -> Result<Option<Array<f32, D::Larger>>>
where
    D: Dimension,
    D::Larger: RemoveAxis,
    F: Fn(&'a Sample) -> Option<ArrayView<'a, f32, D>>,
{
    let views: Vec<Option<ArrayView<'a, f32, D>>> = samples.iter().map(&get).collect();
    let expected: Option<Vec<usize>> = views[0].as_ref().map(|v| v.shape().to_vec());

    for (index, v) in views.iter().enumerate() {
        let got: Option<Vec<usize>> = v.as_ref().map(|v| v.shape().to_vec());
        if got != expected {
            return Err(WindowError::NonUniformBatch {
                index,
                field,
                got: got.unwrap_or_default(),
                expected: expected.unwrap_or_default(),
            });
        }
    }
    if expected.is_none() {
        return Ok(None);
    }
    let views: Vec<ArrayView<'a, f32, D>> = views.into_iter().flatten().collect();
    stack(Axis(0), &views)
        .map(Some)
        .map_err(|e| WindowError::ShapeMismatch(e.to_string()))
}

/// Fan-out over a fixed number of logical workers.
#[derive(Debug, Clone, Copy)]
pub struct ParallelLoader {
    pub num_workers: usize,
}

impl ParallelLoader {
    pub fn new(num_workers: usize) -> Self {
        Self { num_workers: num_workers.max(1) }
    }

    /// Contiguous, disjoint index ranges covering `0..len`, one per worker
    /// (trailing workers may get none).
    pub fn worker_ranges(&self, len: usize) -> Vec<Range<usize>> {
        let workers = self.num_workers.max(1);
        let chunk = len.div_ceil(workers);
        (0..workers)
            .map(|w| (w * chunk).min(len)..((w + 1) * chunk).min(len))
            .collect()
    }

    /// Produce every item of `dataset` in index order.
    ///
    /// The first failing item aborts the pass.
    pub fn load_all(&self, dataset: &SampleDataset) -> Result<Vec<Sample>> {
        let ranges = self.worker_ranges(dataset.len());
        let per_worker: Vec<Vec<Sample>> = ranges
            .into_par_iter()
            .enumerate()
            .map(|(worker, range)| {
                let mut ds = dataset.fork(worker);
                debug!(worker, seed = ds.seed(), start = range.start, end = range.end, "worker start");
                range.map(|i| ds.get_item(i)).collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(per_worker.into_iter().flatten().collect())
    }

    /// [`load_all`](Self::load_all) followed by collation into batches of
    /// `batch_size` (the last one may be smaller).
    pub fn batches(&self, dataset: &SampleDataset, batch_size: usize) -> Result<Vec<Batch>> {
        if batch_size == 0 {
            return Err(WindowError::InvalidDimension("batch_size must be > 0".into()));
        }
        let samples = self.load_all(dataset)?;
        samples.chunks(batch_size).map(collate).collect()
    }
}
