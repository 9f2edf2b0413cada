/// Shared synthetic fixtures.
use eegwin::{
    DatasetConfig, LabelRow, MetadataIndex, RecordCache, SampleDataset, SignalRecord,
    WeightReduction,
};
use ndarray::{Array2, Array3};
use std::sync::Arc;

#[allow(unused)]
/// `(T, C)` signal whose value encodes its position: `t * 1000 + c + 1`.
/// Never zero, so zero-filled padding is easy to tell apart.
pub fn ramp(n_frames: usize, n_channels: usize) -> Array2<f32> {
    Array2::from_shape_fn((n_frames, n_channels), |(t, c)| (t * 1000 + c + 1) as f32)
}

#[allow(unused)]
/// `(G, F, T)` spectrogram whose value is its time bin.
pub fn spectrogram(groups: usize, freqs: usize, bins: usize) -> Array3<f32> {
    Array3::from_shape_fn((groups, freqs, bins), |(_, _, t)| t as f32)
}

#[allow(unused)]
/// Cache of unmasked ramp records, `(id, frames)` each with `channels` columns.
pub fn cache(records: &[(i64, usize)], channels: usize) -> RecordCache {
    let mut cache = RecordCache::new();
    for &(id, n) in records {
        cache.insert_signal(id, SignalRecord::unmasked(ramp(n, channels)));
    }
    cache
}

#[allow(unused)]
/// One vote for class 0 per record, at offset 0.
pub fn single_rows(ids: &[i64]) -> Vec<LabelRow> {
    ids.iter()
        .map(|&id| LabelRow::from_votes(id, 0.0, [1.0, 0.0, 0.0, 0.0, 0.0, 0.0]))
        .collect()
}

#[allow(unused)]
pub fn dataset(cfg: DatasetConfig, cache: RecordCache, rows: Vec<LabelRow>) -> SampleDataset {
    let index = MetadataIndex::build(rows, WeightReduction::Mean);
    SampleDataset::new(cfg, Arc::new(cache), Arc::new(index)).expect("dataset")
}
