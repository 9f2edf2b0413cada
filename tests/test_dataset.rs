mod common;
use common::{cache, dataset, ramp, single_rows, spectrogram};
use eegwin::{
    Anchor, Augmentation, ChannelAugment, DatasetConfig, FillMode, LabelRow, ParallelLoader,
    RecordKind, SamplingStrategy, SpectrogramConfig, WindowError, WindowSource,
};
use ndarray::s;

fn uniform(k: usize) -> SamplingStrategy {
    SamplingStrategy::RandomK { samples_per_record: k, source: WindowSource::Uniform }
}

#[test]
fn short_record_is_padded_to_window() {
    let cfg = DatasetConfig {
        window_frames: 2048,
        strategy: uniform(1),
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, cache(&[(42, 1500)], 20), single_rows(&[42]));
    let s = ds.get_item(0).unwrap();

    assert_eq!(s.record_id, 42);
    assert_eq!(s.signal.dim(), (2048, 20));
    assert_eq!(s.signal.slice(s![..1500, ..]), ramp(1500, 20));
    assert!(s.mask.slice(s![..1500, ..]).iter().all(|&v| v == 1.0));
    assert!(s.mask.slice(s![1500.., ..]).iter().all(|&v| v == 0.0));
    // reflect fill mirrors the tail: frame 1500 copies frame 1498
    assert_eq!(s.signal.row(1500), s.signal.row(1498));
}

#[test]
fn constant_fill_zeroes_padding() {
    let cfg = DatasetConfig {
        window_frames: 2048,
        fill: FillMode::Constant(0.0),
        strategy: uniform(1),
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, cache(&[(42, 1500)], 20), single_rows(&[42]));
    let s = ds.get_item(0).unwrap();
    assert!(s.signal.slice(s![1500.., ..]).iter().all(|&v| v == 0.0));
}

#[test]
fn uniform_windows_are_real_slices() {
    let cfg = DatasetConfig { window_frames: 500, strategy: uniform(8), ..DatasetConfig::default() };
    let mut ds = dataset(cfg, cache(&[(1, 3000)], 4), single_rows(&[1]));
    for s in ds.samples().unwrap() {
        assert_eq!(s.signal.dim(), (500, 4));
        let start = (s.signal[[0, 0]] as usize - 1) / 1000;
        assert!(start + 500 <= 3000);
        assert_eq!(s.signal, ramp(3000, 4).slice(s![start..start + 500, ..]));
        assert!(s.mask.iter().all(|&v| v == 1.0));
    }
}

#[test]
fn reset_replays_draws() {
    let cfg = DatasetConfig { window_frames: 100, strategy: uniform(5), ..DatasetConfig::default() };
    let mut ds = dataset(cfg, cache(&[(1, 100_000), (2, 100_000)], 2), single_rows(&[1, 2]));
    let starts = |ds: &mut eegwin::SampleDataset| -> Vec<f32> {
        ds.samples().unwrap().iter().map(|s| s.signal[[0, 0]]).collect()
    };

    let first = starts(&mut ds);
    let second = starts(&mut ds);
    assert_ne!(first, second, "generator advances between passes");

    ds.reset(42);
    assert_eq!(starts(&mut ds), first);
    ds.reset(7);
    assert_ne!(starts(&mut ds), first);
}

#[test]
fn sliding_windows_cover_record() {
    let cfg = DatasetConfig {
        window_frames: 2048,
        strategy: SamplingStrategy::Sliding { stride: 2048 },
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, cache(&[(9, 5000), (3, 1000)], 2), single_rows(&[9, 3]));
    let w: Vec<(i64, usize, usize)> = ds.windows().iter().map(|w| (w.record_id, w.start, w.end)).collect();
    assert_eq!(w, vec![(3, 0, 2048), (9, 0, 2048), (9, 2048, 4096)]);

    let s = ds.get_item(2).unwrap();
    assert_eq!(s.signal[[0, 0]], (2048 * 1000 + 1) as f32);
    let s = ds.get_item(0).unwrap();
    assert_eq!(s.signal.nrows(), 2048);
    assert_eq!(s.mask.slice(s![1000.., ..]).sum(), 0.0);
}

#[test]
fn label_offset_window_with_spectrogram() {
    let mut records = cache(&[(5, 4000)], 20);
    records.insert_spectrogram(100, spectrogram(4, 8, 400));
    let row = LabelRow::from_votes(5, 10.0, [0.0, 3.0, 0.0, 0.0, 0.0, 1.0]).with_spectrogram(100, 10.0);

    let cfg = DatasetConfig {
        strategy: SamplingStrategy::RandomK { samples_per_record: 1, source: WindowSource::LabelOffset },
        spectrogram: Some(SpectrogramConfig::default()),
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, records, vec![row]);
    let s = ds.get_item(0).unwrap();

    // 10 s at 40 Hz
    assert_eq!(s.signal.dim(), (2000, 20));
    assert_eq!(s.signal[[0, 0]], (400 * 1000 + 1) as f32);

    let spec = s.spectrogram.unwrap();
    assert_eq!(spec.dim(), (4, 8, 256));
    assert_eq!(spec[[0, 0, 0]], 27.0);
    assert_eq!(spec[[3, 7, 255]], 282.0);

    assert_eq!(s.label.unwrap().to_vec(), vec![0.0, 0.75, 0.0, 0.0, 0.0, 0.25]);
    assert_eq!(s.weight.unwrap()[0], 4.0);
}

#[test]
fn spectrogram_crop_past_end_is_zero_padded() {
    let mut records = cache(&[(5, 4000)], 2);
    records.insert_spectrogram(100, spectrogram(1, 2, 200));
    let row = LabelRow::from_votes(5, 10.0, [1.0; 6]).with_spectrogram(100, 10.0);

    let cfg = DatasetConfig {
        strategy: SamplingStrategy::RandomK { samples_per_record: 1, source: WindowSource::LabelOffset },
        spectrogram: Some(SpectrogramConfig::default()),
        ..DatasetConfig::default()
    };
    let spec = dataset(cfg, records, vec![row]).get_item(0).unwrap().spectrogram.unwrap();
    assert_eq!(spec.dim(), (1, 2, 256));
    // bins 27..200 present, the rest zero
    assert_eq!(spec[[0, 0, 172]], 199.0);
    assert_eq!(spec[[0, 0, 173]], 0.0);
}

#[test]
fn missing_spectrogram_names_record() {
    let row = LabelRow::from_votes(5, 0.0, [1.0; 6]).with_spectrogram(999, 0.0);
    let cfg = DatasetConfig {
        strategy: SamplingStrategy::RandomK { samples_per_record: 1, source: WindowSource::LabelOffset },
        spectrogram: Some(SpectrogramConfig::default()),
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, cache(&[(5, 4000)], 2), vec![row]);
    match ds.get_item(0).unwrap_err() {
        WindowError::Sample { record_id, source, .. } => {
            assert_eq!(record_id, 5);
            assert!(matches!(
                *source,
                WindowError::RecordNotFound { kind: RecordKind::Spectrogram, id: 999 }
            ));
        }
        other => panic!("unexpected {other}"),
    }
}

#[test]
fn missing_signal_rejected_at_construction() {
    let index = eegwin::MetadataIndex::build(single_rows(&[1, 2]), Default::default());
    let err = eegwin::SampleDataset::new(
        DatasetConfig::default(),
        std::sync::Arc::new(cache(&[(1, 100)], 2)),
        std::sync::Arc::new(index),
    )
    .unwrap_err();
    assert!(matches!(err, WindowError::RecordNotFound { kind: RecordKind::Signal, id: 2 }));
}

#[test]
fn lr_swap_augmentation() {
    let cfg = DatasetConfig {
        window_frames: 100,
        strategy: uniform(1),
        augmentations: vec![Augmentation::new(ChannelAugment::SwapLr, 1.0)],
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, cache(&[(1, 100)], 20), single_rows(&[1]));
    let s = ds.get_item(0).unwrap();
    // Fp1 (column 0) now holds Fp2 (column 11), midline untouched
    assert_eq!(s.signal[[0, 0]], 12.0);
    assert_eq!(s.signal[[0, 11]], 1.0);
    assert_eq!(s.signal[[0, 9]], 10.0);
}

#[test]
fn augmentation_needs_full_probe_set() {
    let cfg = DatasetConfig {
        window_frames: 100,
        strategy: uniform(1),
        augmentations: vec![Augmentation::new(ChannelAugment::SwapLr, 1.0)],
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, cache(&[(1, 100)], 4), single_rows(&[1]));
    assert!(matches!(ds.get_item(0), Err(WindowError::Sample { op: "augment", .. })));
}

#[test]
fn identity_items_share_one_length() {
    let mut ds = dataset(DatasetConfig::default(), cache(&[(1, 1000), (2, 1600)], 20), single_rows(&[1, 2]));
    assert_eq!(ds.record_frames(), 2048);
    assert_eq!(ds.get_item(0).unwrap().signal.dim(), (2048, 20));

    let batches = ParallelLoader::new(4).batches(&ds, 32).unwrap();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.signal.dim(), (2, 2048, 20));
    assert_eq!(batch.mask.slice(s![0, 1000.., ..]).sum(), 0.0);
    assert_eq!(batch.mask.slice(s![1, ..1600, ..]).sum(), 1600.0 * 20.0);
    assert_eq!(batch.mask.slice(s![1, 1600.., ..]).sum(), 0.0);
}

#[test]
fn sliding_spectrogram_follows_record_shift() {
    let mut records = cache(&[(5, 4000)], 2);
    records.insert_spectrogram(100, spectrogram(1, 2, 400));
    // signal 10 s ↔ spectrogram 30 s: shift of 20 s
    let rows = vec![
        LabelRow::from_votes(5, 10.0, [1.0; 6]).with_spectrogram(100, 30.0),
        LabelRow::from_votes(5, 30.0, [1.0; 6]).with_spectrogram(100, 50.0),
    ];
    let cfg = DatasetConfig {
        strategy: SamplingStrategy::Sliding { stride: 2000 },
        spectrogram: Some(SpectrogramConfig::default()),
        ..DatasetConfig::default()
    };
    let mut ds = dataset(cfg, records, rows);
    assert_eq!(ds.len(), 2);

    // window 0: 20 s → frame 10, +22 crop
    let spec = ds.get_item(0).unwrap().spectrogram.unwrap();
    assert_eq!(spec.dim(), (1, 2, 256));
    assert_eq!(spec[[0, 0, 0]], 32.0);
    // window 1 starts 50 s later: 70 s → frame 35, +22 crop
    let spec = ds.get_item(1).unwrap().spectrogram.unwrap();
    assert_eq!(spec[[0, 1, 0]], 57.0);
    assert_eq!(spec[[0, 1, 255]], 312.0);
}

#[test]
fn identity_spectrogram_ignores_anchor() {
    let first_bin = |anchor: Anchor| {
        let mut records = cache(&[(5, 1000)], 2);
        records.insert_spectrogram(100, spectrogram(1, 1, 400));
        let rows = vec![LabelRow::from_votes(5, 0.0, [1.0; 6]).with_spectrogram(100, 30.0)];
        let cfg = DatasetConfig {
            anchor,
            spectrogram: Some(SpectrogramConfig::default()),
            ..DatasetConfig::default()
        };
        let s = dataset(cfg, records, rows).get_item(0).unwrap();
        assert_eq!(s.signal.nrows(), 1024);
        (s.mask[[0, 0]], s.spectrogram.unwrap()[[0, 0, 0]])
    };
    // 30 s → frame 15, +22 crop, whatever the padding layout
    assert_eq!(first_bin(Anchor::Right), (1.0, 37.0));
    assert_eq!(first_bin(Anchor::Left), (0.0, 37.0));
    assert_eq!(first_bin(Anchor::Center), (0.0, 37.0));
}
