use eegwin::{enumerate_windows, sample_window, sample_windows, DualRateAligner, WindowError};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn random_windows_stay_in_bounds() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..1000 {
        let d = sample_window(5000, 2048, &mut rng);
        assert!(!d.needs_padding);
        assert!(d.end(2048) <= 5000);
    }
    let d = sample_window(2048, 2048, &mut rng);
    assert_eq!((d.start, d.needs_padding), (0, false));
}

#[test]
fn random_windows_are_reproducible() {
    let a = sample_windows(100_000, 2000, 16, &mut StdRng::seed_from_u64(42));
    let b = sample_windows(100_000, 2000, 16, &mut StdRng::seed_from_u64(42));
    let c = sample_windows(100_000, 2000, 16, &mut StdRng::seed_from_u64(43));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn short_record_needs_padding() {
    let d = sample_window(1500, 2048, &mut StdRng::seed_from_u64(0));
    assert_eq!(d.start, 0);
    assert!(d.needs_padding);
}

#[test]
fn enumeration_is_exhaustive() {
    assert_eq!(enumerate_windows(5000, 2048, 2048), vec![(0, 2048), (2048, 4096)]);

    let (len, dur, stride) = (10_000, 2000, 700);
    let w = enumerate_windows(len, dur, stride);
    assert_eq!(w.len(), (len - dur) / stride + 1);
    for (i, &(s, e)) in w.iter().enumerate() {
        assert_eq!(s, i * stride);
        assert_eq!(e - s, dur);
        assert!(e <= len);
    }
    // the next start would overrun
    assert!(w.last().unwrap().0 + stride + dur > len);
}

#[test]
fn enumeration_of_short_record_is_empty() {
    assert!(enumerate_windows(1500, 2048, 512).is_empty());
}

#[test]
fn alignment_crop_is_exact() {
    let aligner = DualRateAligner::new(0.5, 600.0, 256);
    for offset in [0.0, 10.0, 31.0, 1234.5] {
        let a = aligner.align(offset).unwrap();
        assert_eq!(a.start, (offset * 0.5) as usize);
        assert_eq!(a.crop.len(), 256);
        assert_eq!(a.crop, 22..278);
        assert_eq!(a.absolute_crop(), a.start + 22..a.start + 278);
    }
}

#[test]
fn alignment_from_signal_frame() {
    // 400 frames at 40 Hz = 10 s
    let a = DualRateAligner::new(0.5, 600.0, 256).align_frame(400, 40.0).unwrap();
    assert_eq!(a.start, 5);
    assert_eq!(a.absolute_crop(), 27..283);
}

#[test]
fn odd_excess_goes_right() {
    let a = DualRateAligner::new(1.0, 11.0, 8).align(0.0).unwrap();
    assert_eq!(a.crop, 1..9);
}

#[test]
fn negative_offset_rejected() {
    assert!(matches!(
        DualRateAligner::new(0.5, 600.0, 256).align(-1.0),
        Err(WindowError::InvalidOffset(_))
    ));
}
