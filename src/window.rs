//! Window sampling over a long recording.
//!
//! Two modes:
//!
//! - random:     [`sample_window`] / [`sample_windows`] draw a start offset
//!   uniformly from `[0, len − duration]` with a caller-owned generator;
//! - exhaustive: [`enumerate_windows`] lists every `(start, end)` at a fixed
//!   stride, dropping the trailing partial window.
//!
//! Recordings shorter than the window are never sliced: random mode reports
//! `needs_padding` with start 0, exhaustive mode returns nothing and the
//! caller pads the whole record to `duration` first.
use rand::Rng;

/// One random draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowDraw {
    /// First frame of the window.
    pub start: usize,
    /// The record is shorter than the window and must be padded, not sliced.
    pub needs_padding: bool,
}

impl WindowDraw {
    /// Exclusive end frame of a window of `duration` frames.
    pub fn end(&self, duration: usize) -> usize {
        self.start + duration
    }
}

/// Draw one window start for a record of `len` frames.
///
/// Short records consume no generator state.
pub fn sample_window<R: Rng>(len: usize, duration: usize, rng: &mut R) -> WindowDraw {
    if len < duration {
        return WindowDraw { start: 0, needs_padding: true };
    }
    let start = rng.random_range(0..=len - duration);
    WindowDraw { start, needs_padding: false }
}

/// Draw `k` independent window starts; duplicates are allowed.
pub fn sample_windows<R: Rng>(len: usize, duration: usize, k: usize, rng: &mut R) -> Vec<WindowDraw> {
    (0..k).map(|_| sample_window(len, duration, rng)).collect()
}

/// Every window `start = 0, stride, 2·stride, …` with `start + duration <= len`,
/// ascending by start.
pub fn enumerate_windows(len: usize, duration: usize, stride: usize) -> Vec<(usize, usize)> {
    if len < duration || stride == 0 {
        return vec![];
    }
    (0..=len - duration)
        .step_by(stride)
        .map(|start| (start, start + duration))
        .collect()
}
