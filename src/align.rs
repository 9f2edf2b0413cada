//! Dual-rate alignment between the EEG time base and the spectrogram time base.
//!
//! Offsets are stored in seconds.  A window in the target modality is
//!
//! ```text
//! start = floor(offset_sec   × target_rate)
//! end   = start + floor(duration_sec × target_rate)
//! ```
//!
//! and, when wider than `crop_to`, is trimmed symmetrically
//! (`left = excess / 2`, `right = excess − left`).  Narrower windows are
//! returned as-is: padding them is the caller's job.
use std::ops::Range;

use crate::error::{Result, WindowError};

/// Resolved window in the target modality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// First target frame of the uncropped window.
    pub start: usize,
    /// Exclusive end of the uncropped window.
    pub end: usize,
    /// Crop relative to `start`.
    pub crop: Range<usize>,
}

impl Alignment {
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    /// Crop in target-record coordinates.
    pub fn absolute_crop(&self) -> Range<usize> {
        self.start + self.crop.start..self.start + self.crop.end
    }
}

/// Maps second offsets onto frames of one modality and crops to a fixed width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DualRateAligner {
    /// Sampling rate of the target modality in Hz.
    pub target_rate: f64,
    /// Window duration in seconds.
    pub duration_sec: f64,
    /// Exact width after cropping.
    pub crop_to: usize,
}

impl DualRateAligner {
    pub fn new(target_rate: f64, duration_sec: f64, crop_to: usize) -> Self {
        Self { target_rate, duration_sec, crop_to }
    }

    /// Frame index of `seconds` in the target modality (truncating).
    pub fn frame_of(&self, seconds: f64) -> Result<usize> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(WindowError::InvalidOffset(seconds));
        }
        Ok((seconds * self.target_rate) as usize)
    }

    /// Uncropped window width in target frames.
    pub fn window_frames(&self) -> usize {
        (self.duration_sec * self.target_rate) as usize
    }

    /// Align a window starting `offset_sec` seconds into the record.
    ///
    /// # Errors
    ///
    /// * [`WindowError::InvalidOffset`] for negative or non-finite offsets.
    /// * [`WindowError::CropSizeMismatch`] if cropping does not land on
    ///   exactly `crop_to` frames.
    pub fn align(&self, offset_sec: f64) -> Result<Alignment> {
        let start = self.frame_of(offset_sec)?;
        let width = self.window_frames();
        let end = start + width;

        if width <= self.crop_to {
            return Ok(Alignment { start, end, crop: 0..width });
        }

        let excess = width - self.crop_to;
        let left = excess / 2;
        let right = excess - left;
        let crop = left..width - right;
        if crop.len() != self.crop_to {
            return Err(WindowError::CropSizeMismatch {
                width,
                got: crop.len(),
                expected: self.crop_to,
            });
        }
        Ok(Alignment { start, end, crop })
    }

    /// Align a window given as a frame offset in another modality sampled at
    /// `source_rate` Hz.
    pub fn align_frame(&self, source_frame: usize, source_rate: f64) -> Result<Alignment> {
        if source_rate <= 0.0 || !source_rate.is_finite() {
            return Err(WindowError::InvalidDimension(format!(
                "source rate must be positive, got {source_rate}"
            )));
        }
        self.align(source_frame as f64 / source_rate)
    }
}
