//! Padding policy: grow one axis of an array to a target length.
//!
//! Two ways of choosing the target:
//!
//! - [`PadTarget::Exact`]      `pad = max(0, n − L)` (window normalisation)
//! - [`PadTarget::MultipleOf`] round `L` up to the next multiple of `n`
//!
//! The pad is placed according to [`Anchor`] and filled according to
//! [`FillMode`].  Reflect filling follows numpy's `mode="reflect"`: the edge
//! sample is not repeated and pads longer than the data keep bouncing
//! between the two ends.
use std::str::FromStr;

use ndarray::{Array, ArrayBase, Array2, Axis, Data, Dimension, RemoveAxis};
use serde::Deserialize;

use crate::error::{Result, WindowError};

/// How the target length along the padded axis is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadTarget {
    /// At least `n` samples; longer inputs pass through untouched.
    Exact(usize),
    /// Smallest multiple of `n` that is `>= L`.
    MultipleOf(usize),
}

impl PadTarget {
    /// Output length for an input of length `len`.
    pub fn resolve(self, len: usize) -> Result<usize> {
        match self {
            PadTarget::Exact(n) => Ok(len.max(n)),
            PadTarget::MultipleOf(0) => Err(WindowError::InvalidDimension(
                "pad multiple must be > 0".into(),
            )),
            PadTarget::MultipleOf(n) => Ok(len.div_ceil(n) * n),
        }
    }
}

/// Where the padding goes relative to the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// All padding before the data.
    Left,
    /// All padding after the data.
    #[default]
    Right,
    /// Split evenly; an odd remainder goes after the data.
    Center,
}

impl Anchor {
    /// `(before, after)` split of `amount`.
    pub fn split(self, amount: usize) -> (usize, usize) {
        match self {
            Anchor::Left => (amount, 0),
            Anchor::Right => (0, amount),
            Anchor::Center => (amount / 2, amount - amount / 2),
        }
    }
}

impl FromStr for Anchor {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(Anchor::Left),
            "right" => Ok(Anchor::Right),
            "center" => Ok(Anchor::Center),
            other => Err(WindowError::UnsupportedAnchor(other.to_string())),
        }
    }
}

/// What the padded region is filled with.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum FillMode {
    /// Mirror the data about its edges (edge sample excluded).
    Reflect,
    /// A fixed value.
    Constant(f32),
}

impl Default for FillMode {
    fn default() -> Self {
        FillMode::Constant(0.0)
    }
}

impl FillMode {
    /// Parse a fill mode by name; `value` is only used for `"constant"`.
    pub fn from_name(name: &str, value: f32) -> Result<Self> {
        match name {
            "reflect" => Ok(FillMode::Reflect),
            "constant" => Ok(FillMode::Constant(value)),
            other => Err(WindowError::UnsupportedFillMode(other.to_string())),
        }
    }
}

/// Map a virtual index (possibly outside `0..len`) onto the data with numpy
/// reflect semantics.
pub fn reflect_index(virtual_idx: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = virtual_idx.rem_euclid(period);
    if m >= len as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Pad `array` along `axis` up to `target`.
///
/// Every other axis is left unchanged and the data keeps its order; only the
/// position of the padding depends on `anchor`.
///
/// # Errors
///
/// * [`WindowError::InvalidDimension`] when `axis` is out of range, when a
///   `MultipleOf(0)` target is given, or when reflect-padding an empty axis.
pub fn pad<S, D>(
    array: &ArrayBase<S, D>,
    target: PadTarget,
    axis: usize,
    anchor: Anchor,
    fill: FillMode,
) -> Result<Array<f32, D>>
where
    S: Data<Elem = f32>,
    D: Dimension + RemoveAxis,
{
    if axis >= array.ndim() {
        return Err(WindowError::InvalidDimension(format!(
            "axis {axis} out of range for {}-d array",
            array.ndim()
        )));
    }
    let len = array.len_of(Axis(axis));
    let out_len = target.resolve(len)?;
    if out_len == len {
        return Ok(array.to_owned());
    }
    if len == 0 && fill == FillMode::Reflect {
        return Err(WindowError::InvalidDimension(format!(
            "cannot reflect-pad empty axis {axis}"
        )));
    }

    let (before, _after) = anchor.split(out_len - len);

    let mut dim = array.raw_dim();
    dim[axis] = out_len;
    let fill_value = match fill {
        FillMode::Constant(v) => v,
        FillMode::Reflect => 0.0,
    };
    let mut out = Array::from_elem(dim, fill_value);

    for i in 0..out_len {
        let v = i as isize - before as isize;
        let src = if v >= 0 && (v as usize) < len {
            v as usize
        } else {
            match fill {
                FillMode::Constant(_) => continue,
                FillMode::Reflect => reflect_index(v, len),
            }
        };
        out.index_axis_mut(Axis(axis), i)
            .assign(&array.index_axis(Axis(axis), src));
    }
    Ok(out)
}

/// Pad a time-major `(T, C)` array along time.
pub fn pad_time_axis(
    data: &Array2<f32>,
    target: PadTarget,
    anchor: Anchor,
    fill: FillMode,
) -> Result<Array2<f32>> {
    pad(data, target, 0, anchor, fill)
}
