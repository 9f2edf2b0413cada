//! Per-channel-group aggregation of spectrogram-like `(B, C, F, T)` tensors.
//!
//! The 18 bipolar channels are partitioned into 5 contiguous anatomical
//! groups (`[0,4,8,10,14,18]` → LL, LP, Z, RP, RL).  An [`Aggregator`]
//! collapses them with one of:
//!
//! - weighted mean:  `Σ(x·m) / (Σm + ε)` per group, output mask `Σm`
//! - tiling:         each group's channels stacked along F, zero-padded to the
//!   largest group → `(B, 5, max·F, T)`
//! - flat tiling:    every channel stacked along F → `(B, 1, C·F, T)`
//!
//! With `stereo` set the 5 groups are then split into a left triple
//! `(LL, LP, Z)` and a right triple `(RL, RP, Z)` stacked along the batch
//! axis, so one encoder sees both hemispheres as independent items.
//!
//! The F × T extent is never changed by the weighted mean; tiling only
//! stacks along F.
//!
//! [`EegCollator`] does the analogous left/right stacking for raw
//! `(B, 18, T)` bipolar signals before any spectrogram exists.
use std::ops::Range;

use ndarray::{concatenate, s, Array3, Array4, ArrayView4, Axis};
use serde::Deserialize;

use crate::constants::BIPOLAR_GROUP_BOUNDS;
use crate::error::{Result, WindowError};

/// Contiguous channel partition given by boundary indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelGroups {
    bounds: Vec<usize>,
}

impl Default for ChannelGroups {
    fn default() -> Self {
        Self { bounds: BIPOLAR_GROUP_BOUNDS.to_vec() }
    }
}

impl ChannelGroups {
    /// `bounds` must start at 0 and be strictly increasing.
    pub fn new(bounds: Vec<usize>) -> Result<Self> {
        if bounds.len() < 2 || bounds[0] != 0 || bounds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(WindowError::InvalidDimension(format!(
                "channel group bounds must start at 0 and strictly increase, got {bounds:?}"
            )));
        }
        Ok(Self { bounds })
    }

    pub fn num_groups(&self) -> usize {
        self.bounds.len() - 1
    }

    /// Channels covered by the partition.
    pub fn num_channels(&self) -> usize {
        self.bounds[self.bounds.len() - 1]
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.bounds.windows(2).map(|w| w[0]..w[1])
    }

    pub fn max_group_size(&self) -> usize {
        self.ranges().map(|r| r.len()).max().unwrap_or(0)
    }

    fn check_channels(&self, n_ch: usize) -> Result<()> {
        if n_ch < self.num_channels() {
            return Err(WindowError::InvalidDimension(format!(
                "{n_ch} channels, groups need {}",
                self.num_channels()
            )));
        }
        Ok(())
    }

    fn check_five(&self) -> Result<()> {
        if self.num_groups() != 5 {
            return Err(WindowError::InvalidDimension(format!(
                "left/right stacking needs 5 groups, got {}",
                self.num_groups()
            )));
        }
        Ok(())
    }
}

/// How a channel group is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationStrategy {
    WeightedMean { eps: f32 },
    Tiling,
    FlatTiling,
}

impl Default for AggregationStrategy {
    fn default() -> Self {
        AggregationStrategy::WeightedMean { eps: 1e-4 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    pub strategy: AggregationStrategy,
    pub groups: ChannelGroups,
    /// Split into left/right triples along the batch axis.
    pub stereo: bool,
}

impl Aggregator {
    pub fn new(strategy: AggregationStrategy, stereo: bool) -> Self {
        Self { strategy, groups: ChannelGroups::default(), stereo }
    }

    /// Aggregate `spec` `(B, C, F, T)` with `mask` of the same shape or with
    /// a singleton F axis.
    ///
    /// # Errors
    ///
    /// * [`WindowError::ShapeMismatch`] when the mask cannot be broadcast.
    /// * [`WindowError::InvalidDimension`] when there are fewer channels than
    ///   the groups cover, or stereo is requested without exactly 5 groups.
    pub fn aggregate(&self, spec: &Array4<f32>, mask: &Array4<f32>) -> Result<(Array4<f32>, Array4<f32>)> {
        self.groups.check_channels(spec.shape()[1])?;
        let mask = broadcast_mask(spec, mask)?;

        let (spec, mask) = match self.strategy {
            AggregationStrategy::WeightedMean { eps } => weighted_mean(spec, mask, &self.groups, eps),
            AggregationStrategy::Tiling => tile(spec, mask, &self.groups),
            AggregationStrategy::FlatTiling => flat_tile(spec, mask),
        };

        if self.stereo {
            collate_lr(&spec, &mask)
        } else {
            Ok((spec, mask))
        }
    }
}

fn broadcast_mask<'a>(spec: &Array4<f32>, mask: &'a Array4<f32>) -> Result<ArrayView4<'a, f32>> {
    mask.broadcast(spec.raw_dim()).ok_or_else(|| {
        WindowError::ShapeMismatch(format!(
            "mask {:?} does not broadcast to {:?}",
            mask.shape(),
            spec.shape()
        ))
    })
}

fn weighted_mean(
    spec: &Array4<f32>,
    mask: ArrayView4<f32>,
    groups: &ChannelGroups,
    eps: f32,
) -> (Array4<f32>, Array4<f32>) {
    let (b, _c, f, t) = spec.dim();
    let g = groups.num_groups();
    let mut out = Array4::<f32>::zeros((b, g, f, t));
    let mut out_mask = Array4::<f32>::zeros((b, g, f, t));

    for (gi, r) in groups.ranges().enumerate() {
        let x = spec.slice(s![.., r.clone(), .., ..]);
        let m = mask.slice(s![.., r, .., ..]);
        let num = (&x * &m).sum_axis(Axis(1));
        let den = m.sum_axis(Axis(1));
        out.slice_mut(s![.., gi, .., ..])
            .assign(&(num / den.mapv(|v| v + eps)));
        out_mask.slice_mut(s![.., gi, .., ..]).assign(&den);
    }
    (out, out_mask)
}

fn tile(spec: &Array4<f32>, mask: ArrayView4<f32>, groups: &ChannelGroups) -> (Array4<f32>, Array4<f32>) {
    let (b, _c, f, t) = spec.dim();
    let height = groups.max_group_size() * f;
    let mut out = Array4::<f32>::zeros((b, groups.num_groups(), height, t));
    let mut out_mask = Array4::<f32>::zeros((b, groups.num_groups(), height, t));

    for (gi, r) in groups.ranges().enumerate() {
        for (k, c) in r.enumerate() {
            let rows = k * f..(k + 1) * f;
            out.slice_mut(s![.., gi, rows.clone(), ..])
                .assign(&spec.slice(s![.., c, .., ..]));
            out_mask.slice_mut(s![.., gi, rows, ..])
                .assign(&mask.slice(s![.., c, .., ..]));
        }
    }
    (out, out_mask)
}

fn flat_tile(spec: &Array4<f32>, mask: ArrayView4<f32>) -> (Array4<f32>, Array4<f32>) {
    let (b, c, f, t) = spec.dim();
    let mut out = Array4::<f32>::zeros((b, 1, c * f, t));
    let mut out_mask = Array4::<f32>::zeros((b, 1, c * f, t));
    for ch in 0..c {
        out.slice_mut(s![.., 0, ch * f..(ch + 1) * f, ..])
            .assign(&spec.slice(s![.., ch, .., ..]));
        out_mask.slice_mut(s![.., 0, ch * f..(ch + 1) * f, ..])
            .assign(&mask.slice(s![.., ch, .., ..]));
    }
    (out, out_mask)
}

/// Stack the left `(0, 1, 2)` and right `(4, 3, 2)` group triples of a
/// 5-group tensor along the batch axis: `(B, 5, F, T)` → `(2B, 3, F, T)`.
pub fn collate_lr(spec: &Array4<f32>, mask: &Array4<f32>) -> Result<(Array4<f32>, Array4<f32>)> {
    if spec.shape()[1] != 5 || mask.shape() != spec.shape() {
        return Err(WindowError::InvalidDimension(format!(
            "left/right collation needs matching (B, 5, F, T) inputs, got {:?} and {:?}",
            spec.shape(),
            mask.shape()
        )));
    }
    Ok((stack_lr4(spec)?, stack_lr4(mask)?))
}

fn stack_lr4(x: &Array4<f32>) -> Result<Array4<f32>> {
    let left = x.select(Axis(1), &[0, 1, 2]);
    let right = x.select(Axis(1), &[4, 3, 2]);
    concatenate(Axis(0), &[left.view(), right.view()])
        .map_err(|e| WindowError::ShapeMismatch(e.to_string()))
}

// ── Raw-signal left/right stacking ───────────────────────────────────────────

/// Left/right stacking of bipolar `(B, 18, T)` signals and their masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EegCollator {
    /// `(B, 18, T)` → `(2B, 10, T)`, or `(2B, 8, T)` with `drop_z`.
    DualStacking { drop_z: bool },
    /// Every channel of every side becomes its own item: `(2·C'·B, 1, T)`,
    /// ordered side-major, then channel, then batch.
    DualPerChannel { drop_z: bool },
}

impl EegCollator {
    pub fn apply(&self, eeg: &Array3<f32>, mask: &Array3<f32>) -> Result<(Array3<f32>, Array3<f32>)> {
        if eeg.shape() != mask.shape() {
            return Err(WindowError::ShapeMismatch(format!(
                "signal {:?} vs mask {:?}",
                eeg.shape(),
                mask.shape()
            )));
        }
        let groups = ChannelGroups::default();
        match *self {
            EegCollator::DualStacking { drop_z } => Ok((
                dual_stack_channels(eeg, &groups, drop_z)?,
                dual_stack_channels(mask, &groups, drop_z)?,
            )),
            EegCollator::DualPerChannel { drop_z } => Ok((
                per_channel_stack(eeg, &groups, drop_z)?,
                per_channel_stack(mask, &groups, drop_z)?,
            )),
        }
    }
}

/// Left `[LL, LP, Z]` and right `[RL, RP, Z]` channel blocks stacked along
/// the batch axis: `(B, C, T)` → `(2B, C', T)`.
pub fn dual_stack_channels(x: &Array3<f32>, groups: &ChannelGroups, drop_z: bool) -> Result<Array3<f32>> {
    groups.check_five()?;
    groups.check_channels(x.shape()[1])?;
    let (left, right) = side_channels(groups, drop_z);
    let l = x.select(Axis(1), &left);
    let r = x.select(Axis(1), &right);
    concatenate(Axis(0), &[l.view(), r.view()]).map_err(|e| WindowError::ShapeMismatch(e.to_string()))
}

/// Like [`dual_stack_channels`] but every channel becomes a separate item.
pub fn per_channel_stack(x: &Array3<f32>, groups: &ChannelGroups, drop_z: bool) -> Result<Array3<f32>> {
    groups.check_five()?;
    groups.check_channels(x.shape()[1])?;
    let (b, _c, t) = x.dim();
    let (left, right) = side_channels(groups, drop_z);
    let per_side = left.len();
    let mut out = Array3::<f32>::zeros((2 * per_side * b, 1, t));
    for (d, side) in [left, right].iter().enumerate() {
        for (k, &ch) in side.iter().enumerate() {
            for bi in 0..b {
                let idx = (d * per_side + k) * b + bi;
                out.slice_mut(s![idx, 0, ..]).assign(&x.slice(s![bi, ch, ..]));
            }
        }
    }
    Ok(out)
}

fn side_channels(groups: &ChannelGroups, drop_z: bool) -> (Vec<usize>, Vec<usize>) {
    let r: Vec<Range<usize>> = groups.ranges().collect();
    let mut left: Vec<usize> = r[0].clone().chain(r[1].clone()).collect();
    let mut right: Vec<usize> = r[4].clone().chain(r[3].clone()).collect();
    if !drop_z {
        left.extend(r[2].clone());
        right.extend(r[2].clone());
    }
    (left, right)
}
