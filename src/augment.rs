//! Train-time channel augmentations on time-major `(T, 20)` probe arrays.
//!
//! Every augmentation touches the signal and its mask identically, and draws
//! randomness only from the generator it is handed.
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::constants::{probe_index, CENTRAL_PROBES, FR_PAIRS, LR_PAIRS};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelAugment {
    /// Mirror left and right hemispheres.
    SwapLr,
    /// Mirror front and rear.
    SwapFr,
    /// Shuffle the left/right pair list (same order on both sides) and the
    /// midline probes independently.
    ChannelPermutation,
    /// Zero `floor(C · rate)` random channels.
    ChannelDrop { rate: f32 },
}

/// An augmentation applied with probability `p`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Augmentation {
    #[serde(flatten)]
    pub kind: ChannelAugment,
    #[serde(default = "default_p")]
    pub p: f64,
}

fn default_p() -> f64 {
    0.5
}

impl Augmentation {
    pub fn new(kind: ChannelAugment, p: f64) -> Self {
        Self { kind, p }
    }

    /// Apply in place with probability `p`; returns whether it fired.
    pub fn maybe_apply<R: Rng>(&self, signal: &mut Array2<f32>, mask: &mut Array2<f32>, rng: &mut R) -> bool {
        if rng.random::<f64>() >= self.p {
            return false;
        }
        self.kind.apply(signal, mask, rng);
        true
    }
}

impl ChannelAugment {
    pub fn apply<R: Rng>(&self, signal: &mut Array2<f32>, mask: &mut Array2<f32>, rng: &mut R) {
        match *self {
            ChannelAugment::SwapLr => {
                swap_pairs(signal, &LR_PAIRS);
                swap_pairs(mask, &LR_PAIRS);
            }
            ChannelAugment::SwapFr => {
                swap_pairs(signal, &FR_PAIRS);
                swap_pairs(mask, &FR_PAIRS);
            }
            ChannelAugment::ChannelPermutation => channel_permutation(signal, mask, rng),
            ChannelAugment::ChannelDrop { rate } => channel_drop(signal, mask, rate, rng),
        }
    }
}

fn swap_columns(x: &mut Array2<f32>, a: usize, b: usize) {
    let tmp = x.column(a).to_owned();
    let src = x.column(b).to_owned();
    x.column_mut(a).assign(&src);
    x.column_mut(b).assign(&tmp);
}

/// Swap each named probe pair.
pub fn swap_pairs(x: &mut Array2<f32>, pairs: &[(&str, &str)]) {
    for &(a, b) in pairs {
        swap_columns(x, probe_index(a), probe_index(b));
    }
}

/// `x[:, dst[i]] = old x[:, dst[perm[i]]]`.
fn permute_columns(x: &mut Array2<f32>, dst: &[usize], perm: &[usize]) {
    let src_cols: Vec<usize> = perm.iter().map(|&p| dst[p]).collect();
    let src = x.select(Axis(1), &src_cols);
    for (i, &d) in dst.iter().enumerate() {
        x.column_mut(d).assign(&src.column(i));
    }
}

pub fn channel_permutation<R: Rng>(signal: &mut Array2<f32>, mask: &mut Array2<f32>, rng: &mut R) {
    let left: Vec<usize> = LR_PAIRS.iter().map(|(l, _)| probe_index(l)).collect();
    let right: Vec<usize> = LR_PAIRS.iter().map(|(_, r)| probe_index(r)).collect();

    let mut perm: Vec<usize> = (0..left.len()).collect();
    perm.shuffle(rng);
    for x in [&mut *signal, &mut *mask] {
        permute_columns(x, &left, &perm);
        permute_columns(x, &right, &perm);
    }

    let central: Vec<usize> = CENTRAL_PROBES.iter().map(|p| probe_index(p)).collect();
    let mut perm: Vec<usize> = (0..central.len()).collect();
    perm.shuffle(rng);
    for x in [signal, mask] {
        permute_columns(x, &central, &perm);
    }
}

pub fn channel_drop<R: Rng>(signal: &mut Array2<f32>, mask: &mut Array2<f32>, rate: f32, rng: &mut R) {
    let n_ch = signal.ncols();
    let mut order: Vec<usize> = (0..n_ch).collect();
    order.shuffle(rng);
    let n_drop = (n_ch as f32 * rate) as usize;
    for &c in &order[..n_drop.min(n_ch)] {
        signal.column_mut(c).fill(0.0);
        mask.column_mut(c).fill(0.0);
    }
}
