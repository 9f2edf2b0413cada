//! Bipolar montage: 20 referential probes → 18 chain differences.
//!
//! Each anatomical chain in [`PROBE_GROUPS`] of `n` probes yields `n − 1`
//! channels `x[p_i] − x[p_{i+1}]`.  A bipolar channel is only as trustworthy
//! as its worse electrode, so its mask is the product of both probe masks.
use ndarray::{Array2, Axis};

use crate::constants::{probe_index, NUM_BIPOLAR, PROBE_GROUPS};
use crate::error::{Result, WindowError};

/// `(anode, cathode)` probe column pairs, in output channel order.
pub fn bipolar_pairs() -> Vec<(usize, usize)> {
    PROBE_GROUPS
        .iter()
        .flat_map(|(_, chain)| {
            chain
                .windows(2)
                .map(|w| (probe_index(w[0]), probe_index(w[1])))
        })
        .collect()
}

/// Convert time-major `(T, 20)` probe signals and masks into `(T, 18)`
/// bipolar signals and masks.
pub fn bipolar_montage(signal: &Array2<f32>, mask: &Array2<f32>) -> Result<(Array2<f32>, Array2<f32>)> {
    if signal.dim() != mask.dim() {
        return Err(WindowError::ShapeMismatch(format!(
            "signal {:?} vs mask {:?}",
            signal.dim(),
            mask.dim()
        )));
    }
    let pairs = bipolar_pairs();
    let needed = pairs.iter().map(|&(a, b)| a.max(b)).max().unwrap_or(0) + 1;
    if signal.ncols() < needed {
        return Err(WindowError::InvalidDimension(format!(
            "bipolar montage needs {needed} probe columns, got {}",
            signal.ncols()
        )));
    }

    let n_t = signal.nrows();
    let mut out = Array2::<f32>::zeros((n_t, NUM_BIPOLAR));
    let mut out_mask = Array2::<f32>::zeros((n_t, NUM_BIPOLAR));
    for (k, &(a, b)) in pairs.iter().enumerate() {
        let diff = &signal.column(a) - &signal.column(b);
        out.index_axis_mut(Axis(1), k).assign(&diff);
        let m = &mask.column(a) * &mask.column(b);
        out_mask.index_axis_mut(Axis(1), k).assign(&m);
    }
    Ok((out, out_mask))
}
