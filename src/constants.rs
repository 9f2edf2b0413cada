//! Fixed label set, probe ordering and anatomical channel groups.
//!
//! Signal records are time-major `(T, 20)` arrays whose columns follow
//! [`PROBES`]; the last column is the EKG reference and never enters a
//! bipolar chain.

/// Classification targets, in model output order.
pub const LABELS: [&str; 6] = ["seizure", "lpd", "gpd", "lrda", "grda", "other"];

/// Number of classes in a label vector.
pub const NUM_CLASSES: usize = LABELS.len();

/// Canonical probe ordering of a signal record.
pub const PROBES: [&str; 20] = [
    "Fp1", "F3", "C3", "P3", "F7", "T3", "T5", "O1",
    "Fz", "Cz", "Pz",
    "Fp2", "F4", "C4", "P4", "F8", "T4", "T6", "O2",
    "EKG",
];

/// Number of probes in a signal record (EEG + EKG).
pub const NUM_PROBES: usize = PROBES.len();

/// Number of EEG probes (everything but the trailing EKG channel).
pub const NUM_EEG_PROBES: usize = NUM_PROBES - 1;

/// Anatomical probe chains, in bipolar-montage order:
/// left lateral, left parasagittal, midline, right parasagittal, right lateral.
pub const PROBE_GROUPS: [(&str, &[&str]); 5] = [
    ("LL", &["Fp1", "F7", "T3", "T5", "O1"]),
    ("LP", &["Fp1", "F3", "C3", "P3", "O1"]),
    ("Z", &["Fz", "Cz", "Pz"]),
    ("RP", &["Fp2", "F4", "C4", "P4", "O2"]),
    ("RL", &["Fp2", "F8", "T4", "T6", "O2"]),
];

/// Group boundaries over the 18 bipolar channels produced from [`PROBE_GROUPS`].
pub const BIPOLAR_GROUP_BOUNDS: [usize; 6] = [0, 4, 8, 10, 14, 18];

/// Number of bipolar channels.
pub const NUM_BIPOLAR: usize = 18;

/// Left/right mirrored probe pairs.
pub const LR_PAIRS: [(&str, &str); 8] = [
    ("Fp1", "Fp2"),
    ("F3", "F4"),
    ("C3", "C4"),
    ("P3", "P4"),
    ("F7", "F8"),
    ("T3", "T4"),
    ("T5", "T6"),
    ("O1", "O2"),
];

/// Front/rear mirrored probe pairs.
pub const FR_PAIRS: [(&str, &str); 7] = [
    ("Fp1", "O1"),
    ("Fp2", "O2"),
    ("F7", "T5"),
    ("F3", "P3"),
    ("Fz", "Pz"),
    ("F4", "P4"),
    ("F8", "T6"),
];

/// Midline probes.
pub const CENTRAL_PROBES: [&str; 3] = ["Fz", "Cz", "Pz"];

/// Column index of `name` in [`PROBES`].
///
/// Panics on an unknown name: every caller passes one of the constants above.
pub fn probe_index(name: &str) -> usize {
    PROBES
        .iter()
        .position(|p| *p == name)
        .unwrap_or_else(|| panic!("unknown probe {name}"))
}
