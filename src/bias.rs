//! Table-driven bias correction for the raw estimate.

use crate::tables::{BIAS_DATA, RAW_ESTIMATE_DATA, THRESHOLD_DATA};

/// Empirical cutoff below which linear counting beats the bias-corrected
/// raw estimate at precision `p`.
pub(crate) fn threshold(p: u32) -> u64 {
    THRESHOLD_DATA[(p - 4) as usize]
}

/// Bias of the raw estimate `e` at precision `p`, interpolated between the
/// two neighboring tabulated breakpoints and clamped to the endpoints.
pub(crate) fn estimate_bias(e: f64, p: u32) -> f64 {
    let raw_estimates = RAW_ESTIMATE_DATA[(p - 4) as usize];
    let biases = BIAS_DATA[(p - 4) as usize];

    let index = raw_estimates.partition_point(|&r| r < e);
    if index == raw_estimates.len() {
        biases[index - 1]
    } else if index == 0 {
        biases[0]
    } else {
        // Weighted mean of the two neighbors, weighted by the distance to
        // the opposite breakpoint.
        let weight1 = raw_estimates[index] - e;
        let weight2 = e - raw_estimates[index - 1];
        (biases[index] * weight1 + biases[index - 1] * weight2) / (weight1 + weight2)
    }
}
