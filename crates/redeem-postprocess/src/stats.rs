use ndarray::{Array1, Array2, ArrayView1, Axis};
use statrs::statistics::Statistics;

/// Weighted sum of `values` divided by `denominator`.
///
/// With bin counts as weights and the sample count as denominator this is the
/// mean effect of a feature graph column over the empirical bin distribution.
/// Bins past the end of `weights` carry no weight.
///
/// # Arguments
///
/// * `values` - One value per bin.
/// * `weights` - Occurrence count per bin.
/// * `denominator` - Total number of samples.
pub fn weighted_mean(values: ArrayView1<f64>, weights: &Array1<usize>, denominator: usize) -> f64 {
    let total: f64 = values
        .iter()
        .zip(weights.iter())
        .map(|(&value, &weight)| value * weight as f64)
        .sum();
    total / denominator as f64
}

/// Per-class weighted mean of a feature graph.
///
/// # Returns
///
/// A vector of length `n_classes`; entry `k` is the amount that has to be
/// subtracted from column `k` so the column averages to zero over the data.
pub fn class_means(graph: &Array2<f64>, counts: &Array1<usize>, n_samples: usize) -> Array1<f64> {
    graph
        .axis_iter(Axis(1))
        .map(|column| weighted_mean(column, counts, n_samples))
        .collect()
}

/// Mean across classes of every bin of a feature graph.
pub fn bin_class_means(graph: &Array2<f64>) -> Array1<f64> {
    graph
        .axis_iter(Axis(0))
        .map(|row| row.iter().mean())
        .collect()
}

/// Largest-magnitude residual whose sign conflicts with the ratio sum.
///
/// Classes are scanned in order; a class qualifies when
/// `new_difference[k] * sum_ratio[k] < 0` and it is strictly larger in
/// magnitude than the current pick, so ties keep the earliest class. NaN
/// products never qualify. Returns 0 when no class qualifies.
pub fn back_change(new_difference: &Array1<f64>, sum_ratio: &Array1<f64>) -> f64 {
    let mut back_change = 0.0f64;
    for (&residual, &ratio) in new_difference.iter().zip(sum_ratio.iter()) {
        if residual * ratio < 0.0 && back_change.abs() < residual.abs() {
            back_change = residual;
        }
    }
    back_change
}
