//! Input validation and bin-matrix helpers shared by the postprocessor and
//! the stock oracles.
//!
//! Bin matrices are `Array2<usize>` with one row per sample and one column
//! per feature; every entry is a zero-based bin index into the matching
//! feature graph.
use ndarray::{Array1, Array2, ArrayView1, Axis};

use crate::config::FeatureKind;
use crate::error::PostprocessError;

/// Number of class columns shared by every feature graph.
pub(crate) fn class_count(feature_graphs: &[Array2<f64>]) -> Result<usize, PostprocessError> {
    let Some(first) = feature_graphs.first() else {
        return Err(PostprocessError::EmptyFeatureGraphs);
    };
    let n_classes = first.ncols();
    if n_classes == 0 {
        return Err(PostprocessError::NoClasses);
    }
    for (feature, graph) in feature_graphs.iter().enumerate() {
        if graph.ncols() != n_classes {
            return Err(PostprocessError::ClassCountMismatch {
                feature,
                expected: n_classes,
                found: graph.ncols(),
            });
        }
    }
    Ok(n_classes)
}

/// Check that every bin index in `binned` addresses a row of its feature graph.
fn check_bins(binned: &Array2<usize>, feature_graphs: &[Array2<f64>]) -> Result<(), PostprocessError> {
    if binned.ncols() != feature_graphs.len() {
        return Err(PostprocessError::FeatureCountMismatch {
            dataset: binned.ncols(),
            graphs: feature_graphs.len(),
        });
    }
    for (feature, (column, graph)) in binned
        .axis_iter(Axis(1))
        .zip(feature_graphs.iter())
        .enumerate()
    {
        let num_bins = graph.nrows();
        if let Some((row, &bin)) = column.iter().enumerate().find(|&(_, &bin)| bin >= num_bins) {
            return Err(PostprocessError::BinOutOfRange {
                feature,
                row,
                bin,
                num_bins,
            });
        }
    }
    Ok(())
}

/// Validate the postprocessor inputs.
///
/// # Returns
///
/// `(n_samples, n_classes)` when the dataset, graphs and kinds agree with each
/// other, otherwise the first contract violation found.
pub fn validate_inputs(
    binned: &Array2<usize>,
    feature_graphs: &[Array2<f64>],
    feature_kinds: &[FeatureKind],
) -> Result<(usize, usize), PostprocessError> {
    let n_classes = class_count(feature_graphs)?;
    if feature_kinds.len() != feature_graphs.len() {
        return Err(PostprocessError::FeatureKindCountMismatch {
            kinds: feature_kinds.len(),
            graphs: feature_graphs.len(),
        });
    }
    check_bins(binned, feature_graphs)?;
    if binned.nrows() == 0 {
        return Err(PostprocessError::EmptyDataset);
    }
    Ok((binned.nrows(), n_classes))
}

/// Histogram of bin occurrences for one feature column.
///
/// The result has `max(num_bins, max_bin + 1)` entries, so bins that exist in
/// the feature graph but never occur in the data get a count of zero.
pub fn bincount(column: ArrayView1<usize>, num_bins: usize) -> Array1<usize> {
    let len = column
        .iter()
        .max()
        .map_or(num_bins, |&max_bin| num_bins.max(max_bin + 1));
    let mut counts = Array1::<usize>::zeros(len);
    for &bin in column.iter() {
        counts[bin] += 1;
    }
    counts
}

/// Row indices grouped by the bin they fall into, for bins `0..num_bins`.
///
/// Bins past `num_bins` are ignored.
pub fn rows_by_bin(column: ArrayView1<usize>, num_bins: usize) -> Vec<Vec<usize>> {
    let mut groups = vec![Vec::new(); num_bins];
    for (row, &bin) in column.iter().enumerate() {
        if let Some(group) = groups.get_mut(bin) {
            group.push(row);
        }
    }
    groups
}

/// Counterfactual dataset: every sample moved one bin down on `feature`,
/// staying at bin 0 when it is already there.
pub fn shift_down(binned: &Array2<usize>, feature: usize) -> Array2<usize> {
    let mut shifted = binned.clone();
    shifted
        .column_mut(feature)
        .mapv_inplace(|bin| bin.saturating_sub(1));
    shifted
}

pub(crate) fn accumulate_scores(
    binned: &Array2<usize>,
    feature_graphs: &[Array2<f64>],
    intercepts: ArrayView1<f64>,
) -> Array2<f64> {
    let mut scores = Array2::<f64>::zeros((binned.nrows(), intercepts.len()));
    for (mut score, bins) in scores.axis_iter_mut(Axis(0)).zip(binned.axis_iter(Axis(0))) {
        score.assign(&intercepts);
        for (graph, &bin) in feature_graphs.iter().zip(bins.iter()) {
            score += &graph.row(bin);
        }
    }
    scores
}

/// Per-row class scores of an additive model.
///
/// Each row scores `intercepts + sum_i feature_graphs[i][bin_i, ..]`, the raw
/// (pre-softmax) output of the model the graphs describe.
///
/// # Arguments
///
/// * `binned` - Bin matrix, one column per feature graph.
/// * `feature_graphs` - One `(bins, classes)` table per feature.
/// * `intercepts` - Per-class constant added to every row.
///
/// # Returns
///
/// An `(n_samples, n_classes)` score matrix.
pub fn additive_scores(
    binned: &Array2<usize>,
    feature_graphs: &[Array2<f64>],
    intercepts: &Array1<f64>,
) -> Result<Array2<f64>, PostprocessError> {
    let n_classes = class_count(feature_graphs)?;
    if intercepts.len() != n_classes {
        return Err(PostprocessError::InterceptLengthMismatch {
            expected: n_classes,
            found: intercepts.len(),
        });
    }
    check_bins(binned, feature_graphs)?;
    Ok(accumulate_scores(binned, feature_graphs, intercepts.view()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_bincount_pads_to_graph_rows() {
        let column = array![0usize, 2, 2, 1, 2];
        let counts = bincount(column.view(), 5);
        assert_eq!(counts.to_vec(), vec![1, 1, 3, 0, 0]);
    }

    #[test]
    fn test_bincount_grows_past_num_bins() {
        let column = array![3usize, 0];
        let counts = bincount(column.view(), 2);
        assert_eq!(counts.to_vec(), vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_rows_by_bin() {
        let column = array![1usize, 0, 1, 3];
        let groups = rows_by_bin(column.view(), 3);
        assert_eq!(groups, vec![vec![1], vec![0, 2], vec![]]);
    }

    #[test]
    fn test_shift_down_only_touches_one_feature() {
        let binned = array![[0usize, 3], [2, 0], [5, 1]];
        let shifted = shift_down(&binned, 0);
        assert_eq!(shifted, array![[0usize, 3], [1, 0], [4, 1]]);
        // original is untouched
        assert_eq!(binned[(2, 0)], 5);
    }

    #[test]
    fn test_validate_inputs_reports_shape() {
        let binned = array![[0usize, 1], [1, 0], [1, 1]];
        let graphs = vec![Array2::<f64>::zeros((2, 4)), Array2::<f64>::zeros((3, 4))];
        let kinds = [FeatureKind::Numeric, FeatureKind::Categorical];
        assert_eq!(validate_inputs(&binned, &graphs, &kinds), Ok((3, 4)));
    }

    #[test]
    fn test_validate_inputs_rejects_out_of_range_bin() {
        let binned = array![[0usize, 1], [1, 3]];
        let graphs = vec![Array2::<f64>::zeros((2, 2)), Array2::<f64>::zeros((3, 2))];
        let kinds = [FeatureKind::Numeric, FeatureKind::Numeric];
        assert_eq!(
            validate_inputs(&binned, &graphs, &kinds),
            Err(PostprocessError::BinOutOfRange {
                feature: 1,
                row: 1,
                bin: 3,
                num_bins: 3
            })
        );
    }

    #[test]
    fn test_additive_scores_sums_graph_rows() {
        let binned = array![[0usize, 1], [1, 0]];
        let graphs = vec![
            array![[1.0, 0.0], [2.0, 0.5]],
            array![[0.0, 1.0], [4.0, -1.0]],
        ];
        let intercepts = array![0.25, -0.25];
        let scores = additive_scores(&binned, &graphs, &intercepts).unwrap();
        assert_eq!(scores, array![[5.25, -1.25], [2.25, 1.25]]);
    }

    #[test]
    fn test_additive_scores_checks_intercepts() {
        let binned = array![[0usize]];
        let graphs = vec![Array2::<f64>::zeros((1, 3))];
        let err = additive_scores(&binned, &graphs, &Array1::zeros(2)).unwrap_err();
        assert_eq!(
            err,
            PostprocessError::InterceptLengthMismatch {
                expected: 3,
                found: 2
            }
        );
    }
}
