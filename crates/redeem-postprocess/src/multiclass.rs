//! Postprocessing of additive multiclass feature graphs.
//!
//! Two adjustments are applied to a trained model's per-feature tables:
//!
//! * numeric features are smoothed bin by bin: the step between neighbouring
//!   bins is replaced by its cross-class mean, unless one class disagrees in
//!   sign with how the model's probabilities react to moving a sample one bin
//!   down, in which case the largest such disagreement is added back;
//! * every feature is centered so each class column has zero weighted mean
//!   over the training bins, and the removed mass is moved into intercepts.
use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use statrs::statistics::Statistics;

use crate::config::{FeatureKind, PostprocessConfig};
use crate::data_handling::{bincount, rows_by_bin, shift_down, validate_inputs};
use crate::error::PostprocessError;
use crate::oracle::ProbabilityOracle;
use crate::stats::{back_change, class_means};

/// Adjusted feature graphs and the per-class intercepts extracted from them.
#[derive(Debug, Clone, PartialEq)]
pub struct Postprocessed {
    /// Same order and shapes as the input graphs.
    pub feature_graphs: Vec<Array2<f64>>,
    /// One entry per class.
    pub intercepts: Array1<f64>,
}

/// Postprocess feature graphs with the default [`PostprocessConfig`].
///
/// See [`postprocess_with_config`].
pub fn postprocess<O>(
    binned: &Array2<usize>,
    feature_graphs: &[Array2<f64>],
    oracle: &O,
    feature_kinds: &[FeatureKind],
) -> Result<Postprocessed, PostprocessError>
where
    O: ProbabilityOracle + ?Sized,
{
    postprocess_with_config(
        binned,
        feature_graphs,
        oracle,
        feature_kinds,
        &PostprocessConfig::default(),
    )
}

/// Smooth numeric features and center all feature graphs.
///
/// The input graphs are cloned before any change, so the caller's model is
/// left untouched.
///
/// # Arguments
///
/// * `binned` - Training data as bin indices, `(n_samples, n_features)`.
/// * `feature_graphs` - One `(bins, n_classes)` table per feature.
/// * `oracle` - Class probabilities of the trained model for a bin matrix.
/// * `feature_kinds` - Numeric or categorical, one per feature.
/// * `config` - Execution options.
///
/// # Returns
///
/// The adjusted graphs plus an intercept vector of length `n_classes`, or the
/// first shape violation found in the inputs or in the oracle's output.
///
/// A probability of exactly zero makes the ratio used for smoothing infinite
/// or NaN. This is not treated as an error: a NaN ratio sum never triggers a
/// back change for that class.
pub fn postprocess_with_config<O>(
    binned: &Array2<usize>,
    feature_graphs: &[Array2<f64>],
    oracle: &O,
    feature_kinds: &[FeatureKind],
    config: &PostprocessConfig,
) -> Result<Postprocessed, PostprocessError>
where
    O: ProbabilityOracle + ?Sized,
{
    let (n_samples, n_classes) = validate_inputs(binned, feature_graphs, feature_kinds)?;
    info!(
        "Postprocessing {} feature graphs over {} samples and {} classes using the {} oracle",
        feature_graphs.len(),
        n_samples,
        n_classes,
        oracle.name()
    );

    let predprob = predict_checked(oracle, binned, n_classes)?;
    let predprob_prev = counterfactual_probabilities(
        oracle,
        binned,
        n_classes,
        config.parallel_counterfactuals,
    )?;

    let mut adjusted = feature_graphs.to_vec();
    let mut intercepts = Array1::<f64>::zeros(n_classes);

    for (feature, graph) in adjusted.iter_mut().enumerate() {
        let column = binned.column(feature);
        let counts = bincount(column, graph.nrows());

        if feature_kinds[feature].is_numeric() {
            let (change, non_finite) = smoothing_changes(
                column,
                &feature_graphs[feature],
                &predprob,
                &predprob_prev[feature],
            );
            if non_finite > 0 && config.warn_non_finite {
                warn!(
                    "Feature {}: {} probability ratio sums are not finite (zero probabilities); \
                     the affected classes never trigger a back change",
                    feature, non_finite
                );
            }
            for (mut row, &shift) in graph.axis_iter_mut(Axis(0)).zip(change.iter()) {
                row -= shift;
            }
        }

        let means = class_means(graph, &counts, n_samples);
        for (mut class_column, &mean) in graph.axis_iter_mut(Axis(1)).zip(means.iter()) {
            class_column -= mean;
        }
        intercepts += &means;

        debug!(
            "Feature {} ({}, {} bins): moved {} into the intercepts",
            feature,
            feature_kinds[feature],
            graph.nrows(),
            means
        );
    }

    Ok(Postprocessed {
        feature_graphs: adjusted,
        intercepts,
    })
}

fn predict_checked<O>(
    oracle: &O,
    binned: &Array2<usize>,
    n_classes: usize,
) -> Result<Array2<f64>, PostprocessError>
where
    O: ProbabilityOracle + ?Sized,
{
    let probs = oracle.predict_proba(binned);
    let expected = (binned.nrows(), n_classes);
    if probs.dim() != expected {
        return Err(PostprocessError::OracleShape {
            expected,
            found: probs.dim(),
        });
    }
    Ok(probs)
}

/// Predictions with each feature in turn moved one bin down.
///
/// Entry `i` holds the oracle's output for the dataset with column `i`
/// shifted; the features are independent so they may run in parallel.
fn counterfactual_probabilities<O>(
    oracle: &O,
    binned: &Array2<usize>,
    n_classes: usize,
    parallel: bool,
) -> Result<Vec<Array2<f64>>, PostprocessError>
where
    O: ProbabilityOracle + ?Sized,
{
    let predict_shifted =
        |feature: usize| predict_checked(oracle, &shift_down(binned, feature), n_classes);

    if parallel {
        (0..binned.ncols())
            .into_par_iter()
            .map(predict_shifted)
            .collect()
    } else {
        (0..binned.ncols()).map(predict_shifted).collect()
    }
}

/// Per-bin shift applied to every class of a numeric feature graph.
///
/// `change[0]` is always 0. For `v >= 1` the change is a left fold over the
/// bins: the step `graph[v] - graph[v - 1] + change[v - 1]` is averaged over
/// classes, and the single largest residual that conflicts in sign with the
/// summed probability ratios of the samples in bin `v` is added back.
///
/// # Returns
///
/// The change vector (one entry per bin of `graph`) and the number of
/// non-finite ratio sums encountered.
fn smoothing_changes(
    column: ArrayView1<usize>,
    graph: &Array2<f64>,
    predprob: &Array2<f64>,
    predprob_prev: &Array2<f64>,
) -> (Array1<f64>, usize) {
    let num_bins = graph.nrows();
    let n_classes = graph.ncols();
    let groups = rows_by_bin(column, num_bins);

    let mut change = Array1::<f64>::zeros(num_bins);
    let mut non_finite = 0;

    for v in 1..num_bins {
        let mut sum_ratio = Array1::<f64>::zeros(n_classes);
        for &row in &groups[v] {
            for k in 0..n_classes {
                sum_ratio[k] += predprob[(row, k)] / predprob_prev[(row, k)] - 1.0;
            }
        }
        non_finite += sum_ratio.iter().filter(|ratio| !ratio.is_finite()).count();

        let difference = &graph.row(v) - &graph.row(v - 1) + change[v - 1];
        let mean_step = difference.iter().mean();
        let new_difference = &difference - mean_step;

        change[v] = mean_step + back_change(&new_difference, &sum_ratio);
    }

    (change, non_finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::UniformOracle;
    use ndarray::array;

    fn toy_graph() -> Array2<f64> {
        array![[0.0, 0.0], [1.0, 3.0], [2.0, 2.0]]
    }

    #[test]
    fn test_smoothing_changes_uniform_oracle_is_mean_step() {
        let binned = array![[0usize], [1], [2], [2]];
        let probs = UniformOracle::new(2).predict_proba(&binned);
        let (change, non_finite) = smoothing_changes(binned.column(0), &toy_graph(), &probs, &probs);
        assert_eq!(change, array![0.0, 2.0, 2.0]);
        assert_eq!(non_finite, 0);
    }

    #[test]
    fn test_postprocess_numeric_by_hand() {
        let binned = array![[0usize], [1], [2], [2]];
        let graphs = vec![toy_graph()];
        let result = postprocess(
            &binned,
            &graphs,
            &UniformOracle::new(2),
            &[FeatureKind::Numeric],
        )
        .unwrap();

        // smoothed graph is [[0, 0], [-1, 1], [0, 0]], column means are -0.25 and 0.25
        assert_eq!(
            result.feature_graphs[0],
            array![[0.25, -0.25], [-0.75, 0.75], [0.25, -0.25]]
        );
        assert_eq!(result.intercepts, array![-0.25, 0.25]);
    }

    #[test]
    fn test_postprocess_back_change_follows_ratio_sign() {
        // class 0 probability per bin of the single feature
        let class0 = [0.5, 0.8, 0.4];
        let oracle = move |binned: &Array2<usize>| {
            Array2::from_shape_fn((binned.nrows(), 2), |(row, class)| {
                let p = class0[binned[(row, 0)]];
                if class == 0 {
                    p
                } else {
                    1.0 - p
                }
            })
        };
        let binned = array![[0usize], [1], [2], [2]];
        let probs = oracle.predict_proba(&binned);
        let probs_prev = oracle.predict_proba(&shift_down(&binned, 0));

        // bin 1: residuals [-1, 1] against ratio sums [0.6, -0.6], class 0 wins the tie
        // bin 2: residuals [1, -1] against ratio sums [-1, 4], class 0 again
        let (change, _) = smoothing_changes(binned.column(0), &toy_graph(), &probs, &probs_prev);
        assert_eq!(change, array![0.0, 1.0, 2.0]);

        let result = postprocess(&binned, &[toy_graph()], &oracle, &[FeatureKind::Numeric]).unwrap();
        assert_eq!(
            result.feature_graphs[0],
            array![[0.0, -0.5], [0.0, 1.5], [0.0, -0.5]]
        );
        assert_eq!(result.intercepts, array![0.0, 0.5]);
    }

    #[test]
    fn test_oracle_shape_is_checked() {
        let binned = array![[0usize], [1]];
        let graphs = vec![Array2::<f64>::zeros((2, 3))];
        let err = postprocess(
            &binned,
            &graphs,
            &UniformOracle::new(2),
            &[FeatureKind::Categorical],
        )
        .unwrap_err();
        assert_eq!(
            err,
            PostprocessError::OracleShape {
                expected: (2, 3),
                found: (2, 2)
            }
        );
    }
}
