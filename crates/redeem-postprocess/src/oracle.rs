use ndarray::{Array1, Array2, Axis};

use crate::data_handling::{accumulate_scores, class_count};
use crate::error::PostprocessError;

/// Black-box access to a trained multiclass model.
///
/// The postprocessor only needs class probabilities for bin matrices, so any
/// model (boosted trees, a GAM, a neural net, a test stub) can sit behind this
/// trait. Implementations must return an `(n_rows, n_classes)` matrix whose
/// rows are probability distributions; this is assumed, not verified.
/// `Sync` is required so counterfactual predictions can run on rayon.
pub trait ProbabilityOracle: Sync {
    /// Predict class probabilities for every row of a bin matrix.
    fn predict_proba(&self, binned: &Array2<usize>) -> Array2<f64>;

    /// Optional human readable name for the oracle
    fn name(&self) -> &str {
        "oracle"
    }
}

impl<F> ProbabilityOracle for F
where
    F: Fn(&Array2<usize>) -> Array2<f64> + Sync,
{
    fn predict_proba(&self, binned: &Array2<usize>) -> Array2<f64> {
        self(binned)
    }

    fn name(&self) -> &str {
        "closure"
    }
}

/// Predicts `1 / n_classes` for every row and class.
#[derive(Debug, Clone, Copy)]
pub struct UniformOracle {
    n_classes: usize,
}

impl UniformOracle {
    pub fn new(n_classes: usize) -> Self {
        UniformOracle { n_classes }
    }
}

impl ProbabilityOracle for UniformOracle {
    fn predict_proba(&self, binned: &Array2<usize>) -> Array2<f64> {
        Array2::from_elem(
            (binned.nrows(), self.n_classes),
            1.0 / self.n_classes as f64,
        )
    }

    fn name(&self) -> &str {
        "uniform"
    }
}

/// Softmax over the scores of an additive model.
///
/// Turns a set of feature graphs back into a predictor, which gives a
/// deterministic, non-uniform oracle consistent with the graphs being
/// postprocessed.
#[derive(Debug, Clone)]
pub struct SoftmaxOracle {
    feature_graphs: Vec<Array2<f64>>,
    intercepts: Array1<f64>,
}

impl SoftmaxOracle {
    pub fn new(
        feature_graphs: Vec<Array2<f64>>,
        intercepts: Array1<f64>,
    ) -> Result<Self, PostprocessError> {
        let n_classes = class_count(&feature_graphs)?;
        if intercepts.len() != n_classes {
            return Err(PostprocessError::InterceptLengthMismatch {
                expected: n_classes,
                found: intercepts.len(),
            });
        }
        Ok(SoftmaxOracle {
            feature_graphs,
            intercepts,
        })
    }

    /// Oracle over the graphs alone, with a zero intercept.
    pub fn from_graphs(feature_graphs: Vec<Array2<f64>>) -> Result<Self, PostprocessError> {
        let n_classes = class_count(&feature_graphs)?;
        Self::new(feature_graphs, Array1::zeros(n_classes))
    }
}

impl ProbabilityOracle for SoftmaxOracle {
    /// Panics if a bin index is out of range for its feature graph.
    fn predict_proba(&self, binned: &Array2<usize>) -> Array2<f64> {
        let mut probs = accumulate_scores(binned, &self.feature_graphs, self.intercepts.view());
        for mut row in probs.axis_iter_mut(Axis(0)) {
            let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|score| (score - max).exp());
            let total = row.sum();
            row /= total;
        }
        probs
    }

    fn name(&self) -> &str {
        "softmax"
    }
}
