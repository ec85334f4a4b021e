use std::error::Error;
use std::fmt;

/// Contract violations detected before any feature graph is adjusted.
#[derive(Debug, Clone, PartialEq)]
pub enum PostprocessError {
    EmptyFeatureGraphs,
    EmptyDataset,
    NoClasses,
    FeatureCountMismatch {
        dataset: usize,
        graphs: usize,
    },
    FeatureKindCountMismatch {
        kinds: usize,
        graphs: usize,
    },
    ClassCountMismatch {
        feature: usize,
        expected: usize,
        found: usize,
    },
    BinOutOfRange {
        feature: usize,
        row: usize,
        bin: usize,
        num_bins: usize,
    },
    InterceptLengthMismatch {
        expected: usize,
        found: usize,
    },
    OracleShape {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl fmt::Display for PostprocessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PostprocessError::EmptyFeatureGraphs => write!(f, "At least one feature graph is required"),
            PostprocessError::EmptyDataset => write!(f, "Binned dataset has no samples"),
            PostprocessError::NoClasses => write!(f, "Feature graphs must have at least one class column"),
            PostprocessError::FeatureCountMismatch { dataset, graphs } => write!(
                f,
                "Binned dataset has {} feature columns but {} feature graphs were given",
                dataset, graphs
            ),
            PostprocessError::FeatureKindCountMismatch { kinds, graphs } => write!(
                f,
                "Got {} feature kinds for {} feature graphs",
                kinds, graphs
            ),
            PostprocessError::ClassCountMismatch { feature, expected, found } => write!(
                f,
                "Feature graph {} has {} class columns, expected {}",
                feature, found, expected
            ),
            PostprocessError::BinOutOfRange { feature, row, bin, num_bins } => write!(
                f,
                "Bin {} at row {} is out of range for feature {} with {} bins",
                bin, row, feature, num_bins
            ),
            PostprocessError::InterceptLengthMismatch { expected, found } => write!(
                f,
                "Intercept vector has length {}, expected {}",
                found, expected
            ),
            PostprocessError::OracleShape { expected, found } => write!(
                f,
                "Prediction oracle returned shape {:?}, expected {:?}",
                found, expected
            ),
        }
    }
}

impl Error for PostprocessError {}
