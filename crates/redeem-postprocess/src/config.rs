use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the bins of a feature are ordered.
///
/// Numeric bins are ordinal, so neighbouring bins are smoothed against each
/// other. Categorical bins have no order and are only centered.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl FeatureKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureKind::Numeric)
    }
}

impl FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "numeric" => Ok(FeatureKind::Numeric),
            "categorical" => Ok(FeatureKind::Categorical),
            _ => Err(format!(
                "Unknown feature kind: {}. Expected `numeric` or `categorical`",
                s
            )),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Numeric => write!(f, "numeric"),
            FeatureKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Knobs for [`crate::multiclass::postprocess_with_config`].
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PostprocessConfig {
    /// Evaluate the per-feature counterfactual predictions on the rayon pool.
    pub parallel_counterfactuals: bool,
    /// Log a warning when a probability ratio sum is NaN or infinite.
    pub warn_non_finite: bool,
}

impl PostprocessConfig {
    pub fn new(parallel_counterfactuals: bool, warn_non_finite: bool) -> Self {
        Self {
            parallel_counterfactuals,
            warn_non_finite,
        }
    }
}

impl Default for PostprocessConfig {
    fn default() -> Self {
        Self {
            parallel_counterfactuals: false,
            warn_non_finite: true,
        }
    }
}
