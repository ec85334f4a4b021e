//! redeem-postprocess: re-normalization of additive multiclass models.
//!
//! An additive multiclass model scores every class as the sum of one lookup
//! table per feature ("feature graph", rows = bins, columns = classes). This
//! crate re-parameterizes those tables after training: numeric features get
//! their bin-to-bin steps smoothed with a counterfactual probability-ratio
//! rule, and every feature is centered so that its weighted mean effect on
//! each class is zero, with the removed mass collected in per-class
//! intercepts.
//!
//! The trained model is only seen through a [`oracle::ProbabilityOracle`], so
//! any predictor that maps a bin matrix to class probabilities can be used.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod multiclass;
pub mod oracle;
pub mod stats;

pub use config::{FeatureKind, PostprocessConfig};
pub use error::PostprocessError;
pub use multiclass::{postprocess, postprocess_with_config, Postprocessed};
pub use oracle::{ProbabilityOracle, SoftmaxOracle, UniformOracle};
