//! Crash-probability model
//!
//! Binary classifier over engineered firm-year features (label: annual
//! return below -30%). Fits a gradient-boosted tree ensemble when the
//! training labels contain both classes and degrades to a deterministic
//! weighted score when they do not.

pub mod gbm;
pub mod heuristic;
pub mod model;

pub use gbm::{BoostingParams, GradientBoostedClassifier, RegressionNode, RegressionTree};
pub use heuristic::{
    heuristic_contributions, heuristic_raw_score, heuristic_scores, HEURISTIC_WEIGHTS,
};
pub use model::{train_model, train_on_panel, CrashModel, ModelKind};
