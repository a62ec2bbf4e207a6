use serde::{Deserialize, Serialize};

use fragility_core::{
    build_features, crash_label, feature_matrix, FeatureVector, FragilityError, Panel, PanelRecord,
    Result,
};

use crate::gbm::{BoostingParams, GradientBoostedClassifier};
use crate::heuristic::heuristic_scores;

/// Which scoring path produced a set of crash probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Fitted gradient-boosted classifier
    Trained,
    /// Deterministic weighted score used when the labels have a single class
    Heuristic,
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Trained => "Gradient Boosted",
            ModelKind::Heuristic => "Heuristic Fallback",
        }
    }
}

/// Crash predictor owned by the pipeline that trained it.
///
/// Either a fitted classifier or the heuristic sentinel; [`CrashModel::predict`]
/// has the same signature for both so callers need not care, but
/// [`CrashModel::kind`] lets them find out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CrashModel {
    Trained(GradientBoostedClassifier),
    Heuristic,
}

impl CrashModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            CrashModel::Trained(_) => ModelKind::Trained,
            CrashModel::Heuristic => ModelKind::Heuristic,
        }
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, CrashModel::Heuristic)
    }

    /// One crash probability in [0, 1] per row, in batch order.
    pub fn predict(&self, batch: &[FeatureVector]) -> Vec<f64> {
        match self {
            CrashModel::Trained(classifier) => feature_matrix(batch)
                .iter()
                .map(|row| classifier.predict_proba(row))
                .collect(),
            CrashModel::Heuristic => heuristic_scores(batch),
        }
    }

    /// Build features for `records` and score them.
    pub fn predict_records(&self, records: &[PanelRecord]) -> Vec<f64> {
        self.predict(&build_features(records))
    }
}

/// Fit a crash model on training rows and their features.
///
/// Labels are `Return < -0.30`. When the labels hold a single class (no
/// crashes, or nothing but crashes) the classifier cannot be fitted and the
/// heuristic sentinel is returned instead; this is never an error.
pub fn train_model(
    records: &[PanelRecord],
    features: &[FeatureVector],
    params: &BoostingParams,
) -> Result<CrashModel> {
    if records.len() != features.len() {
        return Err(FragilityError::InvalidData(format!(
            "{} training rows but {} feature vectors",
            records.len(),
            features.len()
        )));
    }

    let labels: Vec<bool> = records.iter().map(crash_label).collect();
    let crashes = labels.iter().filter(|&&l| l).count();

    match GradientBoostedClassifier::fit(&feature_matrix(features), &labels, params) {
        Some(classifier) => {
            tracing::debug!(
                "Trained crash classifier on {} rows ({} crashes, {} stages)",
                records.len(),
                crashes,
                classifier.n_estimators()
            );
            Ok(CrashModel::Trained(classifier))
        }
        None => {
            tracing::warn!(
                "Crash labels are single-class ({} of {} rows crashed); using heuristic fallback",
                crashes,
                records.len()
            );
            Ok(CrashModel::Heuristic)
        }
    }
}

/// Convenience wrapper: build features from `panel` and train on it.
pub fn train_on_panel(panel: &Panel, params: &BoostingParams) -> Result<CrashModel> {
    let features = build_features(panel.records());
    train_model(panel.records(), &features, params)
}
