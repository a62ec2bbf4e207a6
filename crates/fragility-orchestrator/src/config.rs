use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use bubble_regime_detector::{BubbleThresholds, ShareGatedScorer, WeightedRegimeScorer};
use crash_model::BoostingParams;

use crate::recommendation::RecommendationThresholds;

/// Tunable thresholds and model settings shared by every pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Hybrid_EM level counted as aggressive manipulation
    pub em_threshold: f64,
    /// PEG level counted as stretched valuation
    pub peg_threshold: f64,
    /// Minimum EM share before the share-gated check declares a bubble
    pub min_share: f64,
    pub recommendation: RecommendationThresholds,
    pub boosting: BoostingParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            em_threshold: 1.5,
            peg_threshold: 2.0,
            min_share: 0.35,
            recommendation: RecommendationThresholds::default(),
            boosting: BoostingParams::default(),
        }
    }
}

impl AnalysisConfig {
    /// Defaults overlaid with any `FRAGILITY_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        overlay(&mut config.em_threshold, "FRAGILITY_EM_THRESHOLD");
        overlay(&mut config.peg_threshold, "FRAGILITY_PEG_THRESHOLD");
        overlay(&mut config.min_share, "FRAGILITY_MIN_SHARE");
        overlay(&mut config.recommendation.exit, "FRAGILITY_EXIT_THRESHOLD");
        overlay(&mut config.recommendation.hedge, "FRAGILITY_HEDGE_THRESHOLD");
        overlay(&mut config.boosting.n_estimators, "FRAGILITY_N_ESTIMATORS");
        overlay(&mut config.boosting.learning_rate, "FRAGILITY_LEARNING_RATE");
        overlay(&mut config.boosting.max_depth, "FRAGILITY_MAX_DEPTH");

        config
    }

    pub fn bubble_thresholds(&self) -> BubbleThresholds {
        BubbleThresholds {
            em_threshold: self.em_threshold,
            peg_threshold: self.peg_threshold,
        }
    }

    pub fn weighted_scorer(&self) -> WeightedRegimeScorer {
        WeightedRegimeScorer::new(self.bubble_thresholds())
    }

    pub fn share_gated_scorer(&self) -> ShareGatedScorer {
        ShareGatedScorer::new(self.bubble_thresholds(), self.min_share)
    }
}

fn overlay<T: FromStr>(slot: &mut T, key: &str) {
    let Ok(raw) = env::var(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!("Ignoring {}={:?}: not a valid value", key, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.em_threshold, 1.5);
        assert_eq!(config.peg_threshold, 2.0);
        assert_eq!(config.min_share, 0.35);
        assert_eq!(config.recommendation.exit, 0.75);
        assert_eq!(config.recommendation.hedge, 0.50);
        assert_eq!(config.share_gated_scorer().min_share, 0.35);
    }

    #[test]
    fn test_overlay_parses_and_ignores_garbage() {
        // keys unique to this test so parallel tests never observe them
        env::set_var("FRAGILITY_TEST_OVERLAY_OK", "2.25");
        env::set_var("FRAGILITY_TEST_OVERLAY_BAD", "lots");

        let mut ok = 1.0_f64;
        overlay(&mut ok, "FRAGILITY_TEST_OVERLAY_OK");
        assert_eq!(ok, 2.25);

        let mut bad = 1.0_f64;
        overlay(&mut bad, "FRAGILITY_TEST_OVERLAY_BAD");
        assert_eq!(bad, 1.0);

        let mut missing = 7_usize;
        overlay(&mut missing, "FRAGILITY_TEST_OVERLAY_MISSING");
        assert_eq!(missing, 7);
    }
}
