use serde::{Deserialize, Serialize};

use fragility_core::Panel;

/// Action tier for a single firm, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Monitor,
    HedgeReduce,
    ExitReduce,
}

impl Recommendation {
    /// Tier under the default thresholds.
    pub fn from_probability(probability: f64) -> Self {
        Self::classify(probability, &RecommendationThresholds::default())
    }

    /// Strictly above `exit` exits, strictly above `hedge` hedges.
    pub fn classify(probability: f64, thresholds: &RecommendationThresholds) -> Self {
        match probability {
            p if p > thresholds.exit => Recommendation::ExitReduce,
            p if p > thresholds.hedge => Recommendation::HedgeReduce,
            _ => Recommendation::Monitor,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Recommendation::Monitor => "Monitor",
            Recommendation::HedgeReduce => "Hedge/Reduce",
            Recommendation::ExitReduce => "Exit/Reduce now",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    pub exit: f64,
    pub hedge: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            exit: 0.75,
            hedge: 0.50,
        }
    }
}

/// How much history backs an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_years(distinct_years: usize) -> Self {
        match distinct_years {
            n if n >= 7 => ConfidenceLevel::High,
            n if n >= 4 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "Low",
            ConfidenceLevel::Medium => "Medium",
            ConfidenceLevel::High => "High",
        }
    }
}

pub fn confidence_level(panel: &Panel) -> ConfidenceLevel {
    ConfidenceLevel::from_years(panel.distinct_years())
}
