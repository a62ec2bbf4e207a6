use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fragility_core::stats::{mean, round_to, share};
use fragility_core::{FragilityError, Panel, Result, MAX_F_SCORE};

use crate::risk_metrics::RiskMetrics;

/// Bubble regime of an industry or market, ordered from calm to fragile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BubbleRegime {
    FundamentalGrowth,
    NarrativeExpansion,
    FinancialStretch,
    FragileBubble,
}

impl BubbleRegime {
    pub fn from_score(score: u8) -> Self {
        match score {
            s if s >= 75 => BubbleRegime::FragileBubble,
            s if s >= 55 => BubbleRegime::FinancialStretch,
            s if s >= 35 => BubbleRegime::NarrativeExpansion,
            _ => BubbleRegime::FundamentalGrowth,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BubbleRegime::FundamentalGrowth => "Fundamental Growth",
            BubbleRegime::NarrativeExpansion => "Narrative Expansion",
            BubbleRegime::FinancialStretch => "Financial Stretch",
            BubbleRegime::FragileBubble => "Fragile Bubble",
        }
    }
}

/// Outcome of the share-gated bubble check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PanelBubbleState {
    NoBubble,
    BubbleBuilding,
    BubbleDetected,
}

impl PanelBubbleState {
    /// The top tier needs both a high score and a broad enough base of
    /// high-EM firms; a high score alone only reaches `BubbleBuilding`.
    pub fn classify(score: u8, em_share: f64, min_share: f64) -> Self {
        if score >= 70 && em_share >= min_share {
            PanelBubbleState::BubbleDetected
        } else if score >= 45 {
            PanelBubbleState::BubbleBuilding
        } else {
            PanelBubbleState::NoBubble
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PanelBubbleState::NoBubble => "No Bubble",
            PanelBubbleState::BubbleBuilding => "Bubble Building",
            PanelBubbleState::BubbleDetected => "Bubble Detected",
        }
    }
}

/// EM and PEG cut-offs shared by both strategies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleThresholds {
    pub em_threshold: f64,
    pub peg_threshold: f64,
}

impl Default for BubbleThresholds {
    fn default() -> Self {
        Self {
            em_threshold: 1.5,
            peg_threshold: 2.0,
        }
    }
}

/// Unrounded inputs of a bubble score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BubbleComponents {
    pub latest_year: i32,
    pub firms_latest: usize,
    /// Latest-year fraction of firms with Hybrid_EM above the threshold
    pub em_share: f64,
    /// Latest-year fraction of firms with PEG above the threshold
    pub peg_share: f64,
    /// Latest-year mean PEG
    pub avg_peg: f64,
    pub avg_f_score: f64,
    /// `(9 - mean F-Score) / 9`
    pub low_quality: f64,
    pub risk: RiskMetrics,
}

impl BubbleComponents {
    pub fn compute(panel: &Panel, thresholds: &BubbleThresholds) -> Result<Self> {
        let latest_year = panel
            .latest_year()
            .ok_or_else(|| FragilityError::InsufficientData("cannot score an empty panel".into()))?;
        let latest = panel.for_year(latest_year);

        let em_share = share(latest.iter().map(|r| r.hybrid_em > thresholds.em_threshold));
        let peg_share = share(latest.iter().map(|r| r.peg > thresholds.peg_threshold));
        let pegs: Vec<f64> = latest.iter().map(|r| r.peg).collect();
        let f_scores: Vec<f64> = latest.iter().map(|r| r.f_score as f64).collect();
        let avg_f_score = mean(&f_scores);
        let max_f = MAX_F_SCORE as f64;

        Ok(Self {
            latest_year,
            firms_latest: latest.len(),
            em_share,
            peg_share,
            avg_peg: mean(&pegs),
            avg_f_score,
            low_quality: (max_f - avg_f_score) / max_f,
            risk: RiskMetrics::compute(panel.records(), thresholds.em_threshold),
        })
    }

    /// Display map of the sub-metrics, rounded to three decimals.
    pub fn sub_metrics(&self) -> BTreeMap<String, f64> {
        [
            ("em_share", self.em_share),
            ("peg_share", self.peg_share),
            ("avg_peg", self.avg_peg),
            ("avg_f_score", self.avg_f_score),
            ("low_quality", self.low_quality),
            ("persistence", self.risk.persistence),
            ("concentration", self.risk.concentration),
            ("disconnect", self.risk.disconnect),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), round_to(v, 3)))
        .collect()
    }
}

/// Scale a [0, 1] composite to an integer score, floored and capped at 100.
pub fn to_score(composite: f64) -> u8 {
    if !composite.is_finite() || composite <= 0.0 {
        return 0;
    }
    (composite * 100.0).floor().min(100.0) as u8
}

/// Result of one strategy applied to a panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BubbleAssessment<L> {
    pub strategy: String,
    pub score: u8,
    pub label: L,
    pub composite: f64,
    pub components: BubbleComponents,
    pub sub_metrics: BTreeMap<String, f64>,
    /// Set when the panel spans fewer than two years
    pub low_confidence: bool,
}

/// A named bubble-scoring policy over a multi-year panel.
pub trait BubbleScoringStrategy {
    type Label;

    fn name(&self) -> &'static str;

    /// Composite in [0, 1] (may exceed 1 before capping) from the components.
    fn composite(&self, components: &BubbleComponents) -> f64;

    fn label(&self, score: u8, components: &BubbleComponents) -> Self::Label;

    fn thresholds(&self) -> &BubbleThresholds;

    fn assess(&self, panel: &Panel) -> Result<BubbleAssessment<Self::Label>> {
        let components = BubbleComponents::compute(panel, self.thresholds())?;
        let composite = self.composite(&components);
        let score = to_score(composite);
        let label = self.label(score, &components);

        tracing::debug!(
            "{}: score {} over {} firm-years ({} years)",
            self.name(),
            score,
            panel.len(),
            components.risk.years_observed
        );

        Ok(BubbleAssessment {
            strategy: self.name().to_string(),
            score,
            label,
            composite,
            sub_metrics: components.sub_metrics(),
            low_confidence: components.risk.is_low_confidence(),
            components,
        })
    }
}

/// Weighted multi-metric regime scorer.
///
/// `0.25*EM share + 0.20*PEG share + 0.20*persistence + 0.20*concentration
/// + 0.15*max(disconnect, 0)`, mapped onto [`BubbleRegime`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeightedRegimeScorer {
    pub thresholds: BubbleThresholds,
}

impl WeightedRegimeScorer {
    pub const WEIGHTS: [f64; 5] = [0.25, 0.20, 0.20, 0.20, 0.15];

    pub fn new(thresholds: BubbleThresholds) -> Self {
        Self { thresholds }
    }
}

impl BubbleScoringStrategy for WeightedRegimeScorer {
    type Label = BubbleRegime;

    fn name(&self) -> &'static str {
        "weighted_regime"
    }

    fn composite(&self, c: &BubbleComponents) -> f64 {
        let w = Self::WEIGHTS;
        w[0] * c.em_share
            + w[1] * c.peg_share
            + w[2] * c.risk.persistence
            + w[3] * c.risk.concentration
            + w[4] * c.risk.disconnect.max(0.0)
    }

    fn label(&self, score: u8, _components: &BubbleComponents) -> BubbleRegime {
        BubbleRegime::from_score(score)
    }

    fn thresholds(&self) -> &BubbleThresholds {
        &self.thresholds
    }
}

/// Conservative threshold-driven bubble check.
///
/// Scores the latest cross-section only (`0.4*EM share + 0.3*mean PEG/3 +
/// 0.3*low quality`) and requires at least `min_share` of firms above the EM
/// threshold before declaring a bubble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareGatedScorer {
    pub thresholds: BubbleThresholds,
    pub min_share: f64,
}

impl Default for ShareGatedScorer {
    fn default() -> Self {
        Self {
            thresholds: BubbleThresholds::default(),
            min_share: 0.35,
        }
    }
}

impl ShareGatedScorer {
    pub const WEIGHTS: [f64; 3] = [0.4, 0.3, 0.3];

    /// Mean PEG that maps to a full valuation term.
    pub const PEG_SCALE: f64 = 3.0;

    pub fn new(thresholds: BubbleThresholds, min_share: f64) -> Self {
        Self {
            thresholds,
            min_share,
        }
    }
}

impl BubbleScoringStrategy for ShareGatedScorer {
    type Label = PanelBubbleState;

    fn name(&self) -> &'static str {
        "share_gated"
    }

    fn composite(&self, c: &BubbleComponents) -> f64 {
        let w = Self::WEIGHTS;
        w[0] * c.em_share + w[1] * (c.avg_peg / Self::PEG_SCALE) + w[2] * c.low_quality
    }

    fn label(&self, score: u8, c: &BubbleComponents) -> PanelBubbleState {
        PanelBubbleState::classify(score, c.em_share, self.min_share)
    }

    fn thresholds(&self) -> &BubbleThresholds {
        &self.thresholds
    }
}
