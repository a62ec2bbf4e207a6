//! Bubble regime detection
//!
//! Scores how bubble-like a panel (one industry or the whole market) looks,
//! from cross-sectional shares in the latest year and time-series risk
//! metrics across all years. Two scoring strategies are provided behind
//! [`BubbleScoringStrategy`]; the market overview builds the dashboard-style
//! fragility index and early warnings on top of the same panel.

pub mod overview;
pub mod regime;
pub mod risk_metrics;

pub use overview::{
    industry_stress_monitor, market_overview, EarlyWarning, ExecutiveSummary, FragilityBand,
    IndustryMeans, IndustryStress, MarketOverview, YearMeans,
};
pub use regime::{
    to_score, BubbleAssessment, BubbleComponents, BubbleRegime, BubbleScoringStrategy,
    BubbleThresholds, PanelBubbleState, ShareGatedScorer, WeightedRegimeScorer,
};
pub use risk_metrics::{concentration_risk, disconnect_index, em_persistence, RiskMetrics};
