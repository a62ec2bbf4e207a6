//! Analysis pipelines consumed by the presentation layer.
//!
//! Each pipeline takes a read-only [`Panel`](fragility_core::Panel), slices
//! a private copy, trains whatever model it needs from scratch and returns a
//! serialisable report. Nothing is cached between calls.

pub mod assessment;
pub mod config;
pub mod ranking;
pub mod recommendation;
pub mod reports;
pub mod scenario;

#[cfg(test)]
mod test_support;

pub use assessment::{
    final_assessment, FinalAssessment, FirmFinding, IndustryRegime, Stance, DEFAULT_TOP_FIRMS,
};
pub use config::AnalysisConfig;
pub use ranking::{
    crash_ranking, latest_probabilities, rank_all_industries, CrashRanking, FirmCrashRisk,
};
pub use recommendation::{
    confidence_level, ConfidenceLevel, Recommendation, RecommendationThresholds,
};
pub use reports::{
    backtest_report, portfolio_report, regime_report, BacktestReport, RegimeReport, YearComparison,
};
pub use scenario::{simulate_shock, MarketShock, PortfolioImpact, ScenarioResult, ShockedFirm};
