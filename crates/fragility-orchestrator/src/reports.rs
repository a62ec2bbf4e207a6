//! Regime, backtest and portfolio reports for the presentation layer.

use serde::{Deserialize, Serialize};

use bubble_regime_detector::{
    BubbleAssessment, BubbleRegime, BubbleScoringStrategy, PanelBubbleState,
};
use crash_backtest::{BacktestOutput, WalkForwardBacktest};
use fragility_core::{FragilityError, Panel, PortfolioEntry, Result};
use portfolio_stress::{aggregate_stress, StressReport};

use crate::config::AnalysisConfig;
use crate::ranking::latest_probabilities;

/// Both bubble-scoring strategies applied to one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeReport {
    /// `None` for the whole market
    pub industry: Option<String>,
    pub weighted: BubbleAssessment<BubbleRegime>,
    pub share_gated: BubbleAssessment<PanelBubbleState>,
}

impl RegimeReport {
    pub fn regime(&self) -> BubbleRegime {
        self.weighted.label
    }
}

pub fn regime_report(
    panel: &Panel,
    industry: Option<&str>,
    config: &AnalysisConfig,
) -> Result<RegimeReport> {
    let scope = non_empty_scope(panel, industry)?;

    Ok(RegimeReport {
        industry: industry.map(str::to_string),
        weighted: config.weighted_scorer().assess(&scope)?,
        share_gated: config.share_gated_scorer().assess(&scope)?,
    })
}

/// Mean predicted probability against mean realised return for one tested year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearComparison {
    pub year: i32,
    pub mean_predicted: f64,
    pub mean_return: f64,
    pub crash_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub industry: Option<String>,
    /// No year had enough history; nothing to chart
    pub insufficient_data: bool,
    pub comparison: Vec<YearComparison>,
    pub output: BacktestOutput,
}

pub fn backtest_report(
    panel: &Panel,
    industry: Option<&str>,
    config: &AnalysisConfig,
) -> Result<BacktestReport> {
    let scope = non_empty_scope(panel, industry)?;
    let output = WalkForwardBacktest::new(config.boosting.clone()).run(&scope)?;

    let comparison = output
        .years
        .iter()
        .map(|y| {
            let returns: Vec<f64> = output
                .rows
                .iter()
                .filter(|r| r.record.year == y.year)
                .map(|r| r.record.realized_return)
                .collect();
            YearComparison {
                year: y.year,
                mean_predicted: y.metrics.mean_predicted,
                mean_return: fragility_core::stats::mean(&returns),
                crash_rate: y.metrics.crash_rate,
            }
        })
        .collect();

    if output.is_empty() {
        tracing::info!(
            "Backtest for {} has insufficient history",
            industry.unwrap_or("all industries")
        );
    }

    Ok(BacktestReport {
        industry: industry.map(str::to_string),
        insufficient_data: output.is_empty(),
        comparison,
        output,
    })
}

/// Stress the portfolio against latest-period probabilities, each firm scored
/// by its own industry's model.
pub fn portfolio_report(
    panel: &Panel,
    portfolio: &[PortfolioEntry],
    config: &AnalysisConfig,
) -> Result<StressReport> {
    let probabilities = latest_probabilities(panel, config)?;
    let report = aggregate_stress(portfolio, &probabilities);

    tracing::info!(
        "Portfolio of {} holdings: stress {:.3} ({}), {} unmatched",
        portfolio.len(),
        report.score,
        report.tier.name(),
        report.unmatched.len()
    );

    Ok(report)
}

fn non_empty_scope(panel: &Panel, industry: Option<&str>) -> Result<Panel> {
    let scope = panel.select_industry(industry);
    if scope.is_empty() {
        return Err(FragilityError::InsufficientData(match industry {
            Some(name) => format!("no rows for industry {}", name),
            None => "panel is empty".to_string(),
        }));
    }
    Ok(scope)
}
