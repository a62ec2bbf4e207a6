//! What-if market shocks applied to the latest cross-section.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crash_model::{train_on_panel, ModelKind};
use fragility_core::stats::mean;
use fragility_core::{
    FragilityError, Panel, PanelRecord, PortfolioEntry, Result, CRASH_RETURN_THRESHOLD,
};
use portfolio_stress::{aggregate_stress, FirmProbability, StressReport};

use crate::config::AnalysisConfig;

/// Named market shock with a fixed adjustment to firm-year fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketShock {
    /// Return -10 pts, PEG x0.9
    MildCorrection,
    /// Return -30 pts, PEG x0.7
    SevereCrash,
    /// Debt/Equity x1.25, CFO growth -10 pts
    LiquidityShock,
}

impl MarketShock {
    pub const ALL: [MarketShock; 3] = [
        MarketShock::MildCorrection,
        MarketShock::SevereCrash,
        MarketShock::LiquidityShock,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MarketShock::MildCorrection => "Mild Correction (-10%)",
            MarketShock::SevereCrash => "Severe Crash (-30%)",
            MarketShock::LiquidityShock => "Liquidity Shock",
        }
    }

    /// Shocked copy of `record`; the original is untouched.
    pub fn apply(&self, record: &PanelRecord) -> PanelRecord {
        let mut shocked = record.clone();
        match self {
            MarketShock::MildCorrection => {
                shocked.realized_return -= 0.10;
                shocked.peg *= 0.9;
            }
            MarketShock::SevereCrash => {
                shocked.realized_return -= 0.30;
                shocked.peg *= 0.7;
            }
            MarketShock::LiquidityShock => {
                shocked.debt_equity *= 1.25;
                shocked.cfo_growth -= 0.10;
            }
        }
        shocked
    }
}

impl fmt::Display for MarketShock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MarketShock {
    type Err = FragilityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "mild" | "mildcorrection" => Ok(MarketShock::MildCorrection),
            "severe" | "severecrash" | "crash" => Ok(MarketShock::SevereCrash),
            "liquidity" | "liquidityshock" => Ok(MarketShock::LiquidityShock),
            _ => Err(FragilityError::InvalidData(format!("unknown market shock: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShockedFirm {
    pub firm: String,
    pub industry: String,
    pub baseline_probability: f64,
    pub stressed_probability: f64,
    pub baseline_return: f64,
    pub shocked_return: f64,
}

impl ShockedFirm {
    pub fn probability_change(&self) -> f64 {
        self.stressed_probability - self.baseline_probability
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioImpact {
    pub baseline: StressReport,
    pub stressed: StressReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub shock: MarketShock,
    pub industry: Option<String>,
    pub latest_year: i32,
    pub model_kind: ModelKind,
    /// Most affected first
    pub firms: Vec<ShockedFirm>,
    pub mean_baseline: f64,
    pub mean_stressed: f64,
    /// Firms whose shocked Return is below the crash threshold
    pub crashes_under_shock: usize,
    pub portfolio: Option<PortfolioImpact>,
}

/// Score the latest year of the scope before and after `shock`.
///
/// The model is trained once on the unshocked history. Baseline and shocked
/// rows are scored as a single batch, so the heuristic fallback normalises
/// both sides against the same maximum.
pub fn simulate_shock(
    panel: &Panel,
    industry: Option<&str>,
    shock: MarketShock,
    portfolio: Option<&[PortfolioEntry]>,
    config: &AnalysisConfig,
) -> Result<ScenarioResult> {
    let scope = panel.select_industry(industry);
    let latest_year = scope
        .latest_year()
        .ok_or_else(|| FragilityError::InsufficientData("no rows to shock".into()))?;

    let model = train_on_panel(&scope, &config.boosting)?;
    let baseline_rows = scope.for_year(latest_year).into_records();
    let shocked_rows: Vec<PanelRecord> = baseline_rows.iter().map(|r| shock.apply(r)).collect();

    let batch: Vec<PanelRecord> = baseline_rows
        .iter()
        .chain(&shocked_rows)
        .cloned()
        .collect();
    let mut baseline = model.predict_records(&batch);
    let stressed = baseline.split_off(baseline_rows.len());

    let mut firms: Vec<ShockedFirm> = baseline_rows
        .iter()
        .zip(&shocked_rows)
        .zip(baseline.iter().zip(&stressed))
        .map(|((before, after), (&p0, &p1))| ShockedFirm {
            firm: before.firm.clone(),
            industry: before.industry.clone(),
            baseline_probability: p0,
            stressed_probability: p1,
            baseline_return: before.realized_return,
            shocked_return: after.realized_return,
        })
        .collect();
    firms.sort_by(|a, b| b.probability_change().total_cmp(&a.probability_change()));

    let crashes_under_shock = shocked_rows
        .iter()
        .filter(|r| r.realized_return < CRASH_RETURN_THRESHOLD)
        .count();

    let portfolio = portfolio.map(|holdings| PortfolioImpact {
        baseline: aggregate_stress(holdings, &firm_probabilities(&firms, false)),
        stressed: aggregate_stress(holdings, &firm_probabilities(&firms, true)),
    });

    tracing::info!(
        "{} on {}: mean crash probability {:.3} -> {:.3}, {} firms below crash threshold",
        shock,
        industry.unwrap_or("all industries"),
        mean(&baseline),
        mean(&stressed),
        crashes_under_shock
    );

    Ok(ScenarioResult {
        shock,
        industry: industry.map(str::to_string),
        latest_year,
        model_kind: model.kind(),
        firms,
        mean_baseline: mean(&baseline),
        mean_stressed: mean(&stressed),
        crashes_under_shock,
        portfolio,
    })
}

fn firm_probabilities(firms: &[ShockedFirm], stressed: bool) -> Vec<FirmProbability> {
    firms
        .iter()
        .map(|f| {
            let p = if stressed { f.stressed_probability } else { f.baseline_probability };
            FirmProbability::new(f.firm.clone(), p)
        })
        .collect()
}
