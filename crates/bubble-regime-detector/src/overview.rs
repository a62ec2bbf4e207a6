//! Market-wide fragility overview and industry stress tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fragility_core::stats::{mean, round_to, share};
use fragility_core::{FragilityError, Panel, PanelRecord, Result};

/// Hybrid_EM level above which a firm counts as high-risk in the overview.
pub const HIGH_RISK_EM: f64 = 2.0;

/// Multiplier turning mean Hybrid_EM into the 0-100 fragility index.
pub const FRAGILITY_INDEX_SCALE: f64 = 20.0;

/// Gauge band for the global fragility index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FragilityBand {
    Calm,
    Elevated,
    Critical,
}

impl FragilityBand {
    pub fn from_index(index: f64) -> Self {
        match index {
            i if i < 30.0 => FragilityBand::Calm,
            i if i < 60.0 => FragilityBand::Elevated,
            _ => FragilityBand::Critical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EarlyWarning {
    /// Global fragility index above 60
    SystemWideFragility,
    /// More than 35% of firms above the high-risk EM level
    RiskConcentration,
    /// Most stressed industry averages Hybrid_EM above 2.0
    AggressiveManipulation,
}

impl EarlyWarning {
    pub fn message(&self) -> &'static str {
        match self {
            EarlyWarning::SystemWideFragility => "System-wide fragility is elevated.",
            EarlyWarning::RiskConcentration => "High concentration of risky firms detected.",
            EarlyWarning::AggressiveManipulation => "Aggressive earnings manipulation observed.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutiveSummary {
    LateCycleFragility,
    EarlyBubble,
    BroadlySupported,
}

impl ExecutiveSummary {
    pub fn from_index(index: f64) -> Self {
        if index >= 60.0 {
            ExecutiveSummary::LateCycleFragility
        } else if index >= 35.0 {
            ExecutiveSummary::EarlyBubble
        } else {
            ExecutiveSummary::BroadlySupported
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ExecutiveSummary::LateCycleFragility => {
                "Market conditions indicate late-cycle fragility. \
                 Bubble dynamics are visible across multiple industries."
            }
            ExecutiveSummary::EarlyBubble => {
                "Market shows early bubble characteristics. Risk concentration is rising."
            }
            ExecutiveSummary::BroadlySupported => {
                "Market conditions remain broadly supported. No systemic bubble detected."
            }
        }
    }
}

/// Per-industry means of the stress inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryMeans {
    pub industry: String,
    pub hybrid_em: f64,
    pub peg: f64,
    pub debt_equity: f64,
}

impl IndustryMeans {
    /// `0.4*EM + 0.3*PEG + 0.3*D/E`
    pub fn stress_score(&self) -> f64 {
        0.4 * self.hybrid_em + 0.3 * self.peg + 0.3 * self.debt_equity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryStress {
    #[serde(flatten)]
    pub means: IndustryMeans,
    pub stress_score: f64,
}

/// Cross-sectional means for one year of the momentum trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearMeans {
    pub year: i32,
    pub hybrid_em: f64,
    pub peg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOverview {
    pub latest_year: i32,
    pub firms_latest: usize,
    pub global_fragility_index: f64,
    pub avg_peg: f64,
    pub avg_leverage: f64,
    pub high_risk_share_pct: f64,
    pub band: FragilityBand,
    /// Latest-year industry means, alphabetical
    pub heatmap: Vec<IndustryMeans>,
    pub momentum: Vec<YearMeans>,
    /// Latest-year industries, most stressed first
    pub stress_ranking: Vec<IndustryStress>,
    pub warnings: Vec<EarlyWarning>,
    /// Fragility index at or below 35
    pub no_systemic_warning: bool,
    pub summary: ExecutiveSummary,
}

/// Build the latest-year market overview.
pub fn market_overview(panel: &Panel) -> Result<MarketOverview> {
    let latest_year = panel
        .latest_year()
        .ok_or_else(|| {
            FragilityError::InsufficientData("market overview needs at least one firm-year".into())
        })?;
    let latest = panel.for_year(latest_year);

    let em: Vec<f64> = latest.iter().map(|r| r.hybrid_em).collect();
    let peg: Vec<f64> = latest.iter().map(|r| r.peg).collect();
    let leverage: Vec<f64> = latest.iter().map(|r| r.debt_equity).collect();

    let global_fragility_index = round_to(mean(&em) * FRAGILITY_INDEX_SCALE, 1);
    let high_risk_share_pct = round_to(share(em.iter().map(|&e| e > HIGH_RISK_EM)) * 100.0, 1);

    let heatmap = industry_means(latest.records());
    let stress_ranking = stress_ranking(&heatmap);

    let mut warnings = Vec::new();
    if global_fragility_index > 60.0 {
        warnings.push(EarlyWarning::SystemWideFragility);
    }
    if high_risk_share_pct > 35.0 {
        warnings.push(EarlyWarning::RiskConcentration);
    }
    if stress_ranking
        .first()
        .is_some_and(|top| top.means.hybrid_em > HIGH_RISK_EM)
    {
        warnings.push(EarlyWarning::AggressiveManipulation);
    }

    tracing::info!(
        "Market overview {}: fragility {:.1}, {} warnings",
        latest_year,
        global_fragility_index,
        warnings.len()
    );

    Ok(MarketOverview {
        latest_year,
        firms_latest: latest.len(),
        global_fragility_index,
        avg_peg: round_to(mean(&peg), 2),
        avg_leverage: round_to(mean(&leverage), 2),
        high_risk_share_pct,
        band: FragilityBand::from_index(global_fragility_index),
        heatmap,
        momentum: momentum_trend(panel),
        stress_ranking,
        warnings,
        no_systemic_warning: global_fragility_index <= 35.0,
        summary: ExecutiveSummary::from_index(global_fragility_index),
    })
}

/// Industry means across every year in the panel (the stress monitor table).
pub fn industry_stress_monitor(panel: &Panel) -> Vec<IndustryMeans> {
    industry_means(panel.records())
}

/// Per-industry means of Hybrid_EM, PEG and Debt/Equity, sorted by industry.
pub fn industry_means(records: &[PanelRecord]) -> Vec<IndustryMeans> {
    let mut groups: BTreeMap<&str, Vec<&PanelRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.industry.as_str()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(industry, rows)| IndustryMeans {
            industry: industry.to_string(),
            hybrid_em: mean(&rows.iter().map(|r| r.hybrid_em).collect::<Vec<_>>()),
            peg: mean(&rows.iter().map(|r| r.peg).collect::<Vec<_>>()),
            debt_equity: mean(&rows.iter().map(|r| r.debt_equity).collect::<Vec<_>>()),
        })
        .collect()
}

/// Industries ordered by descending stress score.
pub fn stress_ranking(means: &[IndustryMeans]) -> Vec<IndustryStress> {
    let mut ranking: Vec<IndustryStress> = means
        .iter()
        .map(|m| IndustryStress {
            stress_score: m.stress_score(),
            means: m.clone(),
        })
        .collect();
    ranking.sort_by(|a, b| b.stress_score.total_cmp(&a.stress_score));
    ranking
}

/// Yearly cross-sectional means of Hybrid_EM and PEG, oldest first.
pub fn momentum_trend(panel: &Panel) -> Vec<YearMeans> {
    panel
        .years()
        .into_iter()
        .map(|year| {
            let rows = panel.for_year(year);
            YearMeans {
                year,
                hybrid_em: mean(&rows.iter().map(|r| r.hybrid_em).collect::<Vec<_>>()),
                peg: mean(&rows.iter().map(|r| r.peg).collect::<Vec<_>>()),
            }
        })
        .collect()
}
