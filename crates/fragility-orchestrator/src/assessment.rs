use serde::{Deserialize, Serialize};

use bubble_regime_detector::{BubbleRegime, BubbleScoringStrategy};
use crash_model::heuristic_contributions;
use fragility_core::{FragilityError, Panel, Result};

use crate::config::AnalysisConfig;
use crate::ranking::{rank_all_industries, FirmCrashRisk};
use crate::recommendation::{confidence_level, ConfidenceLevel, Recommendation};

/// Firms listed as "first to crack" by default.
pub const DEFAULT_TOP_FIRMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndustryRegime {
    pub industry: String,
    pub score: u8,
    pub regime: BubbleRegime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmFinding {
    pub firm: String,
    pub industry: String,
    pub crash_probability: f64,
    pub recommendation: Recommendation,
    /// Largest heuristic contribution: earnings_manipulation, valuation,
    /// leverage or weak_cashflow
    pub dominant_driver: String,
}

impl FirmFinding {
    fn from_risk(risk: &FirmCrashRisk) -> Self {
        let dominant_driver = heuristic_contributions(&risk.features)
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name)
            .unwrap_or("earnings_manipulation");

        Self {
            firm: risk.firm.clone(),
            industry: risk.industry.clone(),
            crash_probability: risk.crash_probability,
            recommendation: risk.recommendation,
            dominant_driver: dominant_driver.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stance {
    /// Reduce exposure, hedge downside, avoid new longs in high-risk firms
    ReduceExposure,
    Maintain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAssessment {
    pub confidence: ConfidenceLevel,
    pub years_observed: usize,
    /// Every industry, most fragile first
    pub industries: Vec<IndustryRegime>,
    pub first_to_crack: Vec<FirmFinding>,
    pub stance: Stance,
}

impl FinalAssessment {
    pub fn bubble_industries(&self) -> Vec<&IndustryRegime> {
        self.industries
            .iter()
            .filter(|i| i.regime >= BubbleRegime::FinancialStretch)
            .collect()
    }
}

/// Market-wide findings: per-industry regimes, the `top_n` most crash-prone
/// latest-year firms across industries, and an overall stance.
pub fn final_assessment(
    panel: &Panel,
    config: &AnalysisConfig,
    top_n: usize,
) -> Result<FinalAssessment> {
    if panel.is_empty() {
        return Err(FragilityError::InsufficientData("panel is empty".into()));
    }

    let scorer = config.weighted_scorer();
    let mut industries = Vec::new();
    for industry in panel.industries() {
        let assessment = scorer.assess(&panel.for_industry(&industry))?;
        industries.push(IndustryRegime {
            industry,
            score: assessment.score,
            regime: assessment.label,
        });
    }
    industries.sort_by(|a, b| b.score.cmp(&a.score));

    let mut candidates: Vec<FirmCrashRisk> = rank_all_industries(panel, config)?
        .into_iter()
        .flat_map(|ranking| ranking.firms)
        .collect();
    candidates.sort_by(|a, b| b.crash_probability.total_cmp(&a.crash_probability));

    let stance = if industries.iter().any(|i| i.regime >= BubbleRegime::FinancialStretch)
        || candidates.iter().any(|f| f.recommendation == Recommendation::ExitReduce)
    {
        Stance::ReduceExposure
    } else {
        Stance::Maintain
    };

    let first_to_crack: Vec<FirmFinding> = candidates
        .iter()
        .take(top_n)
        .map(FirmFinding::from_risk)
        .collect();
    let confidence = confidence_level(panel);

    tracing::info!(
        "Final assessment: {} industries, confidence {}, stance {:?}",
        industries.len(),
        confidence.name(),
        stance
    );

    Ok(FinalAssessment {
        confidence,
        years_observed: panel.distinct_years(),
        industries,
        first_to_crack,
        stance,
    })
}
