use serde::{Deserialize, Serialize};

use crash_model::{train_on_panel, CrashModel, ModelKind};
use fragility_core::{build_features, FeatureVector, FragilityError, Panel, PanelRecord, Result};
use portfolio_stress::FirmProbability;

use crate::config::AnalysisConfig;
use crate::recommendation::Recommendation;

/// Latest-period crash probability and action tier for one firm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmCrashRisk {
    pub firm: String,
    pub industry: String,
    pub year: i32,
    pub crash_probability: f64,
    pub recommendation: Recommendation,
    pub features: FeatureVector,
}

/// Firms of one scope ranked by crash probability, highest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrashRanking {
    /// `None` for a market-wide ranking
    pub industry: Option<String>,
    pub latest_year: i32,
    pub model_kind: ModelKind,
    pub firms: Vec<FirmCrashRisk>,
}

impl CrashRanking {
    pub fn probabilities(&self) -> Vec<FirmProbability> {
        self.firms
            .iter()
            .map(|f| FirmProbability::new(f.firm.clone(), f.crash_probability))
            .collect()
    }

    pub fn top(&self, n: usize) -> &[FirmCrashRisk] {
        &self.firms[..n.min(self.firms.len())]
    }
}

/// Train on the selected scope and rank its latest-year firms.
///
/// The model sees every year of the scope; only the latest year is scored.
pub fn crash_ranking(
    panel: &Panel,
    industry: Option<&str>,
    config: &AnalysisConfig,
) -> Result<CrashRanking> {
    let scope = panel.select_industry(industry);
    let latest_year = scope.latest_year().ok_or_else(|| match industry {
        Some(name) => FragilityError::InsufficientData(format!("no rows for industry {}", name)),
        None => FragilityError::InsufficientData("panel is empty".into()),
    })?;

    let model = train_on_panel(&scope, &config.boosting)?;
    let latest = scope.for_year(latest_year);
    let firms = score_latest(&model, latest.records(), config);

    tracing::info!(
        "Ranked {} firms in {} for {} ({})",
        firms.len(),
        industry.unwrap_or("all industries"),
        latest_year,
        model.kind().name()
    );

    Ok(CrashRanking {
        industry: industry.map(str::to_string),
        latest_year,
        model_kind: model.kind(),
        firms,
    })
}

/// One ranking per industry, each with its own model, in panel order.
pub fn rank_all_industries(panel: &Panel, config: &AnalysisConfig) -> Result<Vec<CrashRanking>> {
    panel
        .industries()
        .iter()
        .map(|industry| crash_ranking(panel, Some(industry.as_str()), config))
        .collect()
}

/// Latest-period probabilities for every firm, each scored by its own
/// industry's model.
pub fn latest_probabilities(
    panel: &Panel,
    config: &AnalysisConfig,
) -> Result<Vec<FirmProbability>> {
    Ok(rank_all_industries(panel, config)?
        .iter()
        .flat_map(CrashRanking::probabilities)
        .collect())
}

pub(crate) fn score_latest(
    model: &CrashModel,
    records: &[PanelRecord],
    config: &AnalysisConfig,
) -> Vec<FirmCrashRisk> {
    let features = build_features(records);
    let probs = model.predict(&features);

    let mut firms: Vec<FirmCrashRisk> = records
        .iter()
        .zip(features)
        .zip(probs)
        .map(|((record, features), crash_probability)| FirmCrashRisk {
            firm: record.firm.clone(),
            industry: record.industry.clone(),
            year: record.year,
            crash_probability,
            recommendation: Recommendation::classify(crash_probability, &config.recommendation),
            features,
        })
        .collect();

    // stable: equal probabilities keep panel order
    firms.sort_by(|a, b| b.crash_probability.total_cmp(&a.crash_probability));
    firms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{market_panel, row};

    #[test]
    fn test_ranking_scores_latest_year_only() {
        let panel = market_panel(42);
        let ranking = crash_ranking(&panel, Some("AI"), &AnalysisConfig::default()).unwrap();

        assert_eq!(ranking.latest_year, 2024);
        assert_eq!(ranking.industry.as_deref(), Some("AI"));
        assert_eq!(ranking.firms.len(), panel.for_industry("AI").for_year(2024).len());
        assert!(ranking.firms.iter().all(|f| f.year == 2024 && f.industry == "AI"));
        assert!(ranking
            .firms
            .windows(2)
            .all(|w| w[0].crash_probability >= w[1].crash_probability));
    }

    #[test]
    fn test_recommendations_follow_probabilities() {
        let panel = market_panel(7);
        let ranking = crash_ranking(&panel, None, &AnalysisConfig::default()).unwrap();
        for firm in &ranking.firms {
            assert_eq!(
                firm.recommendation,
                Recommendation::from_probability(firm.crash_probability)
            );
        }
    }

    #[test]
    fn test_calm_industry_uses_heuristic_ranking() {
        let panel = Panel::new(vec![
            row("A", "Utilities", 2023, 1.0, 1.0, 0.1),
            row("B", "Utilities", 2023, 2.0, 1.0, 0.1),
            row("A", "Utilities", 2024, 1.2, 1.5, 0.1),
            row("B", "Utilities", 2024, 2.5, 2.0, 0.1),
        ]);
        let ranking = crash_ranking(&panel, Some("Utilities"), &AnalysisConfig::default()).unwrap();

        assert_eq!(ranking.model_kind, ModelKind::Heuristic);
        assert_eq!(ranking.firms[0].firm, "B");
        assert_eq!(ranking.firms[0].crash_probability, 1.0);
        assert_eq!(ranking.top(1).len(), 1);
        assert_eq!(ranking.top(10).len(), 2);
    }

    #[test]
    fn test_unknown_industry_errors() {
        let panel = market_panel(1);
        let err = crash_ranking(&panel, Some("Shipping"), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, FragilityError::InsufficientData(_)));
    }

    #[test]
    fn test_latest_probabilities_cover_every_latest_firm() {
        let panel = market_panel(3);
        let probs = latest_probabilities(&panel, &AnalysisConfig::default()).unwrap();
        assert_eq!(probs.len(), panel.latest().len());
        assert!(probs.iter().all(|p| (0.0..=1.0).contains(&p.crash_probability)));
    }
}
