use serde::{Deserialize, Serialize};

/// Stress score above which a portfolio is in severe stress.
pub const SEVERE_STRESS_THRESHOLD: f64 = 0.45;

/// Stress score above which a portfolio is in elevated stress.
pub const ELEVATED_STRESS_THRESHOLD: f64 = 0.25;

/// Severity tier of a portfolio stress score, ordered from calm to severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StressTier {
    Low,
    Elevated,
    Severe,
}

impl StressTier {
    /// Both boundaries are strict: 0.45 is Elevated, 0.25 is Low.
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s > SEVERE_STRESS_THRESHOLD => StressTier::Severe,
            s if s > ELEVATED_STRESS_THRESHOLD => StressTier::Elevated,
            _ => StressTier::Low,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StressTier::Low => "Low Stress",
            StressTier::Elevated => "Elevated Stress",
            StressTier::Severe => "Severe Stress",
        }
    }
}

/// Current crash probability for one firm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmProbability {
    pub firm: String,
    pub crash_probability: f64,
}

impl FirmProbability {
    pub fn new(firm: impl Into<String>, crash_probability: f64) -> Self {
        Self {
            firm: firm.into(),
            crash_probability,
        }
    }
}

/// One row of the merged detail table.
///
/// `crash_probability` and `weighted_risk` are `None` for holdings that had
/// no match among the crash probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRisk {
    pub firm: String,
    pub weight: f64,
    pub crash_probability: Option<f64>,
    pub weighted_risk: Option<f64>,
}

impl HoldingRisk {
    pub fn is_matched(&self) -> bool {
        self.crash_probability.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressReport {
    /// Sum of weighted risk over matched holdings, not renormalised
    pub score: f64,
    pub tier: StressTier,
    /// Every holding in portfolio order, matched or not
    pub holdings: Vec<HoldingRisk>,
    pub unmatched: Vec<String>,
    pub matched_weight: f64,
    pub unmatched_weight: f64,
}

impl StressReport {
    pub fn has_unmatched(&self) -> bool {
        !self.unmatched.is_empty()
    }

    /// Matched holdings, highest weighted risk first.
    pub fn top_contributors(&self) -> Vec<&HoldingRisk> {
        let mut matched: Vec<&HoldingRisk> =
            self.holdings.iter().filter(|h| h.is_matched()).collect();
        matched.sort_by(|a, b| {
            b.weighted_risk
                .unwrap_or(0.0)
                .total_cmp(&a.weighted_risk.unwrap_or(0.0))
        });
        matched
    }
}
