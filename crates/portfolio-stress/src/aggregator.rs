use std::collections::HashMap;

use fragility_core::PortfolioEntry;

use crate::models::*;

/// Merge `portfolio` onto `probabilities` by firm and score the result.
///
/// The portfolio drives the merge. A firm listed more than once among the
/// probabilities resolves to its first entry. Weights are used as given.
pub fn aggregate_stress(
    portfolio: &[PortfolioEntry],
    probabilities: &[FirmProbability],
) -> StressReport {
    let mut lookup: HashMap<&str, f64> = HashMap::with_capacity(probabilities.len());
    for p in probabilities {
        lookup.entry(p.firm.as_str()).or_insert(p.crash_probability);
    }

    let holdings: Vec<HoldingRisk> = portfolio
        .iter()
        .map(|entry| {
            let crash_probability = lookup.get(entry.firm.as_str()).copied();
            HoldingRisk {
                firm: entry.firm.clone(),
                weight: entry.weight,
                crash_probability,
                weighted_risk: crash_probability.map(|p| entry.weight * p),
            }
        })
        .collect();

    let score: f64 = holdings.iter().filter_map(|h| h.weighted_risk).sum();
    let matched_weight: f64 = holdings.iter().filter(|h| h.is_matched()).map(|h| h.weight).sum();
    let unmatched: Vec<String> = holdings
        .iter()
        .filter(|h| !h.is_matched())
        .map(|h| h.firm.clone())
        .collect();
    let unmatched_weight: f64 = holdings.iter().filter(|h| !h.is_matched()).map(|h| h.weight).sum();

    if !unmatched.is_empty() {
        tracing::warn!(
            "{} portfolio holdings ({:.1}% of weight) have no crash probability: {}",
            unmatched.len(),
            unmatched_weight * 100.0,
            unmatched.join(", ")
        );
    }

    let tier = StressTier::from_score(score);
    tracing::debug!("Portfolio stress {:.3} ({})", score, tier.name());

    StressReport {
        score,
        tier,
        holdings,
        unmatched,
        matched_weight,
        unmatched_weight,
    }
}
