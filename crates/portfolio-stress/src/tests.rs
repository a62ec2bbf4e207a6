use approx::assert_relative_eq;

use fragility_core::PortfolioEntry;

use crate::aggregator::aggregate_stress;
use crate::models::*;

fn probs(pairs: &[(&str, f64)]) -> Vec<FirmProbability> {
    pairs.iter().map(|(f, p)| FirmProbability::new(*f, *p)).collect()
}

#[test]
fn test_equal_weight_portfolio_is_severe() {
    let portfolio = vec![PortfolioEntry::new("A", 0.5), PortfolioEntry::new("B", 0.5)];
    let report = aggregate_stress(&portfolio, &probs(&[("A", 0.8), ("B", 0.2)]));

    assert_relative_eq!(report.holdings[0].weighted_risk.unwrap(), 0.4);
    assert_relative_eq!(report.holdings[1].weighted_risk.unwrap(), 0.1);
    assert_relative_eq!(report.score, 0.5);
    assert_eq!(report.tier, StressTier::Severe);
    assert_eq!(report.tier.name(), "Severe Stress");
    assert!(!report.has_unmatched());
}

#[test]
fn test_unmatched_holding_is_excluded_and_reported() {
    let portfolio = vec![PortfolioEntry::new("A", 0.6), PortfolioEntry::new("Z", 0.4)];
    let report = aggregate_stress(&portfolio, &probs(&[("A", 0.9)]));

    assert_relative_eq!(report.score, 0.54, epsilon = 1e-12);
    assert_eq!(report.tier, StressTier::Severe);
    assert_eq!(report.unmatched, vec!["Z".to_string()]);
    assert_relative_eq!(report.matched_weight, 0.6);
    assert_relative_eq!(report.unmatched_weight, 0.4);

    // unmatched rows stay in the detail table with no risk attached
    assert_eq!(report.holdings.len(), 2);
    assert_eq!(report.holdings[1].crash_probability, None);
    assert_eq!(report.holdings[1].weighted_risk, None);
}

#[test]
fn test_tier_boundaries_are_strict() {
    assert_eq!(StressTier::from_score(0.45), StressTier::Elevated);
    assert_eq!(StressTier::from_score(0.4501), StressTier::Severe);
    assert_eq!(StressTier::from_score(0.25), StressTier::Low);
    assert_eq!(StressTier::from_score(0.2501), StressTier::Elevated);
    assert_eq!(StressTier::from_score(0.0), StressTier::Low);
}

#[test]
fn test_weights_are_not_normalised() {
    let portfolio = vec![PortfolioEntry::new("A", 2.0)];
    let report = aggregate_stress(&portfolio, &probs(&[("A", 0.3)]));
    assert_relative_eq!(report.score, 0.6);
}

#[test]
fn test_duplicate_probability_uses_first() {
    let portfolio = vec![PortfolioEntry::new("A", 1.0)];
    let report = aggregate_stress(&portfolio, &probs(&[("A", 0.2), ("A", 0.9)]));
    assert_relative_eq!(report.score, 0.2);
}

#[test]
fn test_empty_portfolio() {
    let report = aggregate_stress(&[], &probs(&[("A", 0.9)]));
    assert_eq!(report.score, 0.0);
    assert_eq!(report.tier, StressTier::Low);
    assert!(report.holdings.is_empty());
}

#[test]
fn test_top_contributors_order() {
    let portfolio = vec![
        PortfolioEntry::new("A", 0.2),
        PortfolioEntry::new("B", 0.5),
        PortfolioEntry::new("C", 0.3),
    ];
    let report = aggregate_stress(&portfolio, &probs(&[("A", 0.9), ("B", 0.1)]));
    let order: Vec<&str> = report.top_contributors().iter().map(|h| h.firm.as_str()).collect();
    assert_eq!(order, vec!["A", "B"]);
}
