use fragility_core::FeatureVector;

/// Weights of the deterministic crash score, in the order
/// Hybrid_EM, PEG, High_Leverage, Weak_Cashflow.
pub const HEURISTIC_WEIGHTS: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

/// Unnormalised heuristic score for one row. Low_Quality is not an input.
pub fn heuristic_raw_score(features: &FeatureVector) -> f64 {
    HEURISTIC_WEIGHTS[0] * features.hybrid_em
        + HEURISTIC_WEIGHTS[1] * features.peg
        + HEURISTIC_WEIGHTS[2] * features.high_leverage
        + HEURISTIC_WEIGHTS[3] * features.weak_cashflow
}

/// Per-driver contributions to the raw score, labelled for reporting.
pub fn heuristic_contributions(features: &FeatureVector) -> [(&'static str, f64); 4] {
    [
        ("earnings_manipulation", HEURISTIC_WEIGHTS[0] * features.hybrid_em),
        ("valuation", HEURISTIC_WEIGHTS[1] * features.peg),
        ("leverage", HEURISTIC_WEIGHTS[2] * features.high_leverage),
        ("weak_cashflow", HEURISTIC_WEIGHTS[3] * features.weak_cashflow),
    ]
}

/// Heuristic scores for a batch, divided by the batch maximum.
///
/// The top-scoring row lands on exactly 1.0 whenever the batch maximum is
/// positive. Scores below zero are clamped to 0.0, and a batch whose maximum
/// is not positive scores 0.0 throughout. Non-finite raw scores count as 0.0.
pub fn heuristic_scores(batch: &[FeatureVector]) -> Vec<f64> {
    let raw: Vec<f64> = batch
        .iter()
        .map(heuristic_raw_score)
        .map(|s| if s.is_finite() { s } else { 0.0 })
        .collect();

    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(max > 0.0) {
        return vec![0.0; raw.len()];
    }

    raw.into_iter().map(|s| (s / max).clamp(0.0, 1.0)).collect()
}
