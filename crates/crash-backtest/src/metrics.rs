//! Out-of-sample evaluation of crash probabilities against realised outcomes.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crash_model::ModelKind;
use fragility_core::stats::{mean, share};

use crate::models::ScoredRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub n: usize,
    /// Share of rows with Return below the crash threshold
    pub crash_rate: f64,
    pub mean_predicted: f64,
    /// Mean squared error of the probability against the 0/1 crash label
    pub brier_score: f64,
    /// Pearson correlation of probability with realised Return; `None` when
    /// either side has no variance
    pub return_correlation: Option<f64>,
    /// Model path that produced the probabilities; `None` when mixed
    pub model_kind: Option<ModelKind>,
}

impl EvaluationMetrics {
    pub fn evaluate(rows: &[ScoredRow], model_kind: Option<ModelKind>) -> Self {
        let probs: Vec<f64> = rows.iter().map(|r| r.predicted_prob).collect();
        let returns: Vec<f64> = rows.iter().map(|r| r.record.realized_return).collect();

        Self {
            n: rows.len(),
            crash_rate: share(rows.iter().map(|r| r.record.is_crash())),
            mean_predicted: mean(&probs),
            brier_score: brier_score(rows),
            return_correlation: pearson(&probs, &returns),
            model_kind,
        }
    }
}

pub fn brier_score(rows: &[ScoredRow]) -> f64 {
    let errors: Vec<f64> = rows
        .iter()
        .map(|r| {
            let label = if r.record.is_crash() { 1.0 } else { 0.0 };
            (r.predicted_prob - label).powi(2)
        })
        .collect();
    mean(&errors)
}

/// Sample Pearson correlation, or `None` for fewer than two points or a
/// constant series.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let sd_x = x.iter().std_dev();
    let sd_y = y.iter().std_dev();
    if !(sd_x > 0.0) || !(sd_y > 0.0) {
        return None;
    }

    let r = x.iter().covariance(y.iter()) / (sd_x * sd_y);
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fragility_core::PanelRecord;

    fn scored(ret: f64, prob: f64) -> ScoredRow {
        ScoredRow {
            record: PanelRecord {
                firm: "A".to_string(),
                industry: "AI".to_string(),
                year: 2020,
                hybrid_em: 1.0,
                peg: 1.0,
                f_score: 5,
                debt_equity: 1.0,
                cfo_growth: 0.0,
                realized_return: ret,
            },
            predicted_prob: prob,
        }
    }

    #[test]
    fn test_brier_score() {
        // crash row predicted 0.8 -> 0.04; calm row predicted 0.4 -> 0.16
        let rows = vec![scored(-0.5, 0.8), scored(0.1, 0.4)];
        assert_relative_eq!(brier_score(&rows), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let r = pearson(&[0.9, 0.5, 0.1], &[-0.4, 0.0, 0.4]).unwrap();
        assert_relative_eq!(r, -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pearson_constant_is_none() {
        assert!(pearson(&[0.5, 0.5, 0.5], &[0.1, 0.2, 0.3]).is_none());
        assert!(pearson(&[0.5], &[0.1]).is_none());
    }

    #[test]
    fn test_evaluate() {
        let rows = vec![scored(-0.5, 0.9), scored(0.2, 0.1), scored(0.1, 0.2), scored(-0.4, 0.7)];
        let m = EvaluationMetrics::evaluate(&rows, Some(ModelKind::Trained));
        assert_eq!(m.n, 4);
        assert_relative_eq!(m.crash_rate, 0.5);
        assert_relative_eq!(m.mean_predicted, 0.475, epsilon = 1e-12);
        assert!(m.return_correlation.unwrap() < 0.0);
        assert_eq!(m.model_kind, Some(ModelKind::Trained));
    }
}
