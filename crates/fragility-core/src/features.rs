//! Engineered feature vector shared by the crash classifier and its fallback.

use serde::{Deserialize, Serialize};

use crate::types::{PanelRecord, MAX_F_SCORE};

/// Number of engineered features per firm-year.
pub const N_FEATURES: usize = 5;

/// Projection of one panel row onto the model's input space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub hybrid_em: f64,
    pub peg: f64,
    /// `9 - F_Score`
    pub low_quality: i32,
    /// Debt/equity, passed through unchanged
    pub high_leverage: f64,
    /// Negated operating cash-flow growth
    pub weak_cashflow: f64,
}

impl FeatureVector {
    pub fn from_record(record: &PanelRecord) -> Self {
        Self {
            hybrid_em: record.hybrid_em,
            peg: record.peg,
            low_quality: MAX_F_SCORE - record.f_score,
            high_leverage: record.debt_equity,
            weak_cashflow: -record.cfo_growth,
        }
    }

    pub fn as_array(&self) -> [f64; N_FEATURES] {
        [
            self.hybrid_em,
            self.peg,
            self.low_quality as f64,
            self.high_leverage,
            self.weak_cashflow,
        ]
    }
}

/// One feature vector per record, in input row order.
///
/// Pure and stateless: callers slice the panel however they like (one
/// industry, one year, one firm) and call this on the slice.
pub fn build_features(records: &[PanelRecord]) -> Vec<FeatureVector> {
    records.iter().map(FeatureVector::from_record).collect()
}

/// Binary training label: realised Return below -30%.
pub fn crash_label(record: &PanelRecord) -> bool {
    record.is_crash()
}

/// Column-aligned matrix form used by the tree learner.
pub fn feature_matrix(features: &[FeatureVector]) -> Vec<[f64; N_FEATURES]> {
    features.iter().map(FeatureVector::as_array).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(f_score: i32, debt_equity: f64, cfo_growth: f64) -> PanelRecord {
        PanelRecord {
            firm: "Tesla".to_string(),
            industry: "EV".to_string(),
            year: 2020,
            hybrid_em: 1.7,
            peg: 2.4,
            f_score,
            debt_equity,
            cfo_growth,
            realized_return: 0.05,
        }
    }

    #[test]
    fn test_low_quality_complements_f_score() {
        for f_score in -2..=12 {
            let fv = FeatureVector::from_record(&record(f_score, 1.0, 0.0));
            assert_eq!(fv.low_quality + f_score, 9);
        }
    }

    #[test]
    fn test_leverage_passthrough_and_cashflow_negation() {
        let fv = FeatureVector::from_record(&record(5, 1.37, -0.12));
        assert_eq!(fv.high_leverage, 1.37);
        assert_eq!(fv.weak_cashflow, 0.12);
        assert_eq!(fv.as_array(), [1.7, 2.4, 4.0, 1.37, 0.12]);
    }

    #[test]
    fn test_row_order_preserved() {
        let records = vec![record(1, 0.1, 0.0), record(2, 0.2, 0.0), record(3, 0.3, 0.0)];
        let features = build_features(&records);
        let leverage: Vec<f64> = features.iter().map(|f| f.high_leverage).collect();
        assert_eq!(leverage, vec![0.1, 0.2, 0.3]);
        assert!(build_features(&[]).is_empty());
    }

    #[test]
    fn test_crash_label_is_strict() {
        let mut r = record(5, 1.0, 0.0);
        r.realized_return = -0.30;
        assert!(!crash_label(&r));
        r.realized_return = -0.31;
        assert!(crash_label(&r));
    }
}
