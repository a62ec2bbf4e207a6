use serde::{Deserialize, Serialize};

use crash_model::ModelKind;
use fragility_core::PanelRecord;

use crate::metrics::EvaluationMetrics;

/// Minimum cumulative training rows before a year is tested.
pub const MIN_TRAIN_ROWS: usize = 10;

/// A test-year row with its out-of-sample crash probability attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRow {
    #[serde(flatten)]
    pub record: PanelRecord,
    #[serde(rename = "Predicted_Prob")]
    pub predicted_prob: f64,
}

/// One retained walk-forward iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestYear {
    pub year: i32,
    pub train_rows: usize,
    pub test_rows: usize,
    pub model_kind: ModelKind,
    pub metrics: EvaluationMetrics,
}

/// Why a candidate test year was left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Fewer than [`MIN_TRAIN_ROWS`] rows precede the year
    InsufficientHistory { train_rows: usize },
    EmptyTestSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedYear {
    pub year: i32,
    pub reason: SkipReason,
}

/// Concatenated out-of-sample predictions plus per-year evaluation.
///
/// `rows` is empty when no year had enough history. Callers must check
/// [`BacktestOutput::is_empty`] before charting or summarising.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub rows: Vec<ScoredRow>,
    pub years: Vec<BacktestYear>,
    pub skipped: Vec<SkippedYear>,
    /// Metrics across every retained row; `None` when nothing was retained
    pub overall: Option<EvaluationMetrics>,
}

impl BacktestOutput {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// (Firm, Year) keys of every scored row, in output order.
    pub fn keys(&self) -> Vec<(String, i32)> {
        self.rows
            .iter()
            .map(|r| (r.record.firm.clone(), r.record.year))
            .collect()
    }

    pub fn tested_years(&self) -> Vec<i32> {
        self.years.iter().map(|y| y.year).collect()
    }
}
