use rayon::prelude::*;

use crash_model::{train_model, BoostingParams, ModelKind};
use fragility_core::{build_features, Panel, Result};

use crate::metrics::EvaluationMetrics;
use crate::models::*;

/// Expanding-window walk-forward evaluation of the crash model.
///
/// For every year but the last, a fresh model is trained on all earlier
/// rows and scores that year's rows. Iterations share no state, so they run
/// on the rayon pool; output is always in ascending year order.
#[derive(Debug, Clone)]
pub struct WalkForwardBacktest {
    params: BoostingParams,
    min_train_rows: usize,
}

impl Default for WalkForwardBacktest {
    fn default() -> Self {
        Self::new(BoostingParams::default())
    }
}

struct Fold {
    year: i32,
    train: Panel,
    test: Panel,
}

struct FoldResult {
    rows: Vec<ScoredRow>,
    summary: BacktestYear,
}

impl WalkForwardBacktest {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            min_train_rows: MIN_TRAIN_ROWS,
        }
    }

    pub fn with_min_train_rows(mut self, min_train_rows: usize) -> Self {
        self.min_train_rows = min_train_rows;
        self
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }

    pub fn run(&self, panel: &Panel) -> Result<BacktestOutput> {
        let years = panel.years();
        let candidates = years.split_last().map(|(_, rest)| rest).unwrap_or(&[]);

        let mut folds = Vec::new();
        let mut skipped = Vec::new();
        for &year in candidates {
            let train = panel.before_year(year);
            let test = panel.for_year(year);

            if train.len() < self.min_train_rows {
                tracing::warn!(
                    "Skipping backtest year {}: only {} training rows (need {})",
                    year,
                    train.len(),
                    self.min_train_rows
                );
                skipped.push(SkippedYear {
                    year,
                    reason: SkipReason::InsufficientHistory {
                        train_rows: train.len(),
                    },
                });
                continue;
            }
            if test.is_empty() {
                tracing::warn!("Skipping backtest year {}: no test rows", year);
                skipped.push(SkippedYear {
                    year,
                    reason: SkipReason::EmptyTestSet,
                });
                continue;
            }

            folds.push(Fold { year, train, test });
        }

        let results: Vec<FoldResult> = folds
            .par_iter()
            .map(|fold| self.run_fold(fold))
            .collect::<Result<Vec<_>>>()?;

        let mut output = BacktestOutput {
            skipped,
            ..Default::default()
        };
        for result in results {
            output.rows.extend(result.rows);
            output.years.push(result.summary);
        }

        if !output.is_empty() {
            output.overall = Some(EvaluationMetrics::evaluate(
                &output.rows,
                common_kind(&output.years),
            ));
        }

        tracing::info!(
            "Backtest complete: {} years tested, {} skipped, {} rows scored",
            output.years.len(),
            output.skipped.len(),
            output.rows.len()
        );

        Ok(output)
    }

    fn run_fold(&self, fold: &Fold) -> Result<FoldResult> {
        let train_features = build_features(fold.train.records());
        let model = train_model(fold.train.records(), &train_features, &self.params)?;

        let probs = model.predict_records(fold.test.records());
        let rows: Vec<ScoredRow> = fold
            .test
            .iter()
            .zip(probs)
            .map(|(record, predicted_prob)| ScoredRow {
                record: record.clone(),
                predicted_prob,
            })
            .collect();

        tracing::debug!(
            "Backtest year {}: {} train / {} test rows ({})",
            fold.year,
            fold.train.len(),
            rows.len(),
            model.kind().name()
        );

        let metrics = EvaluationMetrics::evaluate(&rows, Some(model.kind()));
        Ok(FoldResult {
            summary: BacktestYear {
                year: fold.year,
                train_rows: fold.train.len(),
                test_rows: rows.len(),
                model_kind: model.kind(),
                metrics,
            },
            rows,
        })
    }
}

/// Expanding-window backtest with default boosting parameters.
pub fn run_backtest(panel: &Panel) -> Result<BacktestOutput> {
    WalkForwardBacktest::default().run(panel)
}

fn common_kind(years: &[BacktestYear]) -> Option<ModelKind> {
    let first = years.first()?.model_kind;
    years
        .iter()
        .all(|y| y.model_kind == first)
        .then_some(first)
}
