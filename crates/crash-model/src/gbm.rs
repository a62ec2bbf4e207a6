//! Gradient-boosted regression trees for binary classification.
//!
//! Log-loss boosting in the usual Friedman formulation:
//!
//! 1. Initialise the raw score with the prior log-odds `ln(p / (1 - p))`.
//! 2. Each stage fits a depth-limited regression tree to the residuals
//!    `y - sigmoid(F)` (variance-reduction splits).
//! 3. Leaves take a single Newton step: `sum(residual) / sum(p * (1 - p))`.
//! 4. `F += learning_rate * leaf_value`; the predicted probability is
//!    `sigmoid(F)`.
//!
//! Fitting is fully deterministic: no row or feature subsampling, and ties
//! between equally good splits resolve to the first candidate found.

use serde::{Deserialize, Serialize};

use fragility_core::N_FEATURES;

/// Hyper-parameters for [`GradientBoostedClassifier::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Minimum rows a node needs before it may be split
    pub min_samples_split: usize,
    /// Minimum rows on each side of a split
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A node in a regression tree, stored in a flat vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegressionNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree fitted to one boosting stage's residuals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<RegressionNode>,
}

/// Smallest variance reduction accepted as a real split.
const MIN_GAIN: f64 = 1e-12;

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit on `rows` with Newton leaves from `residuals` / `hessians`.
    fn fit(
        rows: &[[f64; N_FEATURES]],
        residuals: &[f64],
        hessians: &[f64],
        params: &BoostingParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let indices: Vec<usize> = (0..rows.len()).collect();
        tree.grow(rows, residuals, hessians, indices, 0, params);
        tree
    }

    fn grow(
        &mut self,
        rows: &[[f64; N_FEATURES]],
        residuals: &[f64],
        hessians: &[f64],
        indices: Vec<usize>,
        depth: usize,
        params: &BoostingParams,
    ) -> usize {
        let split = if depth < params.max_depth && indices.len() >= params.min_samples_split {
            best_split(rows, residuals, &indices, params.min_samples_leaf)
        } else {
            None
        };

        let Some(split) = split else {
            let node_idx = self.nodes.len();
            self.nodes.push(RegressionNode::Leaf {
                value: newton_leaf(residuals, hessians, &indices),
            });
            return node_idx;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| goes_left(rows[i][split.feature], split.threshold));

        let node_idx = self.nodes.len();
        self.nodes.push(RegressionNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });

        let left = self.grow(rows, residuals, hessians, left_idx, depth + 1, params);
        let right = self.grow(rows, residuals, hessians, right_idx, depth + 1, params);

        if let RegressionNode::Split {
            left: l, right: r, ..
        } = &mut self.nodes[node_idx]
        {
            *l = left;
            *r = right;
        }

        node_idx
    }

    /// Traverse the tree and return the leaf value.
    #[inline]
    pub fn predict(&self, features: &[f64; N_FEATURES]) -> f64 {
        let mut node_idx = 0usize;

        loop {
            match &self.nodes[node_idx] {
                RegressionNode::Leaf { value } => return *value,
                RegressionNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node_idx = if goes_left(features[*feature], *threshold) {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, node_idx: usize) -> usize {
        match &self.nodes[node_idx] {
            RegressionNode::Leaf { .. } => 0,
            RegressionNode::Split { left, right, .. } => {
                1 + self.depth_from(*left).max(self.depth_from(*right))
            }
        }
    }
}

/// NaN or `<= threshold` goes left.
#[inline]
fn goes_left(value: f64, threshold: f64) -> bool {
    value.is_nan() || value <= threshold
}

fn newton_leaf(residuals: &[f64], hessians: &[f64], indices: &[usize]) -> f64 {
    let numerator: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let denominator: f64 = indices.iter().map(|&i| hessians[i]).sum();
    if denominator.abs() < 1e-150 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Best variance-reduction split over all features, or `None` if no split
/// improves on the parent.
fn best_split(
    rows: &[[f64; N_FEATURES]],
    residuals: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let total: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let parent = total * total / n as f64;

    let mut best: Option<SplitCandidate> = None;
    let mut order: Vec<usize> = indices.to_vec();

    for feature in 0..N_FEATURES {
        order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += residuals[order[k - 1]];

            let prev = rows[order[k - 1]][feature];
            let next = rows[order[k]][feature];
            if !(prev < next) {
                continue;
            }
            if k < min_samples_leaf || n - k < min_samples_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / k as f64
                + right_sum * right_sum / (n - k) as f64
                - parent;

            if gain > MIN_GAIN && best.as_ref().map_or(true, |b| gain > b.gain) {
                let mut threshold = (prev + next) / 2.0;
                if threshold >= next || !threshold.is_finite() {
                    threshold = prev;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Binary gradient-boosted classifier. Immutable once fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    init_score: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostedClassifier {
    /// Fit on a feature matrix and binary labels.
    ///
    /// Returns `None` when the labels do not contain both classes (or the
    /// inputs are empty or misaligned): the log-odds prior is undefined and
    /// there is nothing to learn.
    pub fn fit(
        rows: &[[f64; N_FEATURES]],
        labels: &[bool],
        params: &BoostingParams,
    ) -> Option<Self> {
        if rows.is_empty() || rows.len() != labels.len() {
            return None;
        }

        let y: Vec<f64> = labels.iter().map(|&l| if l { 1.0 } else { 0.0 }).collect();
        let positives = y.iter().sum::<f64>();
        if positives == 0.0 || positives == y.len() as f64 {
            return None;
        }

        let prior = positives / y.len() as f64;
        let init_score = (prior / (1.0 - prior)).ln();
        let mut raw = vec![init_score; rows.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut residuals = vec![0.0; rows.len()];
        let mut hessians = vec![0.0; rows.len()];

        for _ in 0..params.n_estimators {
            for i in 0..rows.len() {
                let p = sigmoid(raw[i]);
                residuals[i] = y[i] - p;
                hessians[i] = p * (1.0 - p);
            }

            let tree = RegressionTree::fit(rows, &residuals, &hessians, params);
            for (i, row) in rows.iter().enumerate() {
                raw[i] += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Some(Self {
            init_score,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    /// Raw additive score (log-odds) for one row.
    pub fn decision_function(&self, features: &[f64; N_FEATURES]) -> f64 {
        self.init_score
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict(features))
                .sum::<f64>()
    }

    /// Probability of the positive class for one row.
    pub fn predict_proba(&self, features: &[f64; N_FEATURES]) -> f64 {
        sigmoid(self.decision_function(features))
    }

    /// Number of boosting stages.
    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(x0: f64, x1: f64) -> [f64; N_FEATURES] {
        [x0, x1, 0.0, 0.0, 0.0]
    }

    #[test]
    fn test_single_class_is_rejected() {
        let rows = vec![row(1.0, 0.0), row(2.0, 0.0)];
        let params = BoostingParams::default();
        assert!(GradientBoostedClassifier::fit(&rows, &[false, false], &params).is_none());
        assert!(GradientBoostedClassifier::fit(&rows, &[true, true], &params).is_none());
        assert!(GradientBoostedClassifier::fit(&[], &[], &params).is_none());
        assert!(GradientBoostedClassifier::fit(&rows, &[true], &params).is_none());
    }

    #[test]
    fn test_zero_stages_returns_prior() {
        let rows = vec![row(1.0, 0.0), row(2.0, 0.0), row(3.0, 0.0), row(4.0, 0.0)];
        let labels = [false, false, false, true];
        let params = BoostingParams {
            n_estimators: 0,
            ..BoostingParams::default()
        };
        let model = GradientBoostedClassifier::fit(&rows, &labels, &params).unwrap();
        assert_relative_eq!(model.predict_proba(&row(10.0, 0.0)), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_separable_threshold_is_learned() {
        let rows: Vec<[f64; N_FEATURES]> = (0..20).map(|i| row(i as f64, (i % 3) as f64)).collect();
        let labels: Vec<bool> = (0..20).map(|i| i >= 14).collect();

        let model =
            GradientBoostedClassifier::fit(&rows, &labels, &BoostingParams::default()).unwrap();
        assert_eq!(model.n_estimators(), 100);

        for (r, &l) in rows.iter().zip(labels.iter()) {
            let p = model.predict_proba(r);
            assert!((0.0..=1.0).contains(&p));
            if l {
                assert!(p > 0.9, "crash row scored {}", p);
            } else {
                assert!(p < 0.1, "calm row scored {}", p);
            }
        }
    }

    #[test]
    fn test_tree_depth_is_bounded() {
        let rows: Vec<[f64; N_FEATURES]> = (0..64)
            .map(|i| [i as f64, (i * 7 % 13) as f64, (i % 5) as f64, (i % 2) as f64, 0.0])
            .collect();
        let labels: Vec<bool> = (0..64).map(|i| (i * 7 % 13) > 6).collect();
        let params = BoostingParams {
            n_estimators: 5,
            max_depth: 2,
            ..BoostingParams::default()
        };

        let model = GradientBoostedClassifier::fit(&rows, &labels, &params).unwrap();
        assert!(model.trees().iter().all(|t| t.depth() <= 2));
    }

    #[test]
    fn test_fitting_is_deterministic() {
        let rows: Vec<[f64; N_FEATURES]> = (0..30)
            .map(|i| [(i % 7) as f64, (i % 4) as f64, (i % 9) as f64, 0.5, -0.1])
            .collect();
        let labels: Vec<bool> = (0..30).map(|i| i % 7 >= 5).collect();

        let a = GradientBoostedClassifier::fit(&rows, &labels, &BoostingParams::default()).unwrap();
        let b = GradientBoostedClassifier::fit(&rows, &labels, &BoostingParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nan_goes_left() {
        let rows = vec![row(1.0, 0.0), row(2.0, 0.0), row(8.0, 0.0), row(9.0, 0.0)];
        let labels = [false, false, true, true];
        let params = BoostingParams {
            n_estimators: 10,
            ..BoostingParams::default()
        };
        let model = GradientBoostedClassifier::fit(&rows, &labels, &params).unwrap();

        let nan_row = row(f64::NAN, 0.0);
        assert_relative_eq!(
            model.predict_proba(&nan_row),
            model.predict_proba(&row(1.0, 0.0)),
            epsilon = 1e-12
        );
    }
}
