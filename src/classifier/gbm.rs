//! Gradient-boosted regression trees with logistic loss

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ModelParams;
use crate::{Result, WeatherInsightsError};

/// Node of a boosted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Margin contribution, already scaled by the learning rate
    Leaf { weight: f64 },
    /// Rows with `row[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { weight } => *weight,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if row[*feature] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    #[must_use]
    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Binary classifier trained by second-order boosting of regression trees.
///
/// Each round fits a tree to the gradient `p - y` and hessian `p(1 - p)` of
/// the logistic loss; leaves hold `-G / (H + lambda)` scaled by the learning
/// rate. Fitting is deterministic: no row or column subsampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    params: ModelParams,
    base_margin: f64,
    trees: Vec<TreeNode>,
    n_features: Option<usize>,
    feature_importances: Vec<f64>,
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

impl GradientBoostingClassifier {
    #[must_use]
    pub fn new(params: ModelParams) -> Self {
        Self {
            params,
            base_margin: 0.0,
            trees: Vec::new(),
            n_features: None,
            feature_importances: Vec::new(),
        }
    }

    #[must_use]
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }

    #[must_use]
    pub fn trees(&self) -> &[TreeNode] {
        &self.trees
    }

    /// Total split gain per feature, normalized to sum to 1 when any split
    /// was made
    #[must_use]
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Fit on rows `x` with binary targets `y`. Refitting discards the
    /// previous trees.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<()> {
        let n_features = validate_training_data(x, y)?;
        let targets: Vec<f64> = y.iter().map(|&t| f64::from(t)).collect();

        self.trees.clear();
        self.feature_importances = vec![0.0; n_features];
        let mut margins = vec![self.base_margin; x.len()];
        let indices: Vec<usize> = (0..x.len()).collect();

        for round in 0..self.params.n_estimators {
            let mut gradients = Vec::with_capacity(x.len());
            let mut hessians = Vec::with_capacity(x.len());
            for (&margin, &target) in margins.iter().zip(&targets) {
                let p = sigmoid(margin);
                gradients.push(p - target);
                hessians.push(p * (1.0 - p));
            }

            let tree = self.build_tree(x, &gradients, &hessians, &indices, 0);
            for (margin, row) in margins.iter_mut().zip(x) {
                *margin += tree.predict(row);
            }
            if round == 0 {
                debug!(
                    "First tree: depth {}, {} leaves",
                    tree.depth(),
                    tree.n_leaves()
                );
            }
            self.trees.push(tree);
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for importance in &mut self.feature_importances {
                *importance /= total;
            }
        }

        self.n_features = Some(n_features);
        debug!(
            "Fitted {} trees on {} rows x {} features",
            self.trees.len(),
            x.len(),
            n_features
        );
        Ok(())
    }

    fn leaf_weight(&self, gradient_sum: f64, hessian_sum: f64) -> f64 {
        -gradient_sum / (hessian_sum + self.params.reg_lambda) * self.params.learning_rate
    }

    fn build_tree(
        &mut self,
        x: &[Vec<f64>],
        gradients: &[f64],
        hessians: &[f64],
        indices: &[usize],
        depth: usize,
    ) -> TreeNode {
        let gradient_sum: f64 = indices.iter().map(|&i| gradients[i]).sum();
        let hessian_sum: f64 = indices.iter().map(|&i| hessians[i]).sum();
        let leaf = TreeNode::Leaf {
            weight: self.leaf_weight(gradient_sum, hessian_sum),
        };

        if depth >= self.params.max_depth || indices.len() < 2 {
            return leaf;
        }

        let Some(best) = self.find_best_split(x, gradients, hessians, indices) else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[i][best.feature] <= best.threshold);

        self.feature_importances[best.feature] += best.gain;

        let left = self.build_tree(x, gradients, hessians, &left_idx, depth + 1);
        let right = self.build_tree(x, gradients, hessians, &right_idx, depth + 1);

        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn find_best_split(
        &self,
        x: &[Vec<f64>],
        gradients: &[f64],
        hessians: &[f64],
        indices: &[usize],
    ) -> Option<SplitCandidate> {
        let lambda = self.params.reg_lambda;
        let min_child_weight = self.params.min_child_weight;

        let gradient_sum: f64 = indices.iter().map(|&i| gradients[i]).sum();
        let hessian_sum: f64 = indices.iter().map(|&i| hessians[i]).sum();
        let parent_score = gradient_sum * gradient_sum / (hessian_sum + lambda);

        let n_features = x[indices[0]].len();
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..n_features {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left_gradient = 0.0;
            let mut left_hessian = 0.0;

            for pair in sorted.windows(2) {
                let (current, next) = (pair[0], pair[1]);
                left_gradient += gradients[current];
                left_hessian += hessians[current];

                let value = x[current][feature];
                let next_value = x[next][feature];
                if value >= next_value {
                    continue;
                }

                let right_gradient = gradient_sum - left_gradient;
                let right_hessian = hessian_sum - left_hessian;
                if left_hessian < min_child_weight || right_hessian < min_child_weight {
                    continue;
                }

                let gain = 0.5
                    * (left_gradient * left_gradient / (left_hessian + lambda)
                        + right_gradient * right_gradient / (right_hessian + lambda)
                        - parent_score);

                if gain > 1e-12 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    let mut threshold = value + (next_value - value) / 2.0;
                    if threshold >= next_value {
                        threshold = value;
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

    fn check_input(&self, x: &[Vec<f64>]) -> Result<usize> {
        let n_features = self
            .n_features
            .ok_or_else(|| WeatherInsightsError::model("Model has not been trained"))?;
        if let Some(row) = x.iter().find(|row| row.len() != n_features) {
            return Err(WeatherInsightsError::model(format!(
                "Expected {} features per row, got {}",
                n_features,
                row.len()
            )));
        }
        Ok(n_features)
    }

    /// Probability of rain for each row
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        self.check_input(x)?;
        Ok(x
            .iter()
            .map(|row| {
                let margin = self.base_margin
                    + self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>();
                sigmoid(margin)
            })
            .collect())
    }

    /// Class (0 or 1) for each row; rain when its probability exceeds 0.5
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }
}

fn validate_training_data(x: &[Vec<f64>], y: &[u8]) -> Result<usize> {
    if x.is_empty() {
        return Err(WeatherInsightsError::model("Cannot fit on an empty dataset"));
    }
    if x.len() != y.len() {
        return Err(WeatherInsightsError::model(format!(
            "Feature rows ({}) and targets ({}) differ in length",
            x.len(),
            y.len()
        )));
    }
    let n_features = x[0].len();
    if x.iter().any(|row| row.len() != n_features) {
        return Err(WeatherInsightsError::model(
            "All feature rows must have the same length",
        ));
    }
    if x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(WeatherInsightsError::model(
            "Feature values must be finite",
        ));
    }
    if let Some(bad) = y.iter().find(|&&t| t > 1) {
        return Err(WeatherInsightsError::model(format!(
            "Targets must be 0 or 1, got {bad}"
        )));
    }
    Ok(n_features)
}
