//! Rain classifier
//!
//! A seeded train/test split, a gradient-boosted tree classifier and the
//! evaluation report, tied together by [`train_rain_classifier`].

pub mod evaluation;
pub mod gbm;
pub mod split;

pub use evaluation::{
    AverageMetrics, ClassMetrics, ClassificationReport, accuracy, classification_report,
};
pub use gbm::{GradientBoostingClassifier, TreeNode};
pub use split::{TrainTestSplit, test_size, train_test_split};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::Result;

/// Boosting hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every leaf weight
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum hessian sum of a child node
    pub min_child_weight: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.1,
            max_depth: 5,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
        }
    }
}

/// Held-out evaluation of a trained classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub n_train: usize,
    pub n_test: usize,
}

/// Split, fit on the training rows and evaluate on the held-out rows.
///
/// The split is deterministic for a given `seed`; fitting itself has no
/// randomness, so the whole run is reproducible.
#[instrument(skip(x, y, params), fields(rows = x.len()))]
pub fn train_rain_classifier(
    x: &[Vec<f64>],
    y: &[u8],
    test_fraction: f64,
    seed: u64,
    params: &ModelParams,
) -> Result<(GradientBoostingClassifier, TrainingMetrics)> {
    let split = train_test_split(x, y, test_fraction, seed)?;

    let mut model = GradientBoostingClassifier::new(params.clone());
    model.fit(&split.x_train, &split.y_train)?;

    let predictions = model.predict(&split.x_test)?;
    let report = classification_report(&split.y_test, &predictions)?;

    let metrics = TrainingMetrics {
        accuracy: report.accuracy,
        report,
        n_train: split.x_train.len(),
        n_test: split.x_test.len(),
    };

    info!(
        "Trained rain classifier on {} rows, test accuracy {:.2}% over {} rows",
        metrics.n_train,
        metrics.accuracy * 100.0,
        metrics.n_test
    );

    Ok((model, metrics))
}
