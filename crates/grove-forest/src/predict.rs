//! Prediction methods for the forest ensemble.

use tracing::{debug, instrument};

use crate::error::ForestError;
use crate::forest::{RandomForest, worker_failure};
use crate::learner::{BaseLearner, Classifier};
use crate::matrix::Matrix;
use crate::pool::WorkerPool;

/// Return the index of the first maximum in `row`.
///
/// Ties go to the lowest index; NaN entries never win.
#[must_use]
pub(crate) fn first_argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &p) in row.iter().enumerate().skip(1) {
        if p > row[best] || row[best].is_nan() {
            best = i;
        }
    }
    best
}

impl<B: BaseLearner, L: Clone> RandomForest<B, L> {
    /// Return the mean class probabilities across all trees.
    ///
    /// The result has shape `(features.n_rows(), n_classes)`; column `j`
    /// corresponds to `classes().classes()[j]`. Trees are summed in slot
    /// order, so the output does not depend on `worker_limit`.
    ///
    /// # Errors
    ///
    /// | Variant                                     | When                                      |
    /// |---------------------------------------------|-------------------------------------------|
    /// | [`ForestError::NotFitted`]                  | no successful fit yet                     |
    /// | [`ForestError::PredictionFeatureMismatch`]  | column count differs from fit time        |
    /// | [`ForestError::InvalidWorkerLimit`]         | `worker_limit` is zero                    |
    /// | [`ForestError::WorkerFailure`]              | a tree's `predict_proba` failed           |
    /// | [`ForestError::ProbabilityShapeMismatch`]   | a tree returned a misaligned matrix       |
    #[instrument(skip_all, fields(n_samples = features.n_rows()))]
    pub fn predict_proba(
        &self,
        features: &Matrix,
        worker_limit: usize,
    ) -> Result<Matrix, ForestError> {
        let fitted = self.fitted()?;
        if features.n_cols() != fitted.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: fitted.n_features,
                got: features.n_cols(),
            });
        }
        let pool = WorkerPool::new(worker_limit)?;

        let units: Vec<_> = fitted
            .slots
            .iter()
            .map(|slot| {
                move || {
                    let x = features.select_columns(&slot.feature_indices);
                    slot.model.predict_proba(&x)
                }
            })
            .collect();

        let per_tree = pool.run_parallel(units).map_err(worker_failure)?;

        let n_rows = features.n_rows();
        let n_classes = fitted.classes.len();
        let mut mean = Matrix::zeros(n_rows, n_classes);
        for (tree_index, proba) in per_tree.iter().enumerate() {
            if proba.n_rows() != n_rows || proba.n_cols() != n_classes {
                return Err(ForestError::ProbabilityShapeMismatch {
                    tree_index,
                    expected_rows: n_rows,
                    expected_cols: n_classes,
                    got_rows: proba.n_rows(),
                    got_cols: proba.n_cols(),
                });
            }
            mean.add_assign(proba);
        }
        mean.divide(per_tree.len() as f64);

        debug!(n_trees = per_tree.len(), n_classes, "probabilities averaged");
        Ok(mean)
    }

    /// Predict one class label per row.
    ///
    /// Picks the class with the highest mean probability; ties go to the
    /// class that sorts first.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict_proba`].
    pub fn predict(&self, features: &Matrix, worker_limit: usize) -> Result<Vec<L>, ForestError> {
        self.predict_with_proba(features, worker_limit)
            .map(|(labels, _)| labels)
    }

    /// Return both the predicted labels and the mean probabilities they
    /// were chosen from, with a single pass over the trees.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::predict_proba`].
    pub fn predict_with_proba(
        &self,
        features: &Matrix,
        worker_limit: usize,
    ) -> Result<(Vec<L>, Matrix), ForestError> {
        let proba = self.predict_proba(features, worker_limit)?;
        let classes = self.fitted()?.classes.classes();
        let labels = proba
            .rows()
            .map(|row| classes[first_argmax(row)].clone())
            .collect();
        Ok((labels, proba))
    }
}
