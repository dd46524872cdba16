//! Capability contract for the per-tree base classifier.

use crate::matrix::Matrix;

/// Per-tree information handed to the base learner at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitContext {
    /// Index of the tree being trained.
    pub tree_index: usize,
    /// Seed for the learner's own randomness (same value the sampler used).
    pub seed: u64,
    /// Number of classes in the forest's registry. Probability outputs must
    /// have exactly this many columns, even if the slice lacks some classes.
    pub n_classes: usize,
    /// Depth limit from the ensemble config, if any.
    pub max_depth: Option<usize>,
}

/// A trainer that fits one classifier to one resampled data slice.
///
/// Labels arrive encoded as registry indices in `0..context.n_classes`.
pub trait BaseLearner: Sync {
    /// The fitted classifier.
    type Model: Classifier;
    /// Error returned when fitting fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fit a classifier on `features` (rows × sampled columns) and `labels`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the forest wraps any error with the tree index.
    fn fit(
        &self,
        features: &Matrix,
        labels: &[usize],
        context: &FitContext,
    ) -> Result<Self::Model, Self::Error>;
}

/// A fitted classifier that predicts class probabilities.
pub trait Classifier: Send + Sync {
    /// Error returned when prediction fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Return a `(rows, n_classes)` matrix of probabilities for `features`,
    /// whose columns are the ones this model was trained on, in the same order.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the forest wraps any error with the tree index.
    fn predict_proba(&self, features: &Matrix) -> Result<Matrix, Self::Error>;
}
