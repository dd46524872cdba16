//! Forest coordinator: seeded sampling, parallel training, fitted state.

use tracing::{debug, info, instrument};

use crate::config::EnsembleConfig;
use crate::error::ForestError;
use crate::learner::{BaseLearner, FitContext};
use crate::matrix::Matrix;
use crate::pool::{UnitFailure, WorkerPool};
use crate::registry::ClassRegistry;
use crate::sampler::{self, tree_seed};

/// One trained tree and the feature columns it was trained on.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TreeSlot<M> {
    pub(crate) model: M,
    pub(crate) feature_indices: Vec<usize>,
}

impl<M> TreeSlot<M> {
    /// Borrow the trained model.
    #[must_use]
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Return the feature columns this tree reads, in training order.
    #[must_use]
    pub fn feature_indices(&self) -> &[usize] {
        &self.feature_indices
    }
}

/// Everything a successful fit produces. Replaced as a whole on re-fit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct FittedForest<M, L> {
    pub(crate) slots: Vec<TreeSlot<M>>,
    pub(crate) classes: ClassRegistry<L>,
    pub(crate) n_features: usize,
}

/// A bagged ensemble of base classifiers.
///
/// Each tree sees a bootstrap resample of the rows and `max_features`
/// randomly chosen columns. Training and prediction fan out over a bounded
/// worker pool; probabilities are averaged across trees.
pub struct RandomForest<B: BaseLearner, L> {
    pub(crate) config: EnsembleConfig,
    pub(crate) learner: B,
    pub(crate) fitted: Option<FittedForest<B::Model, L>>,
}

/// Wrap a failed unit as a [`ForestError::WorkerFailure`].
pub(crate) fn worker_failure<E>(failure: UnitFailure<E>) -> ForestError
where
    E: std::error::Error + Send + Sync + 'static,
{
    ForestError::WorkerFailure {
        tree_index: failure.index,
        source: Box::new(failure.error),
    }
}

impl<B: BaseLearner, L: Ord + Clone> RandomForest<B, L> {
    /// Create an unfitted forest.
    #[must_use]
    pub fn new(config: EnsembleConfig, learner: B) -> Self {
        Self {
            config,
            learner,
            fitted: None,
        }
    }

    /// Train every tree on its own bootstrap slice.
    ///
    /// Replaces any previous fit only when every tree trains successfully;
    /// on error the previous fitted state is left untouched.
    ///
    /// # Errors
    ///
    /// | Variant                                     | When                                  |
    /// |---------------------------------------------|---------------------------------------|
    /// | [`ForestError::LabelCountMismatch`]         | `labels.len() != features.n_rows()`   |
    /// | [`ForestError::EmptyDataset`]               | zero rows                             |
    /// | [`ForestError::ZeroFeatures`]               | zero columns                          |
    /// | [`ForestError::MaxFeaturesExceedsFeatures`] | `max_features > features.n_cols()`    |
    /// | [`ForestError::InvalidWorkerLimit`]         | `worker_limit` is zero                |
    /// | [`ForestError::WorkerFailure`]              | the base learner failed on any tree   |
    #[instrument(skip_all, fields(n_trees = self.config.n_trees, n_samples = features.n_rows()))]
    pub fn fit(
        &mut self,
        features: &Matrix,
        labels: &[L],
        worker_limit: usize,
    ) -> Result<(), ForestError> {
        let n_samples = features.n_rows();
        let n_features = features.n_cols();

        // --- Validate before dispatching anything ---
        if labels.len() != n_samples {
            return Err(ForestError::LabelCountMismatch {
                n_rows: n_samples,
                n_labels: labels.len(),
            });
        }
        if n_samples == 0 {
            return Err(ForestError::EmptyDataset);
        }
        if n_features == 0 {
            return Err(ForestError::ZeroFeatures);
        }
        self.config.validate_for(n_features)?;
        let pool = WorkerPool::new(worker_limit)?;

        let (classes, encoded) = ClassRegistry::build(labels);
        let n_classes = classes.len();

        info!(
            n_trees = self.config.n_trees,
            n_samples,
            n_features,
            n_classes,
            max_features = self.config.max_features,
            worker_limit,
            "training forest"
        );

        let slices = (0..self.config.n_trees)
            .map(|tree_index| {
                sampler::plan(
                    tree_index,
                    n_samples,
                    n_features,
                    self.config.max_features,
                    self.config.seed,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let learner = &self.learner;
        let encoded = &encoded;
        let base_seed = self.config.seed;
        let max_depth = self.config.max_depth;

        let units: Vec<_> = slices
            .into_iter()
            .enumerate()
            .map(|(tree_index, slice)| {
                move || {
                    let x = features.gather(&slice.row_indices, &slice.feature_indices);
                    let y: Vec<usize> = slice.row_indices.iter().map(|&r| encoded[r]).collect();
                    let context = FitContext {
                        tree_index,
                        seed: tree_seed(base_seed, tree_index),
                        n_classes,
                        max_depth,
                    };
                    let model = learner.fit(&x, &y, &context)?;
                    Ok::<_, B::Error>(TreeSlot {
                        model,
                        feature_indices: slice.feature_indices,
                    })
                }
            })
            .collect();

        let slots = pool.run_parallel(units).map_err(worker_failure)?;

        debug!(n_trees_trained = slots.len(), "tree training complete");

        self.fitted = Some(FittedForest {
            slots,
            classes,
            n_features,
        });

        info!("forest training complete");
        Ok(())
    }
}

impl<B: BaseLearner, L> RandomForest<B, L> {
    /// Return the ensemble configuration.
    #[must_use]
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Return `true` after a successful fit.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Return the trained slots, in tree-index order. Empty before fit.
    #[must_use]
    pub fn slots(&self) -> &[TreeSlot<B::Model>] {
        match &self.fitted {
            Some(fitted) => &fitted.slots,
            None => &[],
        }
    }

    /// Return the number of trained trees (zero before fit).
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.slots().len()
    }

    /// Return the class registry, if fitted.
    #[must_use]
    pub fn classes(&self) -> Option<&ClassRegistry<L>> {
        self.fitted.as_ref().map(|f| &f.classes)
    }

    /// Return the number of feature columns seen at fit time, if fitted.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    pub(crate) fn fitted(&self) -> Result<&FittedForest<B::Model, L>, ForestError> {
        self.fitted.as_ref().ok_or(ForestError::NotFitted)
    }
}
