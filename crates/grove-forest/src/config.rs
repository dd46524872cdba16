//! Configuration builder for forest training.

use crate::error::ForestError;

/// Immutable ensemble configuration.
///
/// Construct via [`EnsembleConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter   | Default     |
/// |-------------|-------------|
/// | `max_depth` | `None`      |
/// | `seed`      | 42          |
///
/// `max_features` has no default: it must be given explicitly and is checked
/// against the data's column count when the forest is fitted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EnsembleConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) seed: u64,
}

impl EnsembleConfig {
    /// Create a new config with the given tree count and per-tree feature count.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                 |
    /// |----------------------------------|----------------------|
    /// | [`ForestError::InvalidTreeCount`] | `n_trees` is zero    |
    /// | [`ForestError::ZeroMaxFeatures`]  | `max_features` is zero |
    pub fn new(n_trees: usize, max_features: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        if max_features == 0 {
            return Err(ForestError::ZeroMaxFeatures);
        }
        Ok(Self {
            n_trees,
            max_features,
            max_depth: None,
            seed: 42,
        })
    }

    /// Set the maximum tree depth. `None` means unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidMaxDepth`] for `Some(0)`.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Result<Self, ForestError> {
        if max_depth == Some(0) {
            return Err(ForestError::InvalidMaxDepth { max_depth: 0 });
        }
        self.max_depth = max_depth;
        Ok(self)
    }

    /// Set the base seed. Tree `i` is sampled with seed `seed + i`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check `max_features` against the data's feature count.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::MaxFeaturesExceedsFeatures`] when `max_features > n_features`.
    pub fn validate_for(&self, n_features: usize) -> Result<(), ForestError> {
        if self.max_features > n_features {
            return Err(ForestError::MaxFeaturesExceedsFeatures {
                max_features: self.max_features,
                n_features,
            });
        }
        Ok(())
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the number of feature columns sampled per tree.
    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Return the maximum depth limit, if any.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the base seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}
