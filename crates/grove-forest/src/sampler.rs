//! Per-tree bootstrap and random-subspace sampling.

use rand::Rng;
use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;

use crate::error::ForestError;

/// The rows and columns one tree trains on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSlice {
    /// Bootstrap row indices, drawn with replacement. Length equals the row count.
    pub row_indices: Vec<usize>,
    /// Distinct feature column indices, in draw order.
    pub feature_indices: Vec<usize>,
}

/// Derive the seed for tree `tree_index`.
///
/// `base_seed + tree_index`, wrapping on overflow. Changing this formula
/// changes every trained forest.
#[must_use]
pub fn tree_seed(base_seed: u64, tree_index: usize) -> u64 {
    base_seed.wrapping_add(tree_index as u64)
}

/// Plan the training slice for one tree.
///
/// A pure function of its arguments: feature columns are drawn first
/// (without replacement), then `row_count` rows (with replacement), from a
/// ChaCha8 generator seeded with [`tree_seed`].
///
/// # Errors
///
/// | Variant                                     | When                              |
/// |---------------------------------------------|-----------------------------------|
/// | [`ForestError::EmptyDataset`]               | `row_count` is zero               |
/// | [`ForestError::ZeroFeatures`]               | `feature_count` is zero           |
/// | [`ForestError::ZeroMaxFeatures`]            | `max_features` is zero            |
/// | [`ForestError::MaxFeaturesExceedsFeatures`] | `max_features > feature_count`    |
pub fn plan(
    tree_index: usize,
    row_count: usize,
    feature_count: usize,
    max_features: usize,
    base_seed: u64,
) -> Result<TrainingSlice, ForestError> {
    if row_count == 0 {
        return Err(ForestError::EmptyDataset);
    }
    if feature_count == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    if max_features == 0 {
        return Err(ForestError::ZeroMaxFeatures);
    }
    if max_features > feature_count {
        return Err(ForestError::MaxFeaturesExceedsFeatures {
            max_features,
            n_features: feature_count,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(tree_seed(base_seed, tree_index));
    let feature_indices = index::sample(&mut rng, feature_count, max_features).into_vec();
    let row_indices = (0..row_count).map(|_| rng.gen_range(0..row_count)).collect();

    Ok(TrainingSlice {
        row_indices,
        feature_indices,
    })
}
