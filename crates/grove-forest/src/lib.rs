//! Bagged classification forests: train and query in parallel.
//!
//! Each tree is fitted by a pluggable [`BaseLearner`] on a bootstrap
//! resample of the rows and a random subset of the feature columns.
//! Per-tree sampling is seeded from `seed + tree_index`, so results do not
//! depend on how many workers run the trees. Predictions average the
//! per-class probabilities of all trees.

mod config;
mod error;
mod forest;
mod learner;
mod matrix;
mod pool;
mod predict;
mod registry;
mod sampler;
mod serialize;

#[cfg(test)]
mod testing;

pub use config::EnsembleConfig;
pub use error::{ErrorKind, ForestError};
pub use forest::{RandomForest, TreeSlot};
pub use learner::{BaseLearner, Classifier, FitContext};
pub use matrix::Matrix;
pub use pool::{UnitFailure, WorkerPool};
pub use registry::ClassRegistry;
pub use sampler::{TrainingSlice, plan, tree_seed};
