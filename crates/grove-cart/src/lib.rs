//! CART decision trees as base learners for `grove-forest`.
//!
//! [`CartLearner`] grows an arena-backed tree with exhaustive threshold
//! search under Gini or Entropy impurity. Leaf distributions span every class
//! of the forest's registry, so per-tree outputs line up without remapping.

mod error;
mod node;
mod split;
mod tree;

pub use error::TreeError;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use split::SplitCriterion;
pub use tree::{CartLearner, DecisionTree};
