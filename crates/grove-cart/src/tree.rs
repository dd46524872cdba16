use grove_forest::{BaseLearner, Classifier, FitContext, Matrix};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    TreeError,
    node::{Node, NodeIndex},
    split::{SplitCriterion, SplitSearch},
};

/// CART decision tree learner.
///
/// Construct via [`CartLearner::new`], then chain `with_*` methods. Depth
/// limit, class count and seed come from the forest through [`FitContext`].
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `criterion`         | `Gini`                |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `None` (all columns)  |
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CartLearner {
    pub(crate) criterion: SplitCriterion,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
}

impl CartLearner {
    /// Create a learner with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }

    /// Set the split quality criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of samples required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how many of the slice's columns each split considers.
    ///
    /// `None` considers every column the forest handed to the tree.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Return the split criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the minimum samples required in each leaf.
    #[must_use]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Return the per-split feature count, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Train one tree on a row-major slice with labels in `0..n_classes`.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                            |
    /// |---------------------------------------|-------------------------------------------------|
    /// | [`TreeError::EmptyDataset`]           | `features` has no rows                          |
    /// | [`TreeError::ZeroFeatures`]           | `features` has no columns                       |
    /// | [`TreeError::LabelCountMismatch`]     | `labels.len() != features.n_rows()`             |
    /// | [`TreeError::LabelOutOfRange`]        | a label is `>= n_classes`                       |
    /// | [`TreeError::NonFiniteValue`]         | any value is NaN or infinite                    |
    /// | [`TreeError::InvalidMaxDepth`]        | `max_depth` is `Some(0)`                        |
    /// | [`TreeError::InvalidMinSamplesSplit`] | `min_samples_split` < 2                         |
    /// | [`TreeError::InvalidMinSamplesLeaf`]  | `min_samples_leaf` < 1                          |
    /// | [`TreeError::InvalidMaxFeatures`]     | `max_features` outside `[1, n_features]`        |
    #[instrument(skip_all, fields(n_samples = features.n_rows(), seed = seed))]
    pub fn fit_tree(
        &self,
        features: &Matrix,
        labels: &[usize],
        n_classes: usize,
        max_depth: Option<usize>,
        seed: u64,
    ) -> Result<DecisionTree, TreeError> {
        let n_samples = features.n_rows();
        let n_features = features.n_cols();

        // --- Validate inputs ---
        if n_samples == 0 {
            return Err(TreeError::EmptyDataset);
        }
        if n_features == 0 {
            return Err(TreeError::ZeroFeatures);
        }
        if labels.len() != n_samples {
            return Err(TreeError::LabelCountMismatch {
                n_rows: n_samples,
                n_labels: labels.len(),
            });
        }
        if let Some((sample_index, &label)) =
            labels.iter().enumerate().find(|&(_, &l)| l >= n_classes)
        {
            return Err(TreeError::LabelOutOfRange {
                sample_index,
                label,
                n_classes,
            });
        }
        for (sample_index, row) in features.rows().enumerate() {
            if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
                return Err(TreeError::NonFiniteValue {
                    sample_index,
                    feature_index,
                });
            }
        }

        // --- Validate config ---
        if max_depth == Some(0) {
            return Err(TreeError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split < 2 {
            return Err(TreeError::InvalidMinSamplesSplit {
                min_samples_split: self.min_samples_split,
            });
        }
        if self.min_samples_leaf < 1 {
            return Err(TreeError::InvalidMinSamplesLeaf {
                min_samples_leaf: self.min_samples_leaf,
            });
        }
        let max_features = self.max_features.unwrap_or(n_features);
        if max_features == 0 || max_features > n_features {
            return Err(TreeError::InvalidMaxFeatures {
                max_features,
                n_features,
            });
        }

        // Column-major copy for the threshold scan.
        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|c| features.rows().map(|row| row[c]).collect())
            .collect();

        let mut builder = TreeBuilder {
            search: SplitSearch {
                columns: &columns,
                labels,
                n_classes,
                criterion: self.criterion,
                min_samples_leaf: self.min_samples_leaf,
            },
            min_samples_split: self.min_samples_split,
            max_depth,
            max_features,
            rng: ChaCha8Rng::seed_from_u64(seed),
            arena: Vec::new(),
        };
        let samples: Vec<usize> = (0..n_samples).collect();
        builder.grow(&samples, 0);

        debug!(n_nodes = builder.arena.len(), n_classes, "decision tree built");

        Ok(DecisionTree {
            nodes: builder.arena,
            n_features,
            n_classes,
        })
    }
}

impl Default for CartLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseLearner for CartLearner {
    type Model = DecisionTree;
    type Error = TreeError;

    fn fit(
        &self,
        features: &Matrix,
        labels: &[usize],
        context: &FitContext,
    ) -> Result<DecisionTree, TreeError> {
        self.fit_tree(
            features,
            labels,
            context.n_classes,
            context.max_depth,
            context.seed,
        )
    }
}

/// Recursive arena construction state for one tree.
struct TreeBuilder<'a> {
    search: SplitSearch<'a>,
    min_samples_split: usize,
    max_depth: Option<usize>,
    max_features: usize,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `samples` and return its root index.
    fn grow(&mut self, samples: &[usize], depth: usize) -> NodeIndex {
        let n_samples = samples.len();
        let counts = self.search.class_counts(samples);
        let impurity = self.search.criterion.impurity(&counts, n_samples);

        let stop = n_samples < self.min_samples_split
            || impurity.is_pure()
            || self.max_depth.is_some_and(|d| depth >= d);
        let split = if stop {
            None
        } else {
            self.search
                .best(samples, &counts, self.max_features, &mut self.rng)
        };

        let node_idx = self.arena.len();
        let Some(split) = split else {
            let total = n_samples as f64;
            self.arena.push(Node::Leaf {
                distribution: counts.iter().map(|&c| c as f64 / total).collect(),
                impurity,
                n_samples,
            });
            return NodeIndex::new(node_idx);
        };

        // Reserve the slot so children get higher indices, then fill it in.
        self.arena.push(Node::Leaf {
            distribution: Vec::new(),
            impurity,
            n_samples,
        });
        let left = self.grow(&split.left, depth + 1);
        let right = self.grow(&split.right, depth + 1);
        self.arena[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples,
        };
        NodeIndex::new(node_idx)
    }
}

/// A fitted CART decision tree.
///
/// Stored as an arena `Vec<Node>` rooted at index 0. Leaf distributions have
/// one entry per class of the forest's registry, so classes absent from the
/// training slice get probability 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Return the leaf distribution for a single row.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionFeatureMismatch`] when `row.len() != n_features`.
    pub fn distribution(&self, row: &[f64]) -> Result<&[f64], TreeError> {
        if row.len() != self.n_features {
            return Err(TreeError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution, .. } => return Ok(distribution.as_slice()),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Return the number of columns the tree was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of classes in every leaf distribution.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Borrow the node arena.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree. A lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }
}

impl Classifier for DecisionTree {
    type Error = TreeError;

    fn predict_proba(&self, features: &Matrix) -> Result<Matrix, TreeError> {
        let mut values = Vec::with_capacity(features.n_rows() * self.n_classes);
        for row in features.rows() {
            values.extend_from_slice(self.distribution(row)?);
        }
        Ok(Matrix::new(values, features.n_rows(), self.n_classes)?)
    }
}

#[cfg(test)]
mod tests {
    use grove_forest::{BaseLearner, Classifier, FitContext, Matrix};

    use super::CartLearner;
    use crate::{Node, SplitCriterion, TreeError};

    fn matrix(rows: &[&[f64]]) -> Matrix {
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        Matrix::from_rows(&rows).unwrap()
    }

    fn separable() -> (Matrix, Vec<usize>) {
        let x = matrix(&[
            &[1.0, 0.0],
            &[2.0, 0.0],
            &[3.0, 0.0],
            &[10.0, 0.0],
            &[11.0, 0.0],
            &[12.0, 0.0],
        ]);
        (x, vec![0, 0, 0, 1, 1, 1])
    }

    fn xor() -> (Matrix, Vec<usize>) {
        let x = matrix(&[&[0.0, 0.0], &[0.0, 1.0], &[1.0, 0.0], &[1.0, 1.0]]);
        (x, vec![0, 1, 1, 0])
    }

    #[test]
    fn pure_slice_single_leaf() {
        let x = matrix(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        let tree = CartLearner::new().fit_tree(&x, &[1, 1, 1], 2, None, 0).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.distribution(&[2.0, 3.0]).unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn separable_slice_split() {
        let (x, y) = separable();
        let tree = CartLearner::new().fit_tree(&x, &y, 2, None, 42).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.distribution(&[2.0, 0.0]).unwrap(), &[1.0, 0.0]);
        assert_eq!(tree.distribution(&[11.0, 0.0]).unwrap(), &[0.0, 1.0]);
    }

    #[test]
    fn xor_needs_depth_two() {
        let (x, y) = xor();
        let tree = CartLearner::new().fit_tree(&x, &y, 2, None, 42).unwrap();
        assert!(tree.depth() >= 2);
        for (row, &label) in x.rows().zip(&y) {
            assert_eq!(tree.distribution(row).unwrap()[label], 1.0);
        }
    }

    #[test]
    fn max_depth_limits_tree() {
        let (x, y) = xor();
        let tree = CartLearner::new().fit_tree(&x, &y, 2, Some(1), 42).unwrap();
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn entropy_criterion_trains() {
        let (x, y) = separable();
        let tree = CartLearner::new()
            .with_criterion(SplitCriterion::Entropy)
            .fit_tree(&x, &y, 2, None, 3)
            .unwrap();
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn min_samples_leaf_blocks_small_leaves() {
        let (x, y) = separable();
        let tree = CartLearner::new()
            .with_min_samples_leaf(4)
            .fit_tree(&x, &y, 2, None, 0)
            .unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.distribution(&[1.0, 0.0]).unwrap(), &[0.5, 0.5]);
    }

    #[test]
    fn absent_classes_get_zero_probability() {
        let (x, y) = separable();
        let tree = CartLearner::new().fit_tree(&x, &y, 4, None, 0).unwrap();
        let proba = tree.predict_proba(&x).unwrap();
        assert_eq!(proba.n_cols(), 4);
        assert!(proba.rows().all(|r| r[2] == 0.0 && r[3] == 0.0));
    }

    #[test]
    fn same_seed_same_tree() {
        let (x, y) = xor();
        let a = CartLearner::new().fit_tree(&x, &y, 2, None, 123).unwrap();
        let b = CartLearner::new().fit_tree(&x, &y, 2, None, 123).unwrap();
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn base_learner_uses_context() {
        let (x, y) = xor();
        let context = FitContext {
            tree_index: 0,
            seed: 9,
            n_classes: 3,
            max_depth: Some(1),
        };
        let tree = CartLearner::new().fit(&x, &y, &context).unwrap();
        assert_eq!(tree.n_classes(), 3);
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn invalid_inputs_rejected() {
        let learner = CartLearner::new();
        let err = learner
            .fit_tree(&Matrix::zeros(0, 2), &[], 2, None, 0)
            .unwrap_err();
        assert!(matches!(err, TreeError::EmptyDataset));

        let x = matrix(&[&[1.0, f64::NAN], &[3.0, 4.0]]);
        let err = learner.fit_tree(&x, &[0, 1], 2, None, 0).unwrap_err();
        assert!(matches!(
            err,
            TreeError::NonFiniteValue {
                sample_index: 0,
                feature_index: 1
            }
        ));

        let (x, _) = separable();
        let err = learner
            .fit_tree(&x, &[0, 0, 0, 1, 1, 2], 2, None, 0)
            .unwrap_err();
        assert!(matches!(err, TreeError::LabelOutOfRange { sample_index: 5, .. }));

        let err = learner.fit_tree(&x, &[0, 1], 2, None, 0).unwrap_err();
        assert!(matches!(err, TreeError::LabelCountMismatch { .. }));
    }

    #[test]
    fn invalid_config_rejected() {
        let (x, y) = separable();
        let err = CartLearner::new().fit_tree(&x, &y, 2, Some(0), 0).unwrap_err();
        assert!(matches!(err, TreeError::InvalidMaxDepth { max_depth: 0 }));

        let err = CartLearner::new()
            .with_min_samples_split(1)
            .fit_tree(&x, &y, 2, None, 0)
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidMinSamplesSplit { .. }));

        let err = CartLearner::new()
            .with_min_samples_leaf(0)
            .fit_tree(&x, &y, 2, None, 0)
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidMinSamplesLeaf { .. }));

        let err = CartLearner::new()
            .with_max_features(Some(3))
            .fit_tree(&x, &y, 2, None, 0)
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::InvalidMaxFeatures {
                max_features: 3,
                n_features: 2
            }
        ));
    }

    #[test]
    fn prediction_feature_mismatch() {
        let (x, y) = separable();
        let tree = CartLearner::new().fit_tree(&x, &y, 2, None, 0).unwrap();
        let err = tree.predict_proba(&Matrix::zeros(1, 3)).unwrap_err();
        assert!(matches!(
            err,
            TreeError::PredictionFeatureMismatch { expected: 2, got: 3 }
        ));
    }

    #[test]
    fn adjacent_floats_grow_finite_tree() {
        let x = matrix(&[&[1.0000000000000002], &[1.0000000000000004]]);
        for max_depth in [None, Some(3)] {
            let tree = CartLearner::new().fit_tree(&x, &[0, 1], 2, max_depth, 0).unwrap();
            assert_eq!(tree.n_leaves(), 2);
            assert_eq!(tree.distribution(&[1.0000000000000002]).unwrap(), &[1.0, 0.0]);
            assert_eq!(tree.distribution(&[2.0]).unwrap(), &[0.0, 1.0]);
        }
    }

    #[test]
    fn leaves_never_empty() {
        let x = matrix(&[&[f64::MAX * 0.9], &[f64::MAX], &[-f64::MAX]]);
        let tree = CartLearner::new().fit_tree(&x, &[0, 1, 0], 2, None, 0).unwrap();
        for node in tree.nodes() {
            if let Node::Leaf { n_samples, distribution, .. } = node {
                assert!(*n_samples > 0);
                let sum: f64 = distribution.iter().sum();
                assert!((sum - 1.0).abs() < 1e-12);
            }
        }
        assert_eq!(tree.distribution(&[f64::MAX]).unwrap(), &[0.0, 1.0]);
    }
}
