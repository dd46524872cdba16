//! Sorted class-label registry that fixes probability column order.

/// Sorted distinct class labels observed at fit time.
///
/// Column `j` of every probability matrix the forest produces corresponds to
/// `classes()[j]`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassRegistry<L> {
    classes: Vec<L>,
}

impl<L: Ord + Clone> ClassRegistry<L> {
    /// Build a registry from a label vector (sorted, deduplicated).
    #[must_use]
    pub fn from_labels(labels: &[L]) -> Self {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    /// Build a registry and encode `labels` against it in one pass.
    #[must_use]
    pub fn build(labels: &[L]) -> (Self, Vec<usize>) {
        let registry = Self::from_labels(labels);
        let encoded = labels
            .iter()
            .map(|l| registry.classes.binary_search(l).unwrap_or_else(|i| i))
            .collect();
        (registry, encoded)
    }
}

impl<L> ClassRegistry<L> {
    /// Return all labels in registry order.
    #[must_use]
    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Return the number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Return `true` when no classes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
