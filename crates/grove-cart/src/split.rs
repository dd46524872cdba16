use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Gini impurity: 1 - Σ(p_i²)
    #[default]
    Gini,
    /// Information entropy: -Σ(p_i · ln(p_i))
    Entropy,
}

impl SplitCriterion {
    /// Compute the impurity of a node from its class counts.
    ///
    /// An empty node has impurity 0.
    #[must_use]
    pub fn impurity(self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini => {
                1.0 - class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum::<f64>()
            }
            SplitCriterion::Entropy => -class_counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p.ln()
                })
                .sum::<f64>(),
        };
        Impurity::new(value)
    }
}

/// A chosen split and the partition it induces.
#[derive(Debug, Clone)]
pub(crate) struct Split {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) left: Vec<usize>,
    pub(crate) right: Vec<usize>,
}

/// Exhaustive threshold search over a column-major training slice.
///
/// `columns[feature][sample]` holds the value of one sample in one column.
pub(crate) struct SplitSearch<'a> {
    pub(crate) columns: &'a [Vec<f64>],
    pub(crate) labels: &'a [usize],
    pub(crate) n_classes: usize,
    pub(crate) criterion: SplitCriterion,
    pub(crate) min_samples_leaf: usize,
}

impl SplitSearch<'_> {
    /// Count the samples of each class.
    pub(crate) fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &s in samples {
            counts[self.labels[s]] += 1;
        }
        counts
    }

    /// Find the split with the largest weighted impurity decrease among
    /// `max_features` columns drawn from `rng`.
    ///
    /// Columns are scanned in draw order and only a strictly better split
    /// replaces the current best, so ties go to the column drawn first.
    /// Returns `None` when every candidate column is constant over `samples`
    /// or no threshold leaves `min_samples_leaf` samples on both sides.
    pub(crate) fn best(
        &self,
        samples: &[usize],
        class_counts: &[usize],
        max_features: usize,
        rng: &mut impl Rng,
    ) -> Option<Split> {
        let n_features = self.columns.len();
        if samples.len() < 2 || n_features == 0 {
            return None;
        }
        let parent = self.criterion.impurity(class_counts, samples.len());

        let mut best: Option<(f64, usize, f64)> = None;
        for feature in rand::seq::index::sample(rng, n_features, max_features.min(n_features)) {
            if let Some((decrease, threshold)) = self.scan(feature, samples, class_counts, parent) {
                if best.is_none_or(|(d, _, _)| decrease > d) {
                    best = Some((decrease, feature, threshold));
                }
            }
        }

        let (_, feature, threshold) = best?;
        let column = &self.columns[feature];
        let (left, right): (Vec<usize>, Vec<usize>) =
            samples.iter().partition(|&&s| column[s] <= threshold);
        if left.is_empty() || right.is_empty() {
            return None;
        }

        Some(Split {
            feature: FeatureIndex::new(feature),
            threshold,
            left,
            right,
        })
    }

    /// Scan every boundary of one column; return the best `(decrease, threshold)`.
    fn scan(
        &self,
        feature: usize,
        samples: &[usize],
        parent_counts: &[usize],
        parent: Impurity,
    ) -> Option<(f64, f64)> {
        let column = &self.columns[feature];
        let n = samples.len();

        let mut sorted: Vec<(f64, usize)> = samples.iter().map(|&s| (column[s], s)).collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts = vec![0usize; self.n_classes];
        let mut right_counts = parent_counts.to_vec();
        let mut best: Option<(f64, f64)> = None;

        for (i, pair) in sorted.windows(2).enumerate() {
            let (value, s) = pair[0];
            let next = pair[1].0;
            let class = self.labels[s];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            let n_left = i + 1;
            let n_right = n - n_left;
            if value == next || n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let decrease = n as f64 * parent.value()
                - n_left as f64 * self.criterion.impurity(&left_counts, n_left).value()
                - n_right as f64 * self.criterion.impurity(&right_counts, n_right).value();

            if best.is_none_or(|(d, _)| decrease > d) {
                best = Some((decrease, midpoint(value, next)));
            }
        }
        best
    }
}

/// Threshold between two distinct sorted values.
///
/// The midpoint can round up to `next` for adjacent floats or overflow near
/// `f64::MAX`; `value` itself is used then so `next` always goes right.
fn midpoint(value: f64, next: f64) -> f64 {
    let mid = value / 2.0 + next / 2.0;
    if mid.is_finite() && mid < next && mid >= value {
        mid
    } else {
        value
    }
}
