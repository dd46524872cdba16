//! Small base learners used by the forest's unit tests.

use crate::learner::{BaseLearner, Classifier, FitContext};
use crate::matrix::Matrix;

#[derive(Debug, thiserror::Error)]
pub(crate) enum StubError {
    #[error("non-finite value in training slice")]
    NonFinite,
    #[error("tree {0} refused to train")]
    Refused(usize),
    #[error("tree {0} failed to predict")]
    PredictFailed(usize),
    #[error("model trained on {expected} columns, got {got}")]
    ColumnMismatch { expected: usize, got: usize },
}

/// Nearest-centroid learner with inverse-distance probabilities.
#[derive(Debug, Clone, Default)]
pub(crate) struct CentroidLearner;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct CentroidModel {
    /// `None` for classes absent from the slice.
    centroids: Vec<Option<Vec<f64>>>,
    n_cols: usize,
}

impl BaseLearner for CentroidLearner {
    type Model = CentroidModel;
    type Error = StubError;

    fn fit(
        &self,
        features: &Matrix,
        labels: &[usize],
        context: &FitContext,
    ) -> Result<CentroidModel, StubError> {
        if features.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(StubError::NonFinite);
        }
        let n_cols = features.n_cols();
        let mut sums = vec![vec![0.0; n_cols]; context.n_classes];
        let mut counts = vec![0usize; context.n_classes];
        for (row, &label) in features.rows().zip(labels) {
            counts[label] += 1;
            for (acc, &v) in sums[label].iter_mut().zip(row) {
                *acc += v;
            }
        }
        let centroids = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| {
                (count > 0).then(|| sum.into_iter().map(|s| s / count as f64).collect())
            })
            .collect();
        Ok(CentroidModel { centroids, n_cols })
    }
}

impl Classifier for CentroidModel {
    type Error = StubError;

    fn predict_proba(&self, features: &Matrix) -> Result<Matrix, StubError> {
        if features.n_cols() != self.n_cols {
            return Err(StubError::ColumnMismatch {
                expected: self.n_cols,
                got: features.n_cols(),
            });
        }
        let n_classes = self.centroids.len();
        let mut values = Vec::with_capacity(features.n_rows() * n_classes);
        for row in features.rows() {
            let weights: Vec<f64> = self
                .centroids
                .iter()
                .map(|c| match c {
                    Some(centroid) => {
                        let d2: f64 = centroid.iter().zip(row).map(|(a, b)| (a - b).powi(2)).sum();
                        1.0 / (1.0 + d2)
                    }
                    None => 0.0,
                })
                .collect();
            let total: f64 = weights.iter().sum();
            values.extend(weights.iter().map(|w| w / total));
        }
        Ok(Matrix::new(values, features.n_rows(), n_classes).expect("shape is consistent"))
    }
}

/// Learner that refuses to train one specific tree.
#[derive(Debug, Clone)]
pub(crate) struct RefusingLearner {
    pub(crate) refuse: Vec<usize>,
}

impl BaseLearner for RefusingLearner {
    type Model = CentroidModel;
    type Error = StubError;

    fn fit(
        &self,
        features: &Matrix,
        labels: &[usize],
        context: &FitContext,
    ) -> Result<CentroidModel, StubError> {
        if self.refuse.contains(&context.tree_index) {
            return Err(StubError::Refused(context.tree_index));
        }
        CentroidLearner.fit(features, labels, context)
    }
}

/// Learner whose models emit one probability column too many.
#[derive(Debug, Clone)]
pub(crate) struct MisalignedLearner;

#[derive(Debug, Clone)]
pub(crate) struct MisalignedModel {
    n_classes: usize,
}

impl BaseLearner for MisalignedLearner {
    type Model = MisalignedModel;
    type Error = StubError;

    fn fit(
        &self,
        _features: &Matrix,
        _labels: &[usize],
        context: &FitContext,
    ) -> Result<MisalignedModel, StubError> {
        Ok(MisalignedModel {
            n_classes: context.n_classes,
        })
    }
}

impl Classifier for MisalignedModel {
    type Error = StubError;

    fn predict_proba(&self, features: &Matrix) -> Result<Matrix, StubError> {
        let n_cols = self.n_classes + 1;
        let values = vec![1.0 / n_cols as f64; features.n_rows() * n_cols];
        Ok(Matrix::new(values, features.n_rows(), n_cols).expect("shape is consistent"))
    }
}

/// Learner that predicts a fixed distribution regardless of input.
#[derive(Debug, Clone)]
pub(crate) struct ConstantLearner {
    pub(crate) distribution: Vec<f64>,
}

#[derive(Debug, Clone)]
pub(crate) struct ConstantModel {
    distribution: Vec<f64>,
}

impl BaseLearner for ConstantLearner {
    type Model = ConstantModel;
    type Error = StubError;

    fn fit(
        &self,
        _features: &Matrix,
        _labels: &[usize],
        _context: &FitContext,
    ) -> Result<ConstantModel, StubError> {
        Ok(ConstantModel {
            distribution: self.distribution.clone(),
        })
    }
}

impl Classifier for ConstantModel {
    type Error = StubError;

    fn predict_proba(&self, features: &Matrix) -> Result<Matrix, StubError> {
        let values: Vec<f64> = (0..features.n_rows())
            .flat_map(|_| self.distribution.iter().copied())
            .collect();
        Ok(Matrix::new(values, features.n_rows(), self.distribution.len())
            .expect("shape is consistent"))
    }
}

/// Learner whose models for the listed trees fail at prediction time.
#[derive(Debug, Clone)]
pub(crate) struct FailingPredictLearner {
    pub(crate) fail: Vec<usize>,
}

#[derive(Debug, Clone)]
pub(crate) struct FailingPredictModel {
    tree_index: usize,
    fails: bool,
    inner: CentroidModel,
}

impl BaseLearner for FailingPredictLearner {
    type Model = FailingPredictModel;
    type Error = StubError;

    fn fit(
        &self,
        features: &Matrix,
        labels: &[usize],
        context: &FitContext,
    ) -> Result<FailingPredictModel, StubError> {
        Ok(FailingPredictModel {
            tree_index: context.tree_index,
            fails: self.fail.contains(&context.tree_index),
            inner: CentroidLearner.fit(features, labels, context)?,
        })
    }
}

impl Classifier for FailingPredictModel {
    type Error = StubError;

    fn predict_proba(&self, features: &Matrix) -> Result<Matrix, StubError> {
        if self.fails {
            return Err(StubError::PredictFailed(self.tree_index));
        }
        self.inner.predict_proba(features)
    }
}

/// Two well-separated classes: label 0 near the origin, label 1 near 10.
pub(crate) fn separable_data(n_rows: usize, n_features: usize) -> (Matrix, Vec<i64>) {
    let mut rows = Vec::with_capacity(n_rows);
    let mut labels = Vec::with_capacity(n_rows);
    for i in 0..n_rows {
        let class = (i % 2) as i64;
        let base = class as f64 * 10.0;
        rows.push(
            (0..n_features)
                .map(|f| base + ((i * 7 + f * 3) % 5) as f64 * 0.1)
                .collect(),
        );
        labels.push(class);
    }
    (Matrix::from_rows(&rows).expect("rows are rectangular"), labels)
}
