use std::path::PathBuf;

/// Broad category of a [`ForestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid ensemble or worker configuration.
    Config,
    /// Mismatched row or column counts.
    Shape,
    /// Prediction or persistence requested before a successful fit.
    NotFitted,
    /// A base-learner unit failed.
    Worker,
    /// Reading or writing a model file failed.
    Persistence,
}

/// Errors from forest construction, training, prediction, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_features is zero.
    #[error("max_features must be at least 1")]
    ZeroMaxFeatures,

    /// Returned when max_features exceeds the number of feature columns.
    #[error("max_features is {max_features}, but the data has only {n_features} features")]
    MaxFeaturesExceedsFeatures {
        /// The configured max_features value.
        max_features: usize,
        /// The number of feature columns in the data.
        n_features: usize,
    },

    /// Returned when max_depth is `Some(0)`.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when the worker limit is zero.
    #[error("worker_limit must be at least 1, got {worker_limit}")]
    InvalidWorkerLimit {
        /// The invalid worker limit provided.
        worker_limit: usize,
    },

    /// Returned when the worker thread pool cannot be built.
    #[error("failed to build worker pool with {worker_limit} workers")]
    ThreadPool {
        /// The requested worker limit.
        worker_limit: usize,
        /// The underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },

    /// Returned when the training dataset has zero rows.
    #[error("training dataset has zero samples")]
    EmptyDataset,

    /// Returned when the dataset has zero feature columns.
    #[error("dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when flat matrix storage does not match the declared shape.
    #[error("matrix of shape ({n_rows}, {n_cols}) needs {} values, got {n_values}", .n_rows * .n_cols)]
    MatrixSizeMismatch {
        /// Number of values supplied.
        n_values: usize,
        /// Declared row count.
        n_rows: usize,
        /// Declared column count.
        n_cols: usize,
    },

    /// Returned when a row has a different length than the first row.
    #[error("row {row_index} has {got} values, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row_index: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        got: usize,
    },

    /// Returned when the label vector length differs from the row count.
    #[error("feature matrix has {n_rows} rows but {n_labels} labels were given")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_rows: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when prediction input has a different column count than training.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// Column count seen at fit time.
        expected: usize,
        /// Column count of the prediction input.
        got: usize,
    },

    /// Returned when predict or save is called before a successful fit.
    #[error("forest has not been fitted")]
    NotFitted,

    /// Returned when a base learner fails on one tree.
    #[error("base learner failed on tree {tree_index}")]
    WorkerFailure {
        /// Index of the tree whose unit failed.
        tree_index: usize,
        /// The learner's own error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when a tree's probability output is not aligned to the class registry.
    #[error(
        "tree {tree_index} returned probabilities of shape ({got_rows}, {got_cols}), \
         expected ({expected_rows}, {expected_cols})"
    )]
    ProbabilityShapeMismatch {
        /// Index of the offending tree.
        tree_index: usize,
        /// Expected row count.
        expected_rows: usize,
        /// Expected column count (number of classes).
        expected_cols: usize,
        /// Returned row count.
        got_rows: usize,
        /// Returned column count.
        got_cols: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },

    /// Returned when a decoded model is internally inconsistent.
    #[error("corrupt model in {path}: {reason}")]
    CorruptModel {
        /// Path to the model file.
        path: PathBuf,
        /// Which consistency check failed.
        reason: String,
    },
}

impl ForestError {
    /// Return the broad category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForestError::InvalidTreeCount { .. }
            | ForestError::ZeroMaxFeatures
            | ForestError::MaxFeaturesExceedsFeatures { .. }
            | ForestError::InvalidMaxDepth { .. }
            | ForestError::InvalidWorkerLimit { .. }
            | ForestError::ThreadPool { .. } => ErrorKind::Config,
            ForestError::EmptyDataset
            | ForestError::ZeroFeatures
            | ForestError::MatrixSizeMismatch { .. }
            | ForestError::RaggedRow { .. }
            | ForestError::LabelCountMismatch { .. }
            | ForestError::PredictionFeatureMismatch { .. } => ErrorKind::Shape,
            ForestError::NotFitted => ErrorKind::NotFitted,
            ForestError::WorkerFailure { .. } | ForestError::ProbabilityShapeMismatch { .. } => {
                ErrorKind::Worker
            }
            ForestError::SerializeModel { .. }
            | ForestError::DeserializeModel { .. }
            | ForestError::WriteModel { .. }
            | ForestError::ReadModel { .. }
            | ForestError::IncompatibleModelVersion { .. }
            | ForestError::CorruptModel { .. } => ErrorKind::Persistence,
        }
    }
}
