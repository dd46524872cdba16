use grove_forest::ForestError;

/// Errors from fitting or querying a CART tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when the per-split feature count is 0 or exceeds the slice's columns.
    #[error("max_features is {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The configured per-split feature count.
        max_features: usize,
        /// The number of columns in the training slice.
        n_features: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when the training slice has zero rows.
    #[error("training slice has zero samples")]
    EmptyDataset,

    /// Returned when the training slice has zero columns.
    #[error("training slice has zero feature columns")]
    ZeroFeatures,

    /// Returned when there is not exactly one label per row.
    #[error("training slice has {n_rows} rows but {n_labels} labels")]
    LabelCountMismatch {
        /// Number of rows in the slice.
        n_rows: usize,
        /// Number of labels supplied.
        n_labels: usize,
    },

    /// Returned when a label is not a valid class index.
    #[error("label {label} at sample {sample_index} is outside 0..{n_classes}")]
    LabelOutOfRange {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The label found.
        label: usize,
        /// Number of classes the tree was asked to model.
        n_classes: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at sample {sample_index}, feature {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending sample.
        sample_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when the query has a different column count than the training slice.
    #[error("prediction input has {got} features, expected {expected}")]
    PredictionFeatureMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the prediction input.
        got: usize,
    },

    /// Returned when the probability matrix cannot be assembled.
    #[error("failed to assemble probability matrix")]
    Output {
        /// The underlying matrix error.
        #[from]
        source: ForestError,
    },
}
