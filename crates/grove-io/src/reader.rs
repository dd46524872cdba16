//! CSV dataset reader with full input validation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{Dataset, SampleId};

/// Reads a feature table, optionally with a label column, from a CSV file.
///
/// Expected CSV format:
/// - Header row required; the first column is the sample id
/// - `id,feature1,...,featureN` for prediction input
/// - `id,feature1,...,label,...,featureN` for training input, where the label
///   column is chosen by name with [`DatasetReader::with_label_column`]
///
/// Every column other than the id and label is a feature and must parse as a
/// finite `f64`.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingLabelColumn`] | Label column not in header |
/// | [`IoError::NoFeatureColumns`] | No columns left besides id and label |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::DuplicateSampleId`] | Same id appears twice |
/// | [`IoError::EmptyLabel`] | Label cell is empty |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable |
pub struct DatasetReader {
    path: PathBuf,
    label_column: Option<String>,
}

impl DatasetReader {
    /// Create a reader for the given CSV file path, with no label column.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label_column: None,
        }
    }

    /// Read labels from the column named `column`.
    #[must_use]
    pub fn with_label_column(mut self, column: impl Into<String>) -> Self {
        self.label_column = Some(column.into());
        self
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display(), label_column = ?self.label_column))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that short or long rows reach our own
        // InconsistentRowLength check instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let label_index = match &self.label_column {
            Some(column) => Some(
                header
                    .iter()
                    .skip(1)
                    .position(|name| name == column)
                    .map(|i| i + 1)
                    .ok_or_else(|| IoError::MissingLabelColumn {
                        path: self.path.clone(),
                        column: column.clone(),
                    })?,
            ),
            None => None,
        };

        let feature_columns: Vec<usize> = (1..expected_cols)
            .filter(|&c| Some(c) != label_index)
            .collect();
        if feature_columns.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        let feature_names: Vec<String> = feature_columns
            .iter()
            .map(|&c| header[c].to_string())
            .collect();

        let mut ids = Vec::new();
        let mut features = Vec::new();
        let mut labels = label_index.map(|_| Vec::new());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let sample_id = record.get(0).unwrap_or("").to_string();

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    sample_id,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            if let Some(&first_row) = seen.get(&sample_id) {
                return Err(IoError::DuplicateSampleId {
                    path: self.path.clone(),
                    sample_id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(sample_id.clone(), row_index);

            if let (Some(index), Some(labels)) = (label_index, labels.as_mut()) {
                let label = record[index].trim();
                if label.is_empty() {
                    return Err(IoError::EmptyLabel {
                        path: self.path.clone(),
                        row_index,
                        sample_id,
                    });
                }
                labels.push(label.to_string());
            }

            let mut row = Vec::with_capacity(feature_columns.len());
            for (feature_index, &c) in feature_columns.iter().enumerate() {
                let raw = &record[c];
                let value = raw
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        feature_index,
                        raw: raw.to_string(),
                    })?;
                row.push(value);
            }

            ids.push(SampleId::new(sample_id));
            features.push(row);
        }

        if ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = ids.len(),
            n_features = feature_names.len(),
            labelled = labels.is_some(),
            "dataset loaded"
        );

        Ok(Dataset::new(ids, feature_names, features, labels))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
