//! JSON result writer for forest predictions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{ExperimentName, SampleId};

/// Writes experiment artifacts into one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Files are named `{experiment}_predictions.json` and `{experiment}_model.bin`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write predictions to `{experiment}_predictions.json` and return its path.
    ///
    /// `classes` gives the column order of every row in `probabilities`;
    /// `ids`, `predicted` and `probabilities` must have one entry per sample.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::PredictionLengthMismatch`] | inputs differ in length |
    /// | [`IoError::SerializeJson`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | file cannot be written |
    #[instrument(skip_all, fields(n_samples = ids.len()))]
    pub fn write_predictions(
        &self,
        ids: &[SampleId],
        classes: &[String],
        predicted: &[String],
        probabilities: &[Vec<f64>],
    ) -> Result<PathBuf, IoError> {
        if ids.len() != predicted.len() || ids.len() != probabilities.len() {
            return Err(IoError::PredictionLengthMismatch {
                n_ids: ids.len(),
                n_labels: predicted.len(),
                n_rows: probabilities.len(),
            });
        }

        let path = self
            .output_dir
            .join(format!("{}_predictions.json", self.experiment.as_str()));

        let predictions = ids
            .iter()
            .zip(predicted)
            .zip(probabilities)
            .map(|((id, label), row)| PredictionEntry {
                id,
                predicted: label,
                probabilities: row,
            })
            .collect();

        let artifact = PredictionArtifact {
            experiment: self.experiment.as_str(),
            n_samples: ids.len(),
            classes,
            predictions,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::SerializeJson {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; just computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.experiment.as_str()))
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct PredictionArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    classes: &'a [String],
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    id: &'a SampleId,
    predicted: &'a str,
    probabilities: &'a [f64],
}
