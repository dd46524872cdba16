//! Model serialization and deserialization via bincode.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::config::EnsembleConfig;
use crate::error::ForestError;
use crate::forest::{FittedForest, RandomForest};
use crate::learner::BaseLearner;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope written to disk.
#[derive(serde::Serialize)]
struct ModelEnvelopeRef<'a, M, L> {
    format_version: u32,
    config: &'a EnsembleConfig,
    fitted: &'a FittedForest<M, L>,
}

/// Owned counterpart of [`ModelEnvelopeRef`], with an identical layout.
#[derive(serde::Deserialize)]
struct ModelEnvelope<M, L> {
    format_version: u32,
    config: EnsembleConfig,
    fitted: FittedForest<M, L>,
}

impl<B, L> RandomForest<B, L>
where
    B: BaseLearner,
    B::Model: Serialize + DeserializeOwned,
    L: Serialize + DeserializeOwned,
{
    /// Save the fitted forest (config, registry, and every tree slot).
    ///
    /// The base learner itself is not stored; supply it again on [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::NotFitted`] | forest has not been fitted |
    /// | [`ForestError::SerializeModel`] | bincode encoding failed |
    /// | [`ForestError::WriteModel`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let path = path.as_ref();
        let fitted = self.fitted()?;

        let envelope = ModelEnvelopeRef {
            format_version: FORMAT_VERSION,
            config: &self.config,
            fitted,
        };

        let bytes =
            bincode::serialize(&envelope).map_err(|e| ForestError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| ForestError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = fitted.slots.len(),
            "model saved"
        );

        Ok(())
    }

    /// Load a fitted forest, pairing it with `learner` for future re-fits.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::ReadModel`] | file read failed |
    /// | [`ForestError::DeserializeModel`] | bincode decoding failed |
    /// | [`ForestError::IncompatibleModelVersion`] | format version mismatch |
    /// | [`ForestError::CorruptModel`] | slots disagree with the stored config or feature count |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>, learner: B) -> Result<Self, ForestError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| ForestError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope<B::Model, L> =
            bincode::deserialize(&bytes).map_err(|e| ForestError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ForestError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        check_consistency(&envelope).map_err(|reason| ForestError::CorruptModel {
            path: path.to_path_buf(),
            reason,
        })?;

        debug!(
            n_trees = envelope.fitted.slots.len(),
            n_features = envelope.fitted.n_features,
            n_classes = envelope.fitted.classes.len(),
            "model loaded"
        );

        Ok(Self {
            config: envelope.config,
            learner,
            fitted: Some(envelope.fitted),
        })
    }
}

/// Check the invariants a fit guarantees but a decoded file may not.
fn check_consistency<M, L>(envelope: &ModelEnvelope<M, L>) -> Result<(), String> {
    let fitted = &envelope.fitted;
    if fitted.classes.is_empty() {
        return Err("no classes registered".to_string());
    }
    if fitted.slots.len() != envelope.config.n_trees() {
        return Err(format!(
            "{} tree slots for n_trees = {}",
            fitted.slots.len(),
            envelope.config.n_trees()
        ));
    }
    for (tree_index, slot) in fitted.slots.iter().enumerate() {
        if slot.feature_indices.len() != envelope.config.max_features() {
            return Err(format!(
                "tree {tree_index} reads {} columns, expected {}",
                slot.feature_indices.len(),
                envelope.config.max_features()
            ));
        }
        if let Some(&column) = slot
            .feature_indices
            .iter()
            .find(|&&c| c >= fitted.n_features)
        {
            return Err(format!(
                "tree {tree_index} reads column {column} of {}",
                fitted.n_features
            ));
        }
    }
    Ok(())
}
