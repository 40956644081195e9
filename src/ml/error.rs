use std::convert::Infallible;

use thiserror::Error;

use crate::dataset::DatasetError;

/// Errors surfaced by the training, loading and evaluation pipeline.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A record is missing a required field or carries a malformed one.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
    /// Fitting could not produce a usable model.
    #[error("Training failed: {0}")]
    TrainingFailure(String),
    /// The model artifact could not be written or read.
    #[error("Model persistence failed: {0}")]
    Persistence(#[from] std::io::Error),
    /// The model artifact bytes are malformed, truncated or inconsistent.
    #[error("Model load failed: {0}")]
    ModelLoad(String),
    /// A persisted stage references a mapping the registry does not know.
    #[error("Unknown custom mapping '{name}'")]
    UnknownCustomMapping { name: String },
    /// A mapping with the same name is already registered.
    #[error("Custom mapping '{name}' is already registered")]
    DuplicateMapping { name: String },
    /// No records were evaluated, so accuracy is undefined.
    #[error("Evaluation set is empty; accuracy is undefined")]
    EmptyEvaluationSet,
    /// The record source itself failed.
    #[error("Dataset error: {0}")]
    Dataset(DatasetError),
}

impl ModelError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// True when the failure happened while writing or reading an artifact.
    ///
    /// Callers can retry these without retraining.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::ModelLoad(_))
    }
}

impl From<DatasetError> for ModelError {
    fn from(err: DatasetError) -> Self {
        if err.is_malformed_record() {
            Self::invalid_input(err.to_string())
        } else {
            Self::Dataset(err)
        }
    }
}

impl From<Infallible> for ModelError {
    fn from(err: Infallible) -> Self {
        match err {}
    }
}
