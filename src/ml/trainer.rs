//! Single-shot training with optional persistence.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::error::ModelError;
use super::pipeline::{Pipeline, TrainedModel};
use crate::dataset::FeatureRecord;

/// Result of a training run.
///
/// A failed save leaves `model` fully usable; callers may retry
/// [`TrainedModel::save_to_path`] without retraining.
#[derive(Debug)]
pub struct TrainOutcome {
    pub model: TrainedModel,
    pub saved_to: Option<PathBuf>,
    pub save_error: Option<ModelError>,
    pub rows: usize,
}

/// Fits a [`Pipeline`] against a dataset.
pub struct Trainer {
    pipeline: Pipeline,
}

impl Trainer {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Train on an in-memory or streamed dataset without persisting.
    pub fn train<I>(&self, records: I) -> Result<TrainedModel, ModelError>
    where
        I: IntoIterator<Item = FeatureRecord>,
    {
        self.train_from(records.into_iter().map(Ok::<_, ModelError>))
            .map(|outcome| outcome.model)
    }

    /// Train on a fallible record stream and optionally persist the model.
    ///
    /// The first bad record aborts training. No model is produced unless
    /// fitting completes.
    pub fn train_and_save<I, E>(
        &self,
        records: I,
        destination: Option<&Path>,
    ) -> Result<TrainOutcome, ModelError>
    where
        I: IntoIterator<Item = Result<FeatureRecord, E>>,
        ModelError: From<E>,
    {
        let mut outcome = self.train_from(records)?;
        if let Some(path) = destination {
            match outcome.model.save_to_path(path) {
                Ok(()) => outcome.saved_to = Some(path.to_path_buf()),
                Err(err) => {
                    tracing::warn!("Failed to save model to {}: {err}", path.display());
                    outcome.save_error = Some(err);
                }
            }
        }
        Ok(outcome)
    }

    fn train_from<I, E>(&self, records: I) -> Result<TrainOutcome, ModelError>
    where
        I: IntoIterator<Item = Result<FeatureRecord, E>>,
        ModelError: From<E>,
    {
        let rows = records
            .into_iter()
            .map(|row| row.map_err(ModelError::from))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!("Training the model on {} rows", rows.len());
        let started = Instant::now();
        let model = self.pipeline.fit(&rows)?;
        tracing::info!(
            "Training took {:.3} secs",
            started.elapsed().as_secs_f32()
        );
        Ok(TrainOutcome {
            model,
            saved_to: None,
            save_error: None,
            rows: rows.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetError;
    use crate::ml::pipeline::PipelineBuilder;
    use tempfile::tempdir;

    fn rows() -> Vec<FeatureRecord> {
        vec![
            FeatureRecord::new("B738-ABC", "737"),
            FeatureRecord::new("A320-XYZ", "320"),
        ]
    }

    #[test]
    fn train_and_save_writes_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("savedmodel.zip");
        let trainer = Trainer::new(PipelineBuilder::default().build());
        let outcome = trainer
            .train_and_save(rows().into_iter().map(Ok::<_, ModelError>), Some(&path))
            .unwrap();
        assert_eq!(outcome.saved_to.as_deref(), Some(path.as_path()));
        assert!(outcome.save_error.is_none());
        assert_eq!(outcome.rows, 2);
        assert!(path.is_file());
    }

    #[test]
    fn save_failure_keeps_model() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();
        let trainer = Trainer::new(PipelineBuilder::default().build());
        let outcome = trainer
            .train_and_save(
                rows().into_iter().map(Ok::<_, ModelError>),
                Some(&blocker.join("model.zip")),
            )
            .unwrap();
        assert!(outcome.saved_to.is_none());
        assert!(outcome.save_error.as_ref().is_some_and(|e| e.is_persistence()));
        assert!(outcome.model.predict("B738-DEF").is_ok());
    }

    #[test]
    fn bad_record_aborts_training() {
        let trainer = Trainer::new(PipelineBuilder::default().build());
        let records: Vec<Result<FeatureRecord, DatasetError>> = vec![
            Ok(FeatureRecord::new("B738-ABC", "737")),
            Err(DatasetError::MissingField {
                line: 3,
                field: "IATACode",
            }),
        ];
        let err = trainer.train_and_save(records, None).unwrap_err();
        assert!(matches!(err, ModelError::InvalidInput { .. }));
    }
}
