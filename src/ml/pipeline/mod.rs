//! Fixed flight-code training pipeline.
//!
//! [`PipelineBuilder`] wires a registered [`FeatureMapper`] into the chain
//! described by [`stage::flight_code_chain`]; [`Pipeline::fit`] runs every stage
//! against a training set and yields an immutable [`TrainedModel`].

use std::sync::Arc;

use crate::dataset::FeatureRecord;
use crate::ml::error::ModelError;
use crate::ml::logreg::{TrainDataset, TrainOptions, train_logreg};
use crate::ml::mapping::{DerivedFeature, FeatureMapper, FlightCodeMapping, MappingRegistry};
use crate::ml::text::{FeaturizerOptions, TextFeaturizer};
use crate::ml::vocab::LabelVocabulary;

mod model;
mod persist;
pub mod stage;

pub use model::{Prediction, TrainedModel};
pub use persist::MODEL_FORMAT_VERSION;
pub use stage::StageSpec;

/// Configures the pluggable parts of the pipeline.
///
/// Stage order is not configurable.
pub struct PipelineBuilder {
    mapper: Arc<dyn FeatureMapper>,
    featurizer: FeaturizerOptions,
    trainer: TrainOptions,
}

impl PipelineBuilder {
    pub fn new(mapper: Arc<dyn FeatureMapper>) -> Self {
        Self {
            mapper,
            featurizer: FeaturizerOptions::default(),
            trainer: TrainOptions::default(),
        }
    }

    /// Attach the mapping registered under `name`.
    pub fn from_registry(registry: &MappingRegistry, name: &str) -> Result<Self, ModelError> {
        Ok(Self::new(registry.resolve(name)?))
    }

    pub fn featurizer_options(mut self, options: FeaturizerOptions) -> Self {
        self.featurizer = options;
        self
    }

    pub fn train_options(mut self, options: TrainOptions) -> Self {
        self.trainer = options;
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            stages: stage::flight_code_chain(self.mapper.name()),
            mapper: self.mapper,
            featurizer: self.featurizer,
            trainer: self.trainer,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new(Arc::new(FlightCodeMapping))
    }
}

/// Unfitted pipeline ready to train.
pub struct Pipeline {
    stages: Vec<StageSpec>,
    mapper: Arc<dyn FeatureMapper>,
    featurizer: FeaturizerOptions,
    trainer: TrainOptions,
}

impl Pipeline {
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn train_options(&self) -> &TrainOptions {
        &self.trainer
    }

    /// Fit every stage against `records`.
    ///
    /// Either returns a complete model or fails with
    /// [`ModelError::TrainingFailure`] / [`ModelError::InvalidInput`].
    pub fn fit(&self, records: &[FeatureRecord]) -> Result<TrainedModel, ModelError> {
        if records.is_empty() {
            return Err(ModelError::TrainingFailure("Empty training set".to_string()));
        }

        let (labels, y) =
            LabelVocabulary::fit_encode(records.iter().map(|r| r.true_label.as_str()));
        if labels.len() < 2 {
            return Err(ModelError::TrainingFailure(format!(
                "Need at least 2 distinct labels (got {})",
                labels.len()
            )));
        }

        let derived = records
            .iter()
            .map(|r| checked_mapping(self.mapper.as_ref(), &r.flight_code))
            .collect::<Result<Vec<_>, _>>()?;

        let featurizer =
            TextFeaturizer::fit(records.iter().map(|r| r.flight_code.as_str()), &self.featurizer);
        tracing::info!(
            "Fitted {} labels and {} text features over {} rows",
            labels.len(),
            featurizer.dimension(),
            records.len()
        );

        let x = records
            .iter()
            .zip(&derived)
            .map(|(record, feature)| combine(&featurizer, &record.flight_code, *feature))
            .collect();
        let classifier = train_logreg(
            &TrainDataset {
                n_classes: labels.len(),
                x,
                y,
            },
            &self.trainer,
        )
        .map_err(ModelError::TrainingFailure)?;

        Ok(TrainedModel::new(
            self.stages.clone(),
            self.mapper.clone(),
            featurizer,
            classifier,
            labels,
        ))
    }
}

/// Run a mapper and enforce the 0/1 output contract.
pub(crate) fn checked_mapping(
    mapper: &dyn FeatureMapper,
    flight_code: &str,
) -> Result<DerivedFeature, ModelError> {
    let feature = mapper.map(Some(flight_code))?;
    if feature.special_feature != 0.0 && feature.special_feature != 1.0 {
        return Err(ModelError::invalid_input(format!(
            "mapping {} produced non-boolean value {} for '{flight_code}'",
            mapper.name(),
            feature.special_feature
        )));
    }
    Ok(feature)
}

/// Concatenate the featurized text with the derived feature (last slot).
pub(crate) fn combine(
    featurizer: &TextFeaturizer,
    flight_code: &str,
    derived: DerivedFeature,
) -> Vec<f32> {
    let mut features = vec![0.0f32; featurizer.dimension() + 1];
    featurizer.transform_into(flight_code, &mut features);
    features[featurizer.dimension()] = derived.special_feature;
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(rows: &[(&str, &str)]) -> Vec<FeatureRecord> {
        rows.iter()
            .map(|(code, label)| FeatureRecord::new(*code, *label))
            .collect()
    }

    struct HalfMapper;

    impl FeatureMapper for HalfMapper {
        fn name(&self) -> &str {
            "Half"
        }

        fn map(&self, _flight_code: Option<&str>) -> Result<DerivedFeature, ModelError> {
            Ok(DerivedFeature {
                special_feature: 0.5,
            })
        }
    }

    #[test]
    fn builder_uses_mapper_name_in_chain() {
        let registry = MappingRegistry::with_builtin().unwrap();
        let pipeline = PipelineBuilder::from_registry(&registry, "FlightCodeMapping")
            .unwrap()
            .build();
        assert_eq!(
            pipeline.stages(),
            stage::flight_code_chain("FlightCodeMapping").as_slice()
        );
    }

    #[test]
    fn fit_rejects_empty_and_single_label_sets() {
        let pipeline = PipelineBuilder::default().build();
        assert!(matches!(
            pipeline.fit(&[]),
            Err(ModelError::TrainingFailure(_))
        ));
        let single = records(&[("B738-ABC", "737"), ("B738-XYZ", "737")]);
        assert!(matches!(
            pipeline.fit(&single),
            Err(ModelError::TrainingFailure(_))
        ));
    }

    #[test]
    fn fit_rejects_non_boolean_mapping_output() {
        let pipeline = PipelineBuilder::new(Arc::new(HalfMapper)).build();
        let rows = records(&[("B738-ABC", "737"), ("A320-XYZ", "320")]);
        assert!(matches!(
            pipeline.fit(&rows),
            Err(ModelError::InvalidInput { .. })
        ));
    }

    #[test]
    fn combined_vector_ends_with_derived_feature() {
        let featurizer = TextFeaturizer::fit(["B738-ABC"], &FeaturizerOptions::default());
        let features = combine(&featurizer, "B738-ABC", DerivedFeature::from_flag(true));
        assert_eq!(features.len(), featurizer.dimension() + 1);
        assert_eq!(features.last(), Some(&1.0));
    }
}
