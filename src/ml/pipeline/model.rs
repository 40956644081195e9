use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::stage::StageSpec;
use super::{checked_mapping, combine};
use crate::dataset::FeatureRecord;
use crate::ml::error::ModelError;
use crate::ml::logreg::{LogRegModel, argmax};
use crate::ml::mapping::FeatureMapper;
use crate::ml::text::TextFeaturizer;
use crate::ml::vocab::LabelVocabulary;

/// Classifier output for one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_label: String,
    /// One score per label, aligned with the model's label vocabulary.
    pub scores: Vec<f32>,
}

impl Prediction {
    /// Highest score, or NaN when there are no scores.
    pub fn confidence(&self) -> f32 {
        self.scores
            .iter()
            .copied()
            .reduce(f32::max)
            .unwrap_or(f32::NAN)
    }
}

/// Fitted pipeline: topology, bound mapper, fitted featurizer, classifier and
/// label vocabulary. Read-only once constructed.
#[derive(Clone)]
pub struct TrainedModel {
    pub(super) stages: Vec<StageSpec>,
    pub(super) mapper: Arc<dyn FeatureMapper>,
    pub(super) featurizer: TextFeaturizer,
    pub(super) classifier: LogRegModel,
    pub(super) labels: LabelVocabulary,
}

impl TrainedModel {
    pub(super) fn new(
        stages: Vec<StageSpec>,
        mapper: Arc<dyn FeatureMapper>,
        featurizer: TextFeaturizer,
        classifier: LogRegModel,
        labels: LabelVocabulary,
    ) -> Self {
        Self {
            stages,
            mapper,
            featurizer,
            classifier,
            labels,
        }
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn labels(&self) -> &LabelVocabulary {
        &self.labels
    }

    /// Name of the bound custom mapping.
    pub fn mapping_name(&self) -> &str {
        self.mapper.name()
    }

    /// Width of the combined feature vector.
    pub fn feature_len(&self) -> usize {
        self.classifier.feature_len
    }

    /// Position of the derived feature inside the combined vector.
    pub fn derived_feature_index(&self) -> usize {
        self.featurizer.dimension()
    }

    /// Run the feature stages only, returning the combined feature vector.
    pub fn features(&self, flight_code: &str) -> Result<Vec<f32>, ModelError> {
        let derived = checked_mapping(self.mapper.as_ref(), flight_code)?;
        Ok(combine(&self.featurizer, flight_code, derived))
    }

    /// Classify a flight code.
    pub fn predict(&self, flight_code: &str) -> Result<Prediction, ModelError> {
        let features = self.features(flight_code)?;
        let scores = self.classifier.predict_proba(&features);
        if scores.len() != self.labels.len() {
            return Err(ModelError::ModelLoad(format!(
                "classifier produced {} scores for {} labels",
                scores.len(),
                self.labels.len()
            )));
        }
        let (key, _) = argmax(&scores)
            .ok_or_else(|| ModelError::ModelLoad("classifier produced no scores".to_string()))?;
        Ok(Prediction {
            predicted_label: self.labels.decode(key)?.to_string(),
            scores,
        })
    }

    pub fn predict_record(&self, record: &FeatureRecord) -> Result<Prediction, ModelError> {
        self.predict(&record.flight_code)
    }
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("mapping", &self.mapper.name())
            .field("labels", &self.labels.labels())
            .field("feature_len", &self.classifier.feature_len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_max_score() {
        let prediction = Prediction {
            predicted_label: "737".into(),
            scores: vec![0.1, 0.7, 0.2],
        };
        assert_eq!(prediction.confidence(), 0.7);
    }

    #[test]
    fn confidence_of_empty_scores_is_nan() {
        let prediction = Prediction {
            predicted_label: String::new(),
            scores: Vec::new(),
        };
        assert!(prediction.confidence().is_nan());
    }
}
