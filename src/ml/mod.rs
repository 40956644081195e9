//! Flight-code classification: custom feature mapping, pipeline fitting,
//! model persistence and evaluation.

pub mod error;
pub mod evaluate;
pub mod logreg;
pub mod mapping;
pub mod metrics;
pub mod pipeline;
pub mod text;
pub mod trainer;
pub mod vocab;

pub use error::ModelError;
pub use evaluate::{
    EvaluationReport, EvaluationTally, Evaluator, LogProgress, NoProgress, ProgressReporter,
    RecordOutcome,
};
pub use mapping::{DerivedFeature, FeatureMapper, FlightCodeMapping, MappingRegistry};
pub use pipeline::{Pipeline, PipelineBuilder, Prediction, StageSpec, TrainedModel};
pub use trainer::{TrainOutcome, Trainer};
