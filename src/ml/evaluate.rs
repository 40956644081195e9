//! Streaming and parallel evaluation of a [`TrainedModel`].
//!
//! Tally accumulation is kept separate from progress reporting: the
//! accumulator is pure, while [`ProgressReporter`] receives each outcome for
//! logging or test inspection.

use serde::{Deserialize, Serialize};

use super::error::ModelError;
use super::metrics::{ConfusionMatrix, PerClassStats, precision_recall_by_class};
use super::pipeline::{Prediction, TrainedModel};
use crate::dataset::FeatureRecord;

/// Correct/incorrect counts gathered during evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationTally {
    pub correct: u64,
    pub incorrect: u64,
}

impl EvaluationTally {
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    pub fn merge(&mut self, other: EvaluationTally) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
    }

    pub fn total(&self) -> u64 {
        self.correct + self.incorrect
    }

    /// `correct / total`; undefined for an empty tally.
    pub fn accuracy(&self) -> Result<f64, ModelError> {
        match self.total() {
            0 => Err(ModelError::EmptyEvaluationSet),
            total => Ok(self.correct as f64 / total as f64),
        }
    }
}

/// One evaluated record, handed to a [`ProgressReporter`].
#[derive(Debug)]
pub struct RecordOutcome<'a> {
    pub record: &'a FeatureRecord,
    pub prediction: &'a Prediction,
    pub correct: bool,
}

/// Observer for per-record evaluation progress.
pub trait ProgressReporter {
    /// Called after `tally` has been updated for `outcome`.
    fn on_outcome(&mut self, outcome: &RecordOutcome<'_>, tally: &EvaluationTally);
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn on_outcome(&mut self, _outcome: &RecordOutcome<'_>, _tally: &EvaluationTally) {}
}

/// Logs every Nth correct and every Mth incorrect prediction.
#[derive(Debug, Clone, Copy)]
pub struct LogProgress {
    /// 0 disables logging of correct predictions.
    pub correct_every: u64,
    /// 0 disables logging of incorrect predictions.
    pub incorrect_every: u64,
}

impl Default for LogProgress {
    fn default() -> Self {
        Self {
            correct_every: 300,
            incorrect_every: 30,
        }
    }
}

impl ProgressReporter for LogProgress {
    fn on_outcome(&mut self, outcome: &RecordOutcome<'_>, tally: &EvaluationTally) {
        let due = |count: u64, every: u64| every > 0 && count % every == 0;
        if outcome.correct && due(tally.correct, self.correct_every) {
            tracing::info!(
                "FlightCode: {}, Aircraft Code: {} - Predicted Aircraft Code: {}, Confidence: {}",
                outcome.record.flight_code,
                outcome.record.true_label,
                outcome.prediction.predicted_label,
                outcome.prediction.confidence()
            );
        } else if !outcome.correct && due(tally.incorrect, self.incorrect_every) {
            tracing::warn!(
                "FlightCode: {}, Aircraft Code: {} - Predicted Aircraft Code: {}, Confidence: {}",
                outcome.record.flight_code,
                outcome.record.true_label,
                outcome.prediction.predicted_label,
                outcome.prediction.confidence()
            );
        }
    }
}

/// Final evaluation summary.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub tally: EvaluationTally,
    pub accuracy: f64,
    /// Label names indexing the rows/columns of `confusion`.
    pub labels: Vec<String>,
    pub confusion: ConfusionMatrix,
    /// Records whose true label never appeared in training.
    pub unseen_labels: u64,
}

impl EvaluationReport {
    pub fn per_class(&self) -> Vec<PerClassStats> {
        precision_recall_by_class(&self.confusion)
    }
}

#[derive(Debug, Clone)]
struct Accumulator {
    tally: EvaluationTally,
    confusion: ConfusionMatrix,
    unseen_labels: u64,
}

impl Accumulator {
    fn new(n_classes: usize) -> Self {
        Self {
            tally: EvaluationTally::default(),
            confusion: ConfusionMatrix::new(n_classes),
            unseen_labels: 0,
        }
    }

    /// Predict first so a rejected record leaves the counts untouched.
    fn observe(
        &mut self,
        model: &TrainedModel,
        record: &FeatureRecord,
    ) -> Result<(Prediction, bool), ModelError> {
        let prediction = model.predict_record(record)?;
        let correct = prediction.predicted_label == record.true_label;
        self.tally.record(correct);
        match (
            model.labels().encode(&record.true_label),
            model.labels().encode(&prediction.predicted_label),
        ) {
            (Some(truth), Some(predicted)) => self.confusion.add(truth, predicted),
            _ => self.unseen_labels += 1,
        }
        Ok((prediction, correct))
    }

    fn merge(&mut self, other: &Accumulator) {
        self.tally.merge(other.tally);
        self.confusion.merge(&other.confusion);
        self.unseen_labels += other.unseen_labels;
    }

    fn finish(self, model: &TrainedModel) -> Result<EvaluationReport, ModelError> {
        let accuracy = self.tally.accuracy()?;
        Ok(EvaluationReport {
            tally: self.tally,
            accuracy,
            labels: model.labels().labels().to_vec(),
            confusion: self.confusion,
            unseen_labels: self.unseen_labels,
        })
    }
}

/// Runs held-out records through a model and aggregates correctness.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'m> {
    model: &'m TrainedModel,
}

impl<'m> Evaluator<'m> {
    pub fn new(model: &'m TrainedModel) -> Self {
        Self { model }
    }

    /// Evaluate records in input order.
    pub fn evaluate<I>(
        &self,
        records: I,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<EvaluationReport, ModelError>
    where
        I: IntoIterator<Item = FeatureRecord>,
    {
        self.evaluate_stream(records.into_iter().map(Ok::<_, ModelError>), reporter)
    }

    /// Evaluate a fallible record stream in input order, stopping at the first
    /// error.
    pub fn evaluate_stream<I, E>(
        &self,
        records: I,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<EvaluationReport, ModelError>
    where
        I: IntoIterator<Item = Result<FeatureRecord, E>>,
        ModelError: From<E>,
    {
        let mut acc = Accumulator::new(self.model.labels().len());
        for record in records {
            let record = record?;
            let (prediction, correct) = acc.observe(self.model, &record)?;
            reporter.on_outcome(
                &RecordOutcome {
                    record: &record,
                    prediction: &prediction,
                    correct,
                },
                &acc.tally,
            );
        }
        acc.finish(self.model)
    }

    /// Evaluate across scoped worker threads with per-worker partial tallies.
    ///
    /// `workers == 0` uses the available parallelism. No progress is reported.
    pub fn evaluate_parallel(
        &self,
        records: &[FeatureRecord],
        workers: usize,
    ) -> Result<EvaluationReport, ModelError> {
        if records.is_empty() {
            return Err(ModelError::EmptyEvaluationSet);
        }
        let requested = if workers == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            workers
        };
        let worker_count = requested.min(records.len()).max(1);
        let chunk_size = records.len().div_ceil(worker_count);
        let n_classes = self.model.labels().len();
        let model = self.model;

        let partials: Vec<Result<Accumulator, ModelError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = records
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || -> Result<Accumulator, ModelError> {
                        let mut acc = Accumulator::new(n_classes);
                        for record in chunk {
                            acc.observe(model, record)?;
                        }
                        Ok(acc)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });

        let mut total = Accumulator::new(n_classes);
        for partial in partials {
            total.merge(&partial?);
        }
        tracing::debug!(
            "Evaluated {} records on {worker_count} workers",
            total.tally.total()
        );
        total.finish(self.model)
    }
}
