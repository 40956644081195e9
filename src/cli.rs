//! Shared plumbing for the `aircode` binaries: flag parsing, config overrides
//! and the train/load/evaluate steps they chain together.

use std::path::PathBuf;

use clap::Args;
use thiserror::Error;

use crate::config::{self, AppConfig, ConfigError};
use crate::dataset::{DatasetError, open_records, read_records};
use crate::logging;
use crate::ml::metrics::PerClassStats;
use crate::ml::{
    EvaluationReport, Evaluator, MappingRegistry, ModelError, PipelineBuilder, TrainOutcome,
    TrainedModel, Trainer,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// A required path was neither configured nor passed as a flag.
    #[error("No {setting} configured (pass {flag} or set it in config.toml)")]
    MissingPath {
        setting: &'static str,
        flag: &'static str,
    },
}

/// Flags shared by every binary.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Config file to load instead of <app root>/config.toml
    #[arg(long, env = "AIRCODE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Model artifact path
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// CSV field delimiter
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Log to stdout only
    #[arg(long)]
    pub no_log_file: bool,
}

impl CommonArgs {
    /// Load the config file and apply these flags on top.
    pub fn load_config(&self) -> Result<AppConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => config::load_from(path)?,
            None => config::load_or_default()?,
        };
        if let Some(path) = &self.model {
            config.model.path = Some(path.clone());
        }
        if let Some(delimiter) = self.delimiter {
            config.data.delimiter = delimiter;
        }
        if self.no_log_file {
            config.logging.file = false;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct TrainArgs {
    /// Training CSV (FlightCode, IATACode)
    #[arg(long)]
    pub train_csv: Option<PathBuf>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub learning_rate: Option<f32>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.train_csv {
            config.data.training_csv = Some(path.clone());
        }
        let options = &mut config.training.options;
        if let Some(epochs) = self.epochs {
            options.epochs = epochs;
        }
        if let Some(rate) = self.learning_rate {
            options.learning_rate = rate;
        }
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct EvalArgs {
    /// Evaluation CSV (FlightCode, IATACode)
    #[arg(long)]
    pub eval_csv: Option<PathBuf>,

    /// Scoring threads; 0 scores sequentially with progress logging
    #[arg(long)]
    pub workers: Option<usize>,
}

impl EvalArgs {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(path) = &self.eval_csv {
            config.data.evaluation_csv = Some(path.clone());
        }
        if let Some(workers) = self.workers {
            config.evaluation.workers = workers;
        }
    }
}

/// Install logging, reporting but tolerating failures.
pub fn init_logging(config: &AppConfig) {
    match logging::init(&config.logging) {
        Ok(_) => {}
        Err(err) if err.is_fatal() => eprintln!("Logging disabled: {err}"),
        Err(err) => eprintln!("Continuing without file logging: {err}"),
    }
}

/// Train on `data.training_csv` and save to the configured model path.
pub fn train(config: &AppConfig) -> Result<TrainOutcome, CliError> {
    config.validate()?;
    let path = config
        .data
        .training_csv
        .as_deref()
        .ok_or(CliError::MissingPath {
            setting: "data.training_csv",
            flag: "--train-csv",
        })?;
    let registry = MappingRegistry::with_builtin()?;
    let pipeline = PipelineBuilder::from_registry(&registry, &config.model.mapping)?
        .featurizer_options(config.training.featurizer.clone())
        .train_options(config.training.options.clone())
        .build();
    let records = open_records(path, config.data.delimiter_byte()?)?;
    let model_path = config.model.resolved_path()?;
    Ok(Trainer::new(pipeline).train_and_save(records, Some(&model_path))?)
}

/// Load the configured model, binding custom mappings from the built-in
/// registry.
pub fn load_model(config: &AppConfig) -> Result<TrainedModel, CliError> {
    let registry = MappingRegistry::with_builtin()?;
    let path = config.model.resolved_path()?;
    Ok(TrainedModel::load_from_path(&path, &registry)?)
}

/// Evaluate `model` on `data.evaluation_csv`.
pub fn evaluate(model: &TrainedModel, config: &AppConfig) -> Result<EvaluationReport, CliError> {
    config.validate()?;
    let path = config
        .data
        .evaluation_csv
        .as_deref()
        .ok_or(CliError::MissingPath {
            setting: "data.evaluation_csv",
            flag: "--eval-csv",
        })?;
    let delimiter = config.data.delimiter_byte()?;
    let evaluator = Evaluator::new(model);
    let report = match config.evaluation.workers {
        0 => {
            let mut progress = config.evaluation.progress();
            evaluator.evaluate_stream(open_records(path, delimiter)?, &mut progress)?
        }
        workers => evaluator.evaluate_parallel(&read_records(path, delimiter)?, workers)?,
    };
    Ok(report)
}

/// One line per label plus the most frequent confusions.
pub fn format_class_report(report: &EvaluationReport, top_confusions: usize) -> String {
    let mut out = String::new();
    let stats: Vec<PerClassStats> = report.per_class();
    for (label, stats) in report.labels.iter().zip(&stats) {
        out.push_str(&format!(
            "{label:<8}  precision={:.3}  recall={:.3}  f1={:.3}  support={}\n",
            stats.precision,
            stats.recall,
            stats.f1(),
            stats.support
        ));
    }
    let confusions = report.confusion.top_confusions(top_confusions);
    if !confusions.is_empty() {
        out.push_str("top confusions (true -> predicted):\n");
        for (count, truth, predicted) in confusions {
            out.push_str(&format!(
                "  {} -> {}: {count}\n",
                report.labels[truth], report.labels[predicted]
            ));
        }
    }
    if report.unseen_labels > 0 {
        out.push_str(&format!(
            "{} records had labels unseen in training\n",
            report.unseen_labels
        ));
    }
    out
}
