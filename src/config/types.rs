use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::defaults::{
    default_delimiter, default_log_correct_every, default_log_incorrect_every, default_log_level,
    default_mapping_name, default_true,
};
use super::errors::ConfigError;
use crate::app_dirs;
use crate::ml::LogProgress;
use crate::ml::logreg::TrainOptions;
use crate::ml::text::FeaturizerOptions;

/// Settings loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub training: TrainingSettings,
    #[serde(default)]
    pub evaluation: EvaluationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Check values that deserialize fine but are unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.data.delimiter_byte()?;
        if self.model.mapping.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "model.mapping",
                reason: "must name a registered custom mapping".into(),
            });
        }
        let opts = &self.training.options;
        if opts.epochs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "training.epochs",
                reason: "must be at least 1".into(),
            });
        }
        if !(opts.learning_rate.is_finite() && opts.learning_rate > 0.0) {
            return Err(ConfigError::InvalidValue {
                key: "training.learning_rate",
                reason: format!("must be positive, got {}", opts.learning_rate),
            });
        }
        if opts.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "training.batch_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.training.featurizer.max_vocabulary == 0 {
            return Err(ConfigError::InvalidValue {
                key: "training.featurizer.max_vocabulary",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Dataset locations. Files carry a header row with `FlightCode` and `IATACode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default)]
    pub training_csv: Option<PathBuf>,
    #[serde(default)]
    pub evaluation_csv: Option<PathBuf>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            training_csv: None,
            evaluation_csv: None,
            delimiter: default_delimiter(),
        }
    }
}

impl DataSettings {
    /// The delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "data.delimiter",
                reason: format!("{:?} is not a single ASCII character", self.delimiter),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Artifact path; `<app root>/models/savedmodel.zip` when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Registered custom mapping used when building a new pipeline.
    #[serde(default = "default_mapping_name")]
    pub mapping: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: None,
            mapping: default_mapping_name(),
        }
    }
}

impl ModelSettings {
    pub fn resolved_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dirs::default_model_path()?),
        }
    }
}

/// Classifier hyper-parameters plus `[training.featurizer]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(flatten)]
    pub options: TrainOptions,
    #[serde(default)]
    pub featurizer: FeaturizerOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationSettings {
    /// Worker threads for scoring; 0 scores sequentially with progress logging.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_log_correct_every")]
    pub log_correct_every: u64,
    #[serde(default = "default_log_incorrect_every")]
    pub log_incorrect_every: u64,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            workers: 0,
            log_correct_every: default_log_correct_every(),
            log_incorrect_every: default_log_incorrect_every(),
        }
    }
}

impl EvaluationSettings {
    pub fn progress(&self) -> LogProgress {
        LogProgress {
            correct_every: self.log_correct_every,
            incorrect_every: self.log_incorrect_every,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write a per-run file under `<app root>/logs`.
    #[serde(default = "default_true")]
    pub file: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: true,
        }
    }
}
