//! TOML configuration for training and evaluation runs.
//!
//! Every field has a default, so a missing file or a partial file both load.

mod defaults;
mod errors;
mod io;
mod types;

pub use defaults::{
    CONFIG_FILE_NAME, DEFAULT_DELIMITER, DEFAULT_LOG_CORRECT_EVERY, DEFAULT_LOG_INCORRECT_EVERY,
};
pub use errors::ConfigError;
pub use io::{config_path, load_from, load_or_default, save_to_path};
pub use types::{
    AppConfig, DataSettings, EvaluationSettings, LoggingSettings, ModelSettings, TrainingSettings,
};
