use std::path::PathBuf;

use thiserror::Error;

/// Errors that may occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    /// A value parsed but cannot be used.
    #[error("Invalid setting {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

impl From<crate::app_dirs::AppDirError> for ConfigError {
    fn from(error: crate::app_dirs::AppDirError) -> Self {
        match error {
            crate::app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
            crate::app_dirs::AppDirError::CreateDir { path, source } => {
                ConfigError::CreateDir { path, source }
            }
        }
    }
}
