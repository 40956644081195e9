use std::path::{Path, PathBuf};

use super::defaults::CONFIG_FILE_NAME;
use super::errors::ConfigError;
use super::types::AppConfig;
use crate::app_dirs;

/// Resolve `<app root>/config.toml`, creating the app root if needed.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the config from the app root, falling back to defaults when absent.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    load_from(&config_path()?)
}

/// Load and validate a config file. A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Write the config as TOML, replacing the file only once fully written.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let staging = path.with_extension("toml.tmp");
    std::fs::write(&staging, data).map_err(|source| ConfigError::Write {
        path: staging.clone(),
        source,
    })?;
    std::fs::rename(&staging, path).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
