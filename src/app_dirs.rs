//! Application directories rooted at a single `.aircode` folder.
//!
//! The root lives under the OS config directory unless `AIRCODE_CONFIG_HOME`
//! points somewhere else, which is how tests and portable setups relocate it.

use std::{
    path::{Path, PathBuf},
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory under the config base.
pub const APP_DIR_NAME: &str = ".aircode";
/// Environment variable that replaces the OS config base directory.
pub const CONFIG_HOME_ENV: &str = "AIRCODE_CONFIG_HOME";
/// Default file name for persisted models.
pub const DEFAULT_MODEL_FILE: &str = "savedmodel.zip";

static CONFIG_BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the `.aircode` root, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Return `<root>/logs`, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("logs"))
}

/// Return `<root>/models`, creating it if needed.
pub fn models_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("models"))
}

/// Default location of the saved model artifact.
pub fn default_model_path() -> Result<PathBuf, AppDirError> {
    Ok(models_dir()?.join(DEFAULT_MODEL_FILE))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn config_base_dir() -> Option<PathBuf> {
    if let Some(path) = CONFIG_BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone())
    {
        return Some(path);
    }
    if let Some(path) = std::env::var_os(CONFIG_HOME_ENV).filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

/// Replace the config base for the rest of the process. `None` restores the
/// environment/OS lookup.
pub fn set_config_base_override(path: Option<&Path>) {
    if let Ok(mut guard) = CONFIG_BASE_OVERRIDE.lock() {
        *guard = path.map(Path::to_path_buf);
    }
}

/// Serializes unit tests that swap the process-wide config base.
#[cfg(test)]
pub(crate) fn lock_config_base_for_test() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|err| err.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct OverrideGuard;

    impl OverrideGuard {
        fn set(path: &Path) -> Self {
            set_config_base_override(Some(path));
            Self
        }
    }

    impl Drop for OverrideGuard {
        fn drop(&mut self) {
            set_config_base_override(None);
        }
    }

    #[test]
    fn override_relocates_all_dirs() {
        let _lock = lock_config_base_for_test();
        let base = tempdir().unwrap();
        let _guard = OverrideGuard::set(base.path());
        let root = app_root_dir().unwrap();
        assert_eq!(root, base.path().join(APP_DIR_NAME));
        assert!(root.is_dir());
        assert!(logs_dir().unwrap().is_dir());
        assert_eq!(
            default_model_path().unwrap(),
            root.join("models").join(DEFAULT_MODEL_FILE)
        );
        assert!(root.join("models").is_dir());
    }
}
