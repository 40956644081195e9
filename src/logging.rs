//! Tracing setup for the command-line tools.
//!
//! Installs a global subscriber writing to stdout and, unless disabled, to a
//! timestamped per-run file under `<app root>/logs`. At most
//! [`MAX_LOG_FILES`] run files are kept.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
    time::SystemTime,
};

use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;
use crate::config::LoggingSettings;

/// Maximum number of run log files to retain.
pub const MAX_LOG_FILES: usize = 10;
const LOG_FILE_PREFIX: &str = "aircode";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();
static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// No config base directory could be resolved for the app root.
    #[error("No config base directory available for the logs folder")]
    NoConfigBaseDir,
    /// Failed to create or access the log directory.
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to enumerate existing log files for pruning.
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to remove an obsolete log file.
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to format a timestamp for the log filename.
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    /// Failed to set the global tracing subscriber.
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
    /// Failed to create the initial log file for this launch.
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl LoggingError {
    /// True when no subscriber was installed at all.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoggingError::SetGlobal(_))
    }
}

/// Install the global subscriber. Returns the log file path when file output
/// is enabled.
///
/// Subsequent calls are no-ops. If the log file cannot be prepared the stdout
/// subscriber is still installed and the file error is returned.
pub fn init(settings: &LoggingSettings) -> Result<Option<PathBuf>, LoggingError> {
    if INITIALIZED.get().is_some() {
        return Ok(None);
    }

    let timer = build_timer();
    let env_filter = build_env_filter(&settings.level);
    let stdout_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stdout);

    let prepared = if settings.file {
        prepare_log_file().map(Some)
    } else {
        Ok(None)
    };
    let (file_layer, log_path, file_error) = match prepared {
        Ok(Some((log_dir, log_file_name))) => {
            let log_path = log_dir.join(&log_file_name);
            let (file_writer, guard) =
                tracing_appender::non_blocking(rolling::never(&log_dir, log_file_name));
            let _ = LOG_GUARD.set(guard);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_timer(timer)
                .with_writer(file_writer);
            (Some(layer), Some(log_path), None)
        }
        Ok(None) => (None, None, None),
        Err(err) => (None, None, Some(err)),
    };

    let subscriber = Registry::default()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = INITIALIZED.set(());

    if let Some(err) = file_error {
        tracing::warn!("Logging to stdout only: {err}");
        return Err(err);
    }
    match &log_path {
        Some(path) => tracing::info!("Logging initialized; log file at {}", path.display()),
        None => tracing::debug!("Logging initialized without a log file"),
    }
    Ok(log_path)
}

/// Create this run's log file and prune old ones. Returns the directory and
/// file name.
fn prepare_log_file() -> Result<(PathBuf, String), LoggingError> {
    let log_dir = log_directory()?;
    let log_file_name = format_log_file_name(now_local_or_utc())?;
    ensure_file_exists(&log_dir.join(&log_file_name))?;
    prune_old_logs(&log_dir, MAX_LOG_FILES)?;
    Ok((log_dir, log_file_name))
}

fn log_directory() -> Result<PathBuf, LoggingError> {
    app_dirs::logs_dir().map_err(map_app_dir_error)
}

fn ensure_file_exists(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

fn prune_old_logs(dir: &Path, max_files: usize) -> Result<(), LoggingError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_run_log(path))
        .map(|path| {
            let modified = fs::metadata(&path)
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, path)
        })
        .collect::<Vec<_>>();

    // Oldest first; names break ties since they embed the launch time.
    entries.sort();
    let excess = entries.len().saturating_sub(max_files);
    for (_, path) in entries.drain(..excess) {
        fs::remove_file(&path).map_err(|source| LoggingError::RemoveFile { path, source })?;
    }
    Ok(())
}

fn is_run_log(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|ext| ext.to_str()) == Some("log")
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}

fn format_log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let name = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}_{name}.log"))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn build_env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> LoggingError {
    match error {
        app_dirs::AppDirError::NoBaseDir => LoggingError::NoConfigBaseDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            LoggingError::CreateDir { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn unusable_log_dir_still_installs_stdout_logging() {
        let _lock = app_dirs::lock_config_base_for_test();
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").unwrap();
        app_dirs::set_config_base_override(Some(&blocker));
        let result = init(&LoggingSettings::default());
        app_dirs::set_config_base_override(None);

        let err = result.unwrap_err();
        assert!(matches!(err, LoggingError::CreateDir { .. }));
        assert!(!err.is_fatal());
        assert!(tracing::dispatcher::has_been_set());
        assert_eq!(init(&LoggingSettings::default()).unwrap(), None);
    }

    #[test]
    fn log_filename_has_timestamp_and_prefix() {
        let fixed = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let name = format_log_file_name(fixed).unwrap();
        assert_eq!(name, "aircode_2023-11-14_22-13-20.log");
    }

    #[test]
    fn prune_keeps_newest_run_logs_only() {
        let dir = tempdir().unwrap();
        for idx in 0..12 {
            let fixed = OffsetDateTime::from_unix_timestamp(1_700_000_000 + idx).unwrap();
            let path = dir.path().join(format_log_file_name(fixed).unwrap());
            ensure_file_exists(&path).unwrap();
        }
        let foreign = dir.path().join("other.log");
        ensure_file_exists(&foreign).unwrap();

        prune_old_logs(dir.path(), 10).unwrap();
        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(LOG_FILE_PREFIX))
            .collect();
        remaining.sort();
        assert_eq!(remaining.len(), 10);
        assert_eq!(remaining[0], "aircode_2023-11-14_22-13-22.log");
        assert!(foreign.exists());
    }
}
