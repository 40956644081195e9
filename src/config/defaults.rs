use crate::ml::FlightCodeMapping;

/// Config file name inside the app root.
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_LOG_CORRECT_EVERY: u64 = 300;
pub const DEFAULT_LOG_INCORRECT_EVERY: u64 = 30;

pub(super) fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

pub(super) fn default_mapping_name() -> String {
    FlightCodeMapping::NAME.to_string()
}

pub(super) fn default_log_correct_every() -> u64 {
    DEFAULT_LOG_CORRECT_EVERY
}

pub(super) fn default_log_incorrect_every() -> u64 {
    DEFAULT_LOG_INCORRECT_EVERY
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_true() -> bool {
    true
}
