//! Flight-code → aircraft IATA type classifier with a pluggable custom feature
//! mapping, portable model artifacts and an evaluation harness.

/// Application directory helpers.
pub mod app_dirs;
/// Flag parsing and run steps shared by the binaries.
pub mod cli;
/// TOML configuration.
pub mod config;
/// Labeled flight-code datasets.
pub mod dataset;
/// Logging setup.
pub mod logging;
/// Training, persistence and evaluation.
pub mod ml;
