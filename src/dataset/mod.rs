//! Labeled flight-code datasets.
//!
//! Datasets are delimited text files with a header row and two fixed columns:
//! the flight code followed by the IATA aircraft type code.

pub mod loader;
mod record;

pub use loader::{DatasetError, RecordReader, open_records, read_records};
pub use record::FeatureRecord;
