//! CSV reader producing [`FeatureRecord`]s.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::FeatureRecord;

const FLIGHT_CODE_COLUMN: &str = "FlightCode";
const IATA_CODE_COLUMN: &str = "IATACode";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: missing required field {field}")]
    MissingField { line: u64, field: &'static str },
    #[error("line {line}: expected 2 fields, found {found}")]
    ExtraFields { line: u64, found: usize },
    #[error("header must be FlightCode,IATACode, found {found}")]
    Header { found: String },
}

impl DatasetError {
    /// True for problems with a record's shape rather than with reading the file.
    pub fn is_malformed_record(&self) -> bool {
        matches!(
            self,
            DatasetError::MissingField { .. }
                | DatasetError::ExtraFields { .. }
                | DatasetError::Header { .. }
        )
    }
}

/// Streaming iterator over the rows of a flight-code dataset.
///
/// The header row is checked on the first call to `next`; a bad header ends
/// the stream after its error. Other rows are parsed lazily, and a malformed
/// row yields an error for that row only.
pub struct RecordReader<R: Read> {
    rows: csv::StringRecordsIntoIter<R>,
    header_checked: bool,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a reader over delimited text that starts with a header row.
    pub fn new(reader: R, delimiter: u8) -> Self {
        let rows = csv::ReaderBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader)
            .into_records();
        Self {
            rows,
            header_checked: false,
            done: false,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<FeatureRecord, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.header_checked {
            self.header_checked = true;
            let header = match self.rows.next()? {
                Ok(header) => header,
                Err(err) => return Some(Err(DatasetError::Csv(err))),
            };
            if let Err(err) = check_header(&header) {
                self.done = true;
                return Some(Err(err));
            }
        }
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(err) => return Some(Err(DatasetError::Csv(err))),
        };
        Some(parse_row(&row))
    }
}

fn check_header(header: &csv::StringRecord) -> Result<(), DatasetError> {
    let matches = header.len() == 2
        && header[0].eq_ignore_ascii_case(FLIGHT_CODE_COLUMN)
        && header[1].eq_ignore_ascii_case(IATA_CODE_COLUMN);
    if matches {
        Ok(())
    } else {
        Err(DatasetError::Header {
            found: header.iter().collect::<Vec<_>>().join(","),
        })
    }
}

fn parse_row(row: &csv::StringRecord) -> Result<FeatureRecord, DatasetError> {
    let line = row.position().map(|pos| pos.line()).unwrap_or(0);
    if row.len() > 2 {
        return Err(DatasetError::ExtraFields {
            line,
            found: row.len(),
        });
    }
    let flight_code = row.get(0).ok_or(DatasetError::MissingField {
        line,
        field: FLIGHT_CODE_COLUMN,
    })?;
    let label = row
        .get(1)
        .filter(|value| !value.is_empty())
        .ok_or(DatasetError::MissingField {
            line,
            field: IATA_CODE_COLUMN,
        })?;
    Ok(FeatureRecord::new(flight_code, label))
}

/// Open a dataset file for streaming.
pub fn open_records(
    path: &Path,
    delimiter: u8,
) -> Result<RecordReader<BufReader<File>>, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(RecordReader::new(BufReader::new(file), delimiter))
}

/// Read a whole dataset file into memory, failing on the first bad row.
pub fn read_records(path: &Path, delimiter: u8) -> Result<Vec<FeatureRecord>, DatasetError> {
    open_records(path, delimiter)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_rows_after_header() {
        let text = "FlightCode,IATACode\nB738-ABC,737\nA320-XYZ , 320\n";
        let rows: Vec<_> = RecordReader::new(text.as_bytes(), b',')
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![
                FeatureRecord::new("B738-ABC", "737"),
                FeatureRecord::new("A320-XYZ", "320"),
            ]
        );
    }

    #[test]
    fn short_row_reports_missing_label_with_line() {
        let text = "FlightCode,IATACode\nB738-ABC,737\nA320-XYZ\n";
        let mut rows = RecordReader::new(text.as_bytes(), b',');
        assert!(rows.next().unwrap().is_ok());
        match rows.next().unwrap() {
            Err(DatasetError::MissingField { line, field }) => {
                assert_eq!(line, 3);
                assert_eq!(field, IATA_CODE_COLUMN);
            }
            other => panic!("unexpected row result: {other:?}"),
        }
        assert!(rows.next().is_none());
    }

    #[test]
    fn extra_columns_are_rejected_with_line() {
        let text = "FlightCode,IATACode\nB738-ABC,737,junk\nA320-XYZ,320\n";
        let mut rows = RecordReader::new(text.as_bytes(), b',');
        match rows.next().unwrap() {
            Err(DatasetError::ExtraFields { line, found }) => {
                assert_eq!(line, 2);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected row result: {other:?}"),
        }
        assert_eq!(
            rows.next().unwrap().unwrap(),
            FeatureRecord::new("A320-XYZ", "320")
        );
    }

    #[test]
    fn swapped_header_ends_the_stream() {
        let text = "IATACode,FlightCode\n737,B738-ABC\n";
        let mut rows = RecordReader::new(text.as_bytes(), b',');
        match rows.next().unwrap() {
            Err(err @ DatasetError::Header { .. }) => {
                assert!(err.is_malformed_record());
                assert!(err.to_string().contains("IATACode,FlightCode"));
            }
            other => panic!("unexpected row result: {other:?}"),
        }
        assert!(rows.next().is_none());
    }

    #[test]
    fn header_names_ignore_case() {
        let text = "flightcode,iatacode\nB738-ABC,737\n";
        assert_eq!(RecordReader::new(text.as_bytes(), b',').count(), 1);
        assert_eq!(RecordReader::new(&b""[..], b',').count(), 0);
    }

    #[test]
    fn honors_custom_delimiter() {
        let text = "FlightCode;IATACode\nQF73H1;73H\n";
        let rows = RecordReader::new(text.as_bytes(), b';')
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(rows[0].true_label, "73H");
    }

    #[test]
    fn read_records_loads_file_and_reports_missing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("FlightCodes.csv");
        std::fs::write(&path, "FlightCode,IATACode\nB738-ABC,737\n").unwrap();
        assert_eq!(read_records(&path, b',').unwrap().len(), 1);

        let err = read_records(&dir.path().join("missing.csv"), b',').unwrap_err();
        assert!(matches!(err, DatasetError::Open { .. }));
    }
}
