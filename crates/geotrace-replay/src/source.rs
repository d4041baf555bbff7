//! CSV record source.
//!
//! Each row becomes a JSON object keyed by the header row, with every value
//! kept as a string exactly as it appears in the file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{StringRecord, StringRecordsIntoIter};
use serde_json::{Map, Value};
use tracing::debug;

use geotrace_core::{EventRecord, REQUIRED_FIELDS};

use crate::error::{ReplayError, ReplayResult};

/// Lazily yields event records from a CSV file with a header row.
///
/// The source is single-pass; replaying again means opening it again.
pub struct RecordSource<R = File> {
    headers: StringRecord,
    rows: StringRecordsIntoIter<R>,
    /// 1-based data row counter, for error messages.
    row: u64,
}

impl RecordSource<File> {
    /// Open a CSV file and check its header row.
    pub fn open(path: &Path) -> ReplayResult<Self> {
        let reader = csv::Reader::from_path(path).map_err(|source| ReplayError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::from_csv(reader)?;
        debug!(?path, columns = source.headers.len(), "record source opened");
        Ok(source)
    }
}

impl<R: Read> RecordSource<R> {
    /// Wrap any reader producing CSV text with a header row.
    pub fn from_reader(reader: R) -> ReplayResult<Self> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv(mut reader: csv::Reader<R>) -> ReplayResult<Self> {
        let headers = reader
            .headers()
            .map_err(|source| ReplayError::Read { row: 0, source })?
            .clone();
        for required in REQUIRED_FIELDS {
            if !headers.iter().any(|h| h == required) {
                return Err(ReplayError::MissingColumn(required));
            }
        }
        Ok(Self {
            headers,
            rows: reader.into_records(),
            row: 0,
        })
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    fn to_record(&self, row: &StringRecord) -> EventRecord {
        let fields: Map<String, Value> = self
            .headers
            .iter()
            .zip(row.iter())
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        EventRecord::new(Value::Object(fields))
    }
}

impl<R: Read> Iterator for RecordSource<R> {
    type Item = ReplayResult<EventRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        self.row += 1;
        Some(match row {
            Ok(row) => Ok(self.to_record(&row)),
            Err(source) => Err(ReplayError::Read {
                row: self.row,
                source,
            }),
        })
    }
}
