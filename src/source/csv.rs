//! CSV record source.
//!
//! The header row names the columns. Every data row becomes one record with
//! cells kept as text, so numeric interpretation follows the same rules as
//! any other source. Empty cells are nulls.

use crate::error::SourceError;
use crate::source::types::{FieldValue, Record};
use crate::source::RecordSource;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Reads records from comma-separated values with a header row.
pub struct CsvSource<R> {
    reader: csv::Reader<R>,
    headers: Option<Vec<String>>,
    row: StringRecord,
}

impl<R: Read> CsvSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: ReaderBuilder::new().trim(Trim::All).from_reader(reader),
            headers: None,
            row: StringRecord::new(),
        }
    }

    /// Line of the input the reader has reached.
    pub fn line_number(&self) -> u64 {
        self.reader.position().line()
    }

    fn headers(&mut self) -> Result<&[String], SourceError> {
        if self.headers.is_none() {
            let names = self
                .reader
                .headers()
                .map_err(source_error)?
                .iter()
                .map(str::to_string)
                .collect();
            self.headers = Some(names);
        }
        Ok(self.headers.as_deref().unwrap_or_default())
    }
}

impl CsvSource<File> {
    /// Open a CSV file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        Ok(Self::new(File::open(path)?))
    }
}

impl CsvSource<io::Stdin> {
    /// Read CSV from standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<R: Read> RecordSource for CsvSource<R> {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        self.headers()?;
        if !self.reader.read_record(&mut self.row).map_err(source_error)? {
            return Ok(None);
        }

        let headers = self.headers.as_deref().unwrap_or_default();
        let record = headers
            .iter()
            .zip(self.row.iter())
            .map(|(name, cell)| {
                let value = if cell.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Text(cell.to_string())
                };
                (name.as_str(), value)
            })
            .collect();
        Ok(Some(record))
    }
}

fn source_error(e: csv::Error) -> SourceError {
    let line = e.position().map_or(0, |p| p.line());
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => SourceError::Io(io),
        _ => SourceError::Malformed { line, message },
    }
}
