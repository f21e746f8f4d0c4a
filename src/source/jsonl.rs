//! JSON Lines record source.
//!
//! Reads one JSON object per line from any buffered reader (a file, stdin or
//! a socket). Blank lines are skipped.

use crate::error::SourceError;
use crate::source::types::Record;
use crate::source::RecordSource;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads records from newline-delimited JSON.
pub struct JsonLinesSource<R> {
    reader: R,
    line: String,
    line_number: u64,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_number: 0,
        }
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

impl JsonLinesSource<BufReader<File>> {
    /// Open a file of JSON lines.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonLinesSource<io::StdinLock<'static>> {
    /// Read JSON lines from standard input.
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> RecordSource for JsonLinesSource<R> {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let record = serde_json::from_str(trimmed).map_err(|e| SourceError::Malformed {
                line: self.line_number,
                message: e.to_string(),
            })?;
            return Ok(Some(record));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::types::FieldValue;
    use std::io::Cursor;

    #[test]
    fn test_reads_records_and_skips_blank_lines() {
        let input = "{\"x\": 1, \"y\": null}\n\n   \n{\"x\": 2.5, \"y\": \"3\"}\n";
        let mut source = JsonLinesSource::new(Cursor::new(input));

        let first = source.next_record().unwrap().unwrap();
        assert_eq!(first.get("x"), Some(&FieldValue::Number(1.0)));
        assert_eq!(first.get("y"), Some(&FieldValue::Null));

        let second = source.next_record().unwrap().unwrap();
        assert_eq!(second.get("y"), Some(&FieldValue::Text("3".to_string())));

        assert!(source.next_record().unwrap().is_none());
        assert_eq!(source.line_number(), 4);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut source = JsonLinesSource::new(Cursor::new("{\"x\": 1}"));
        assert!(source.next_record().unwrap().is_some());
        assert!(source.next_record().unwrap().is_none());
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let input = "{\"x\": 1}\nnot json\n";
        let mut source = JsonLinesSource::new(Cursor::new(input));

        assert!(source.next_record().unwrap().is_some());
        match source.next_record() {
            Err(SourceError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed line error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("stream-summary-missing-input.jsonl");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            JsonLinesSource::open(&path),
            Err(SourceError::Io(_))
        ));
    }
}
