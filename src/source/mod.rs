//! Record sources feeding the pipeline.
//!
//! A source is pulled one record at a time. `Ok(None)` signals end of stream;
//! any error is unrecoverable for the run that hit it.

pub mod channel;
pub mod csv;
pub mod jsonl;
pub mod types;

// Re-export commonly used types
pub use self::csv::CsvSource;
pub use channel::{ChannelSource, RecordSender};
pub use jsonl::JsonLinesSource;
pub use types::{FieldValue, Record, Schema};

use crate::error::SourceError;
use std::path::Path;

/// Pull-based supplier of records.
pub trait RecordSource {
    /// Wait for the next record.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    fn next_record(&mut self) -> Result<Option<Record>, SourceError>;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        (**self).next_record()
    }
}

/// Encoding of a record file or stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// One JSON object per line
    #[default]
    JsonLines,
    /// Header row followed by comma-separated rows
    Csv,
}

impl InputFormat {
    /// Guess the format from a path: `.csv` files are CSV, anything else
    /// (including `-` for stdin) is JSON Lines.
    pub fn detect(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => InputFormat::Csv,
            _ => InputFormat::JsonLines,
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jsonl" | "json" => Ok(InputFormat::JsonLines),
            "csv" => Ok(InputFormat::Csv),
            other => Err(format!("Unknown input format: {other} (expected jsonl or csv)")),
        }
    }
}

/// Open `path` (`-` for stdin) as a boxed source of the given format.
pub fn open(path: &str, format: InputFormat) -> Result<Box<dyn RecordSource>, SourceError> {
    Ok(match (path, format) {
        ("-", InputFormat::JsonLines) => Box::new(JsonLinesSource::stdin()),
        ("-", InputFormat::Csv) => Box::new(CsvSource::stdin()),
        (path, InputFormat::JsonLines) => Box::new(JsonLinesSource::open(path)?),
        (path, InputFormat::Csv) => Box::new(CsvSource::open(path)?),
    })
}

/// Source backed by an iterator, mostly useful for tests and replays.
pub struct IterSource<I> {
    inner: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Result<Record, SourceError>>,
{
    pub fn new(inner: I) -> Self {
        Self { inner }
    }
}

type RecordIter = std::iter::Map<std::vec::IntoIter<Record>, fn(Record) -> Result<Record, SourceError>>;

impl IterSource<RecordIter> {
    /// Source that yields the given records and then ends.
    pub fn from_records(records: Vec<Record>) -> Self {
        let ok: fn(Record) -> Result<Record, SourceError> = Ok;
        Self {
            inner: records.into_iter().map(ok),
        }
    }
}

impl<I> RecordSource for IterSource<I>
where
    I: Iterator<Item = Result<Record, SourceError>>,
{
    fn next_record(&mut self) -> Result<Option<Record>, SourceError> {
        self.inner.next().transpose()
    }
}
