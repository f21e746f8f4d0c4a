//! Sinks receiving emitted summaries.
//!
//! The pipeline calls [`SummarySink::write`] exactly once per summary and
//! never retries; wrap a sink in [`RetryingSink`] to get bounded retries.

pub mod file;
#[cfg(feature = "http")]
pub mod http;
pub mod retry;

// Re-export commonly used types
pub use file::{FileSink, OutputFormat};
#[cfg(feature = "http")]
pub use http::{BlockingHttpSink, HttpSink, HttpSinkConfig};
pub use retry::{RetryPolicy, RetryingSink};

use crate::core::envelope::EnvelopeBuilder;
use crate::core::summary::Summary;
use crate::error::SinkError;
use std::io::Write;

/// Destination for summaries.
pub trait SummarySink {
    /// Hand over one summary.
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError>;
}

impl<S: SummarySink + ?Sized> SummarySink for Box<S> {
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError> {
        (**self).write(summary)
    }
}

/// Keeps every summary in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    summaries: Vec<Summary>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summaries(&self) -> &[Summary] {
        &self.summaries
    }

    pub fn into_summaries(self) -> Vec<Summary> {
        self.summaries
    }
}

impl SummarySink for MemorySink {
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError> {
        self.summaries.push(summary.clone());
        Ok(())
    }
}

/// Writes one JSON envelope per line to any writer (stdout, a pipe, a socket).
pub struct WriterSink<W> {
    writer: W,
    envelopes: EnvelopeBuilder,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, envelopes: EnvelopeBuilder) -> Self {
        Self { writer, envelopes }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl WriterSink<std::io::Stdout> {
    pub fn stdout(envelopes: EnvelopeBuilder) -> Self {
        Self::new(std::io::stdout(), envelopes)
    }
}

impl<W: Write> SummarySink for WriterSink<W> {
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError> {
        let envelope = self.envelopes.build(summary);
        serde_json::to_writer(&mut self.writer, &envelope)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
