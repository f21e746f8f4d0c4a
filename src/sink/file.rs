//! Filesystem sink for summaries.

use crate::core::envelope::EnvelopeBuilder;
use crate::core::summary::Summary;
use crate::error::SinkError;
use crate::sink::SummarySink;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Layout of summaries on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One pretty-printed JSON file per summary
    #[default]
    Json,
    /// One JSON line per summary, appended to a single file per run
    Jsonl,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "jsonl" => Ok(OutputFormat::Jsonl),
            other => Err(format!("unknown output format '{other}' (expected json or jsonl)")),
        }
    }
}

/// Writes summary envelopes into a directory.
pub struct FileSink {
    directory: PathBuf,
    format: OutputFormat,
    envelopes: EnvelopeBuilder,
    /// Open JSON Lines file, created on first write
    lines: Option<BufWriter<File>>,
    /// Timestamp naming the JSON Lines file of this run
    run_stamp: String,
}

impl FileSink {
    /// Create a sink writing into `directory`, creating it if needed.
    pub fn new(
        directory: impl Into<PathBuf>,
        format: OutputFormat,
        envelopes: EnvelopeBuilder,
    ) -> Result<Self, SinkError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;

        Ok(Self {
            directory,
            format,
            envelopes,
            lines: None,
            run_stamp: Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the JSON Lines file used by this run.
    pub fn lines_path(&self) -> PathBuf {
        self.directory
            .join(format!("summaries_{}.jsonl", self.run_stamp))
    }

    fn write_file(&self, summary: &Summary) -> Result<(), SinkError> {
        let file_name = format!(
            "{}_{:06}.json",
            Utc::now().format("%Y-%m-%d_%H-%M-%S"),
            summary.sequence
        );
        let json = serde_json::to_string_pretty(&self.envelopes.build(summary))?;
        std::fs::write(self.directory.join(file_name), json)?;
        Ok(())
    }

    fn append_line(&mut self, summary: &Summary) -> Result<(), SinkError> {
        if self.lines.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.lines_path())?;
            self.lines = Some(BufWriter::new(file));
        }

        let envelope = self.envelopes.build(summary);
        if let Some(writer) = self.lines.as_mut() {
            serde_json::to_writer(&mut *writer, &envelope)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        Ok(())
    }
}

impl SummarySink for FileSink {
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError> {
        match self.format {
            OutputFormat::Json => self.write_file(summary),
            OutputFormat::Jsonl => self.append_line(summary),
        }
    }
}
