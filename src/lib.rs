//! Stream Summary Agent - windowed statistical summaries over record streams.
//!
//! This library groups an unbounded stream of structured records into
//! fixed-count windows and emits, for every window, a compact summary of each
//! column: mean, population standard deviation, maximum and a fixed-range
//! histogram.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Stream Summary Agent                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Source    │──▶│  Windowing  │──▶│   Summary   │       │
//! │  │ (csv/jsonl) │   │ (N records) │   │  (compute)  │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                             │               │
//! │         ┌─────────────┐              ┌─────────────┐       │
//! │         │  Activity   │◀─────────────│    Sink     │       │
//! │         │    Log      │              │ (file/http) │       │
//! │         └─────────────┘              └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//! use stream_summary_agent::{
//!     BinningConfig, IterSource, MemorySink, PipelineConfig, PipelineDriver, Record,
//! };
//!
//! let config = PipelineConfig::new(
//!     NonZeroUsize::new(2).unwrap(),
//!     BinningConfig::new(2, 0.0, 4.0).unwrap(),
//! );
//! let source = IterSource::from_records(vec![
//!     Record::new().with("x", 1.0),
//!     Record::new().with("x", 3.0),
//! ]);
//!
//! let mut driver = PipelineDriver::new(config, source, MemorySink::new());
//! driver.run().unwrap();
//!
//! let x = driver.sink().summaries()[0].column("x").unwrap();
//! assert_eq!(x.histogram, vec![1, 1]);
//! ```

pub mod activity;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod sink;
pub mod source;

// Re-export key types at crate root for convenience
pub use activity::{ActivityLog, ActivityStats, SharedActivityLog};
pub use config::{Config, ConfigError, SinkConfig};
pub use crate::core::{
    BinningConfig, ColumnStatistics, ColumnSummary, EnvelopeBuilder, Summary, SummaryEngine,
    SummaryEnvelope, Window, WindowAccumulator,
};
pub use error::{PipelineError, SchemaMismatch, SinkError, SourceError, TypeCoercionError};
pub use pipeline::{PipelineConfig, PipelineDriver, RunReport, SinkFailurePolicy, Termination};
pub use sink::{FileSink, MemorySink, OutputFormat, RetryPolicy, RetryingSink, SummarySink, WriterSink};
pub use source::{
    ChannelSource, CsvSource, FieldValue, InputFormat, IterSource, JsonLinesSource, Record,
    RecordSource, Schema,
};

// HTTP sink re-exports (when enabled)
#[cfg(feature = "http")]
pub use sink::{BlockingHttpSink, HttpSink, HttpSinkConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
