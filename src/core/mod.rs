//! Core summarization pipeline.
//!
//! This module contains:
//! - Window management for grouping records into fixed-count windows
//! - Column statistics and fixed-range histograms
//! - Summary computation for sealed windows
//! - Export envelopes for summaries

pub mod envelope;
pub mod histogram;
pub mod statistics;
pub mod summary;
pub mod windowing;

// Re-export commonly used types
pub use envelope::{EnvelopeBuilder, Producer, SummaryEnvelope, ENVELOPE_VERSION, PRODUCER_NAME};
pub use histogram::{bin, BinningConfig};
pub use statistics::ColumnStatistics;
pub use summary::{ColumnSummary, Summary, SummaryEngine};
pub use windowing::{Window, WindowAccumulator};
