//! Pipeline driver: read, accumulate, summarize, emit.
//!
//! The driver is a single consumer. Every sealed window is summarized and
//! written before the next record is pulled, so summaries leave in window
//! order and no two windows are ever in flight at once.
//!
//! ```text
//!  ┌──────────────┐   ┌───────────────────┐   ┌───────────────┐   ┌────────┐
//!  │ RecordSource │──▶│ WindowAccumulator │──▶│ SummaryEngine │──▶│  Sink  │
//!  └──────────────┘   └───────────────────┘   └───────────────┘   └────────┘
//! ```

use crate::activity::{create_shared_log, SharedActivityLog};
use crate::core::histogram::BinningConfig;
use crate::core::summary::SummaryEngine;
use crate::core::windowing::{Window, WindowAccumulator};
use crate::error::PipelineError;
use crate::sink::SummarySink;
use crate::source::RecordSource;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What to do when the sink refuses a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinkFailurePolicy {
    /// Log the failure and keep going
    #[default]
    Continue,
    /// End the run with [`PipelineError::SinkWrite`]
    FailFast,
}

/// Immutable settings for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Records per window
    pub window_size: NonZeroUsize,
    /// Histogram bins and range
    pub binning: BinningConfig,
    /// Summarize the trailing partial window at a clean end of stream.
    /// Never applied when the run is stopped.
    pub flush_partial: bool,
    pub sink_failure_policy: SinkFailurePolicy,
}

impl PipelineConfig {
    pub fn new(window_size: NonZeroUsize, binning: BinningConfig) -> Self {
        Self {
            window_size,
            binning,
            flush_partial: false,
            sink_failure_policy: SinkFailurePolicy::Continue,
        }
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The source reported end of stream
    EndOfStream,
    /// A stop was requested through the stop signal
    Stopped,
}

/// Per-run outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub termination: Termination,
    pub records_read: u64,
    pub records_rejected: u64,
    pub windows_sealed: u64,
    pub windows_failed: u64,
    pub summaries_emitted: u64,
    pub sink_failures: u64,
    /// Buffered records dropped without being summarized
    pub records_discarded: u64,
}

impl RunReport {
    fn new() -> Self {
        Self {
            termination: Termination::EndOfStream,
            records_read: 0,
            records_rejected: 0,
            windows_sealed: 0,
            windows_failed: 0,
            summaries_emitted: 0,
            sink_failures: 0,
            records_discarded: 0,
        }
    }
}

/// Drives records from a source through windowing and summarization into a sink.
pub struct PipelineDriver<S, K> {
    config: PipelineConfig,
    source: S,
    sink: K,
    accumulator: WindowAccumulator,
    engine: SummaryEngine,
    stop: Arc<AtomicBool>,
    activity: SharedActivityLog,
}

impl<S: RecordSource, K: SummarySink> PipelineDriver<S, K> {
    /// Create a driver over a source and a sink.
    pub fn new(config: PipelineConfig, source: S, sink: K) -> Self {
        Self {
            accumulator: WindowAccumulator::new(config.window_size),
            engine: SummaryEngine::new(config.binning),
            config,
            source,
            sink,
            stop: Arc::new(AtomicBool::new(false)),
            activity: create_shared_log(),
        }
    }

    /// Use an externally owned stop flag (e.g. one set by a signal handler).
    pub fn with_stop_signal(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Record activity into a shared log.
    pub fn with_activity_log(mut self, activity: SharedActivityLog) -> Self {
        self.activity = activity;
        self
    }

    /// Handle that requests a stop when set to `true`.
    pub fn stop_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Run until end of stream, a stop request, or a fatal error.
    ///
    /// A stop request is honored between records: a window that is already
    /// sealed is always summarized and written first, and the partially
    /// filled buffer is discarded rather than sealed.
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::new();

        tracing::info!(
            "Pipeline started: window size {}, {} bins over [{}, {}]",
            self.config.window_size,
            self.config.binning.num_bins(),
            self.config.binning.lower_bound(),
            self.config.binning.upper_bound()
        );

        loop {
            if self.stop.load(Ordering::SeqCst) {
                report.termination = Termination::Stopped;
                let dropped = self.accumulator.discard_pending();
                report.records_discarded += dropped as u64;
                tracing::info!("Stop requested, discarded {} buffered records", dropped);
                break;
            }

            let record = match self.source.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => {
                    self.finish_stream(&mut report)?;
                    break;
                }
                Err(e) => {
                    tracing::error!("Source read failed: {}", e);
                    return Err(PipelineError::SourceRead(e));
                }
            };
            report.records_read += 1;
            self.activity.record_read();

            match self.accumulator.offer(record) {
                Ok(Some(window)) => self.process_window(window, &mut report)?,
                Ok(None) => {}
                Err(mismatch) => {
                    report.records_rejected += 1;
                    self.activity.record_rejected();
                    tracing::warn!("Rejected record {}: {}", report.records_read - 1, mismatch);
                }
            }
        }

        tracing::info!(
            "Pipeline finished ({:?}): {} records, {} summaries emitted",
            report.termination,
            report.records_read,
            report.summaries_emitted
        );

        Ok(report)
    }

    /// Apply the end-of-stream policy to the partial buffer.
    fn finish_stream(&mut self, report: &mut RunReport) -> Result<(), PipelineError> {
        report.termination = Termination::EndOfStream;

        if self.config.flush_partial {
            if let Some(window) = self.accumulator.flush() {
                tracing::info!("Flushing partial window of {} records", window.len());
                self.process_window(window, report)?;
            }
        } else {
            let dropped = self.accumulator.discard_pending();
            if dropped > 0 {
                tracing::debug!("End of stream with {} records in a partial window", dropped);
            }
            report.records_discarded += dropped as u64;
        }

        Ok(())
    }

    /// Summarize a sealed window and hand it to the sink.
    fn process_window(&mut self, window: Window, report: &mut RunReport) -> Result<(), PipelineError> {
        report.windows_sealed += 1;
        self.activity.record_window_sealed();

        let sequence = window.sequence();
        let summary = match self.engine.summarize(window) {
            Ok(summary) => summary,
            Err(e) => {
                report.windows_failed += 1;
                self.activity.record_window_failed();
                tracing::warn!("Dropping window {}: {}", sequence, e);
                return Ok(());
            }
        };

        match self.sink.write(&summary) {
            Ok(()) => {
                report.summaries_emitted += 1;
                self.activity.record_summary_emitted();
                tracing::debug!(
                    "Emitted summary {} ({} records, {} columns)",
                    summary.sequence,
                    summary.record_count,
                    summary.columns.len()
                );
                Ok(())
            }
            Err(e) => {
                report.sink_failures += 1;
                self.activity.record_sink_failure();
                match self.config.sink_failure_policy {
                    SinkFailurePolicy::Continue => {
                        tracing::warn!("Sink rejected summary {}: {}", summary.sequence, e);
                        Ok(())
                    }
                    SinkFailurePolicy::FailFast => Err(PipelineError::SinkWrite {
                        sequence: summary.sequence,
                        source: e,
                    }),
                }
            }
        }
    }
}
