//! Pipeline activity log.
//!
//! Counts what the pipeline did (records read and rejected, windows sealed,
//! summaries emitted, failures) and optionally persists the cumulative counts
//! across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Activity counters for the current process.
#[derive(Debug)]
pub struct ActivityLog {
    /// Records pulled from the source
    records_read: AtomicU64,
    /// Records rejected for not matching the schema
    records_rejected: AtomicU64,
    /// Windows sealed by the accumulator
    windows_sealed: AtomicU64,
    /// Windows dropped because a cell was not numeric
    windows_failed: AtomicU64,
    /// Summaries accepted by the sink
    summaries_emitted: AtomicU64,
    /// Summaries the sink refused
    sink_failures: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl ActivityLog {
    /// Create a new activity log.
    pub fn new() -> Self {
        Self {
            records_read: AtomicU64::new(0),
            records_rejected: AtomicU64::new(0),
            windows_sealed: AtomicU64::new(0),
            windows_failed: AtomicU64::new(0),
            summaries_emitted: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an activity log that continues the counts stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("Could not load previous activity stats: {}", e);
        }

        log
    }

    pub fn record_read(&self) {
        self.records_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.records_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_sealed(&self) {
        self.windows_sealed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_failed(&self) {
        self.windows_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_summary_emitted(&self) {
        self.summaries_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sink_failure(&self) {
        self.sink_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn stats(&self) -> ActivityStats {
        ActivityStats {
            records_read: self.records_read.load(Ordering::Relaxed),
            records_rejected: self.records_rejected.load(Ordering::Relaxed),
            windows_sealed: self.windows_sealed.load(Ordering::Relaxed),
            windows_failed: self.windows_failed.load(Ordering::Relaxed),
            summaries_emitted: self.summaries_emitted.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Pipeline Activity:\n\
             - Records read: {}\n\
             - Records rejected (schema mismatch): {}\n\
             - Windows sealed: {}\n\
             - Windows dropped (non-numeric data): {}\n\
             - Summaries emitted: {}\n\
             - Sink failures: {}\n\
             - Session duration: {} seconds",
            stats.records_read,
            stats.records_rejected,
            stats.windows_sealed,
            stats.windows_failed,
            stats.summaries_emitted,
            stats.sink_failures,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedStats {
                records_read: stats.records_read,
                records_rejected: stats.records_rejected,
                windows_sealed: stats.windows_sealed,
                windows_failed: stats.windows_failed,
                summaries_emitted: stats.summaries_emitted,
                sink_failures: stats.sink_failures,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    /// Load stats from disk.
    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.records_read
                    .store(persisted.records_read, Ordering::Relaxed);
                self.records_rejected
                    .store(persisted.records_rejected, Ordering::Relaxed);
                self.windows_sealed
                    .store(persisted.windows_sealed, Ordering::Relaxed);
                self.windows_failed
                    .store(persisted.windows_failed, Ordering::Relaxed);
                self.summaries_emitted
                    .store(persisted.summaries_emitted, Ordering::Relaxed);
                self.sink_failures
                    .store(persisted.sink_failures, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of activity statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStats {
    pub records_read: u64,
    pub records_rejected: u64,
    pub windows_sealed: u64,
    pub windows_failed: u64,
    pub summaries_emitted: u64,
    pub sink_failures: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Stats format for persistence.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    records_read: u64,
    records_rejected: u64,
    windows_sealed: u64,
    windows_failed: u64,
    summaries_emitted: u64,
    sink_failures: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared activity log.
pub type SharedActivityLog = Arc<ActivityLog>;

/// Create a new shared activity log.
pub fn create_shared_log() -> SharedActivityLog {
    Arc::new(ActivityLog::new())
}

/// Create a new shared activity log with persistence.
pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedActivityLog {
    Arc::new(ActivityLog::with_persistence(path))
}
