//! Summary computation over sealed windows.
//!
//! Every column is summarized independently: its values are gathered in
//! record order, read as numeric-or-null, then fed to the statistics and the
//! histogram with the run's [`BinningConfig`].

use crate::core::histogram::{self, BinningConfig};
use crate::core::statistics::ColumnStatistics;
use crate::core::windowing::Window;
use crate::error::TypeCoercionError;
use crate::source::types::FieldValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Digest of one column over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub mean: f64,
    pub stddev: f64,
    pub max: f64,
    /// Bin counts, lowest bin first
    pub histogram: Vec<u64>,
    /// Non-null values seen
    pub count: usize,
    /// Null values excluded
    pub null_count: usize,
}

impl ColumnSummary {
    fn new(stats: ColumnStatistics, histogram: Vec<u64>) -> Self {
        Self {
            mean: stats.mean,
            stddev: stats.stddev,
            max: stats.max,
            histogram,
            count: stats.count,
            null_count: stats.null_count,
        }
    }
}

/// Statistical digest of one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Sequence index of the summarized window
    pub sequence: u64,
    /// Stream offset of the window's first record
    pub first_offset: u64,
    /// Records in the window
    pub record_count: usize,
    /// When the summary was computed
    pub computed_at: DateTime<Utc>,
    /// Per-column digests keyed by column name
    pub columns: BTreeMap<String, ColumnSummary>,
}

impl Summary {
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.get(name)
    }
}

/// Turns sealed windows into summaries.
#[derive(Debug, Clone)]
pub struct SummaryEngine {
    binning: BinningConfig,
}

impl SummaryEngine {
    pub fn new(binning: BinningConfig) -> Self {
        Self { binning }
    }

    pub fn binning(&self) -> &BinningConfig {
        &self.binning
    }

    /// Summarize every column of a window.
    ///
    /// Fails on the first cell that cannot be read as numeric-or-null; no
    /// partial summary is produced in that case.
    pub fn summarize(&self, window: Window) -> Result<Summary, TypeCoercionError> {
        let mut columns = BTreeMap::new();

        for name in window.schema().columns() {
            let values = numeric_column(&window, name)?;
            let stats = ColumnStatistics::compute(&values);
            let counts = histogram::bin(&values, &self.binning);
            columns.insert(name.clone(), ColumnSummary::new(stats, counts));
        }

        Ok(Summary {
            sequence: window.sequence(),
            first_offset: window.first_offset(),
            record_count: window.len(),
            computed_at: Utc::now(),
            columns,
        })
    }
}

/// Read one column of a window as numeric-or-null values.
fn numeric_column(window: &Window, name: &str) -> Result<Vec<Option<f64>>, TypeCoercionError> {
    window
        .column(name)
        .enumerate()
        .map(|(position, cell)| {
            // Schema-checked on entry, absent cells read as null
            let cell = cell.unwrap_or(&FieldValue::Null);
            cell.numeric().ok_or_else(|| TypeCoercionError {
                column: name.to_string(),
                position,
                value: cell.to_string(),
            })
        })
        .collect()
}
