//! Fixed-range histogram binning.
//!
//! Values outside `[lower_bound, upper_bound]` are dropped, never folded
//! into the edge bins, so histogram totals only count in-range values.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Bin count and value range shared by every column's histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBinningConfig")]
pub struct BinningConfig {
    num_bins: usize,
    lower_bound: f64,
    upper_bound: f64,
}

#[derive(Deserialize)]
struct RawBinningConfig {
    num_bins: usize,
    lower_bound: f64,
    upper_bound: f64,
}

impl TryFrom<RawBinningConfig> for BinningConfig {
    type Error = ConfigError;

    fn try_from(raw: RawBinningConfig) -> Result<Self, Self::Error> {
        Self::new(raw.num_bins, raw.lower_bound, raw.upper_bound)
    }
}

impl Default for BinningConfig {
    fn default() -> Self {
        Self {
            num_bins: 10,
            lower_bound: 0.0,
            upper_bound: 50.0,
        }
    }
}

impl BinningConfig {
    /// Create a binning configuration, checking `num_bins >= 1` and a finite,
    /// non-empty range.
    pub fn new(num_bins: usize, lower_bound: f64, upper_bound: f64) -> Result<Self, ConfigError> {
        if num_bins == 0 {
            return Err(ConfigError::Invalid(
                "num_bins must be at least 1".to_string(),
            ));
        }
        if !lower_bound.is_finite() || !upper_bound.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "histogram bounds must be finite, got [{lower_bound}, {upper_bound}]"
            )));
        }
        if lower_bound >= upper_bound {
            return Err(ConfigError::Invalid(format!(
                "lower_bound ({lower_bound}) must be below upper_bound ({upper_bound})"
            )));
        }
        if !(upper_bound - lower_bound).is_finite() {
            return Err(ConfigError::Invalid(format!(
                "histogram range [{lower_bound}, {upper_bound}] is too wide to bin"
            )));
        }

        Ok(Self {
            num_bins,
            lower_bound,
            upper_bound,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Width of a single bin.
    pub fn bin_width(&self) -> f64 {
        (self.upper_bound - self.lower_bound) / self.num_bins as f64
    }

    /// Check whether a value falls inside the binned range (both ends inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower_bound && value <= self.upper_bound
    }

    /// Bin index for an in-range value.
    ///
    /// `upper_bound` itself lands in the last bin.
    pub fn bin_index(&self, value: f64) -> usize {
        let offset = ((value - self.lower_bound) / self.bin_width()).floor();
        if offset <= 0.0 {
            0
        } else {
            (offset as usize).min(self.num_bins - 1)
        }
    }
}

/// Count values into `config.num_bins()` bins, lowest bin first.
///
/// Nulls and out-of-range values are not counted.
pub fn bin(values: &[Option<f64>], config: &BinningConfig) -> Vec<u64> {
    let mut counts = vec![0u64; config.num_bins()];

    for value in values.iter().flatten() {
        if config.contains(*value) {
            counts[config.bin_index(*value)] += 1;
        }
    }

    counts
}
