//! Per-column aggregate statistics.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Mean, population standard deviation and maximum of a column.
///
/// An empty or all-null column reports `0.0` for all three; check `count`
/// to tell "no data" apart from real zeros.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub mean: f64,
    pub stddev: f64,
    pub max: f64,
    /// Number of non-null values the statistics were computed from
    pub count: usize,
    /// Number of null values excluded
    pub null_count: usize,
}

impl ColumnStatistics {
    /// Compute statistics over a column, ignoring nulls.
    ///
    /// NaN and infinite values count as nulls.
    pub fn compute(values: &[Option<f64>]) -> Self {
        let present: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| v.is_finite())
            .collect();
        let null_count = values.len() - present.len();

        if present.is_empty() {
            return Self {
                null_count,
                ..Self::default()
            };
        }

        Self {
            mean: present.iter().mean(),
            stddev: present.iter().population_std_dev(),
            max: Statistics::max(present.iter()),
            count: present.len(),
            null_count,
        }
    }

    /// Whether the column had no non-null values.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_basic_statistics() {
        let stats = ColumnStatistics::compute(&[Some(1.0), Some(3.0)]);
        assert!(approx(stats.mean, 2.0));
        assert!(approx(stats.stddev, 1.0));
        assert!(approx(stats.max, 3.0));
        assert_eq!(stats.count, 2);
    }

    #[test]
    fn test_population_std_dev() {
        let values: Vec<Option<f64>> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .into_iter()
            .map(Some)
            .collect();
        let stats = ColumnStatistics::compute(&values);
        assert!(approx(stats.mean, 5.0));
        assert!(approx(stats.stddev, 2.0));
        assert!(approx(stats.max, 9.0));
    }

    #[test]
    fn test_all_null_column() {
        let stats = ColumnStatistics::compute(&[None, None, None]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.max, 0.0);
        assert_eq!(stats.null_count, 3);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_nulls_excluded() {
        let stats = ColumnStatistics::compute(&[Some(-4.0), None, Some(-2.0), None]);
        assert!(approx(stats.mean, -3.0));
        assert!(approx(stats.stddev, 1.0));
        assert!(approx(stats.max, -2.0));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.null_count, 2);
    }

    #[test]
    fn test_nan_excluded() {
        let stats = ColumnStatistics::compute(&[Some(f64::NAN), Some(1.0), Some(3.0)]);
        assert!(approx(stats.mean, 2.0));
        assert!(approx(stats.stddev, 1.0));
        assert!(approx(stats.max, 3.0));
        assert_eq!(stats.count, 2);
        assert_eq!(stats.null_count, 1);

        let stats = ColumnStatistics::compute(&[Some(f64::INFINITY), Some(f64::NAN)]);
        assert!(stats.is_empty());
        assert_eq!(stats.null_count, 2);
        assert_eq!((stats.mean, stats.stddev, stats.max), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_single_value() {
        let stats = ColumnStatistics::compute(&[Some(7.5)]);
        assert!(approx(stats.mean, 7.5));
        assert_eq!(stats.stddev, 0.0);
        assert!(approx(stats.max, 7.5));
    }
}
