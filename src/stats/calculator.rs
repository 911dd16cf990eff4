//! Statistics Calculator Module
//! Descriptive statistics and rounding helpers shared by the aggregation views.

use serde::Serialize;
use statrs::statistics::Statistics;

/// Round to two decimals for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Unweighted arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(Statistics::mean(values.iter()))
    }
}

/// Descriptive statistics of the unemployment rates in one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub p05: f64,
    pub p95: f64,
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics, `None` when there are no values.
    pub fn describe(values: &[f64]) -> Option<GroupSummary> {
        let n = values.len();
        if n == 0 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let std = if n > 1 {
            Statistics::std_dev(values.iter())
        } else {
            0.0
        };

        Some(GroupSummary {
            count: n,
            mean: round2(Statistics::mean(values.iter())),
            median: round2(median),
            std: round2(std),
            min: sorted[0],
            max: sorted[n - 1],
            p05: round2(Self::percentile(&sorted, 5.0)),
            p95: round2(Self::percentile(&sorted, 95.0)),
        })
    }

    /// Percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}
