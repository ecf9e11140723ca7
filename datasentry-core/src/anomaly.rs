//! Statistical anomaly detection over sampled numeric columns.
//!
//! Two methods are supported: z-score against the population mean and
//! standard deviation, and IQR fences with linearly interpolated quartiles.
//! Detection is descriptive only; findings feed the aggregator and the
//! `anomaly_spike` alert decision but never change dimension scores.

use crate::models::{Anomaly, AnomalyMethod, Sample};
use crate::rules::RuleSet;

/// Detects anomalies in every column with a configured anomaly rule.
///
/// Only finite numeric values participate; a column with fewer than two
/// such values yields no finding. Columns are visited in rule order so the
/// output is deterministic for a given sample.
pub fn detect_anomalies(sample: &Sample, rules: &RuleSet) -> Vec<Anomaly> {
    let rows = sample.row_count();
    let mut findings = Vec::new();

    for (column, rule) in &rules.anomaly_rules {
        let values = sample.numeric_values(column);
        if values.len() < 2 {
            continue;
        }

        let count = match rule.method {
            AnomalyMethod::Zscore => count_zscore_outliers(&values, rule.threshold),
            AnomalyMethod::Iqr => count_iqr_outliers(&values),
        };

        if count > 0 {
            findings.push(Anomaly {
                column: column.clone(),
                method: rule.method,
                count: count as u64,
                percentage_of_rows: 100.0 * count as f64 / rows as f64,
            });
        }
    }

    findings
}

/// Counts values with `|z| > threshold` under population standardization.
/// A zero standard deviation means every value is identical; no outliers.
fn count_zscore_outliers(values: &[f64], threshold: f64) -> usize {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return 0;
    }
    values
        .iter()
        .filter(|v| ((*v - mean) / std_dev).abs() > threshold)
        .count()
}

/// Counts values outside `[Q1 - 1.5*IQR, Q3 + 1.5*IQR]`.
fn count_iqr_outliers(values: &[f64]) -> usize {
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let q1 = percentile(&sorted, 25.0);
    let q3 = percentile(&sorted, 75.0);
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    values.iter().filter(|v| **v < lower || **v > upper).count()
}

/// Linearly interpolated percentile over a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (rank - lo as f64) * (sorted[hi] - sorted[lo])
    }
}
