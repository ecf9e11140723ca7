//! Drift scoring against historical baselines.
//!
//! A drift score is the mean standardized distance between current metric
//! values and their baseline means. Metrics with no baseline entry or a
//! zero baseline standard deviation contribute nothing; drift is undefined
//! for them rather than infinite.

use std::collections::HashMap;

use crate::models::BaselineStats;

/// Computes the drift score for a set of current metric values.
///
/// Each metric with a usable baseline contributes
/// `|current - mean| / std_dev`; the score is the mean of the
/// contributions, or `0.0` when no metric has a usable baseline.
pub fn drift_score(
    current: &HashMap<String, f64>,
    baseline: &HashMap<String, BaselineStats>,
) -> f64 {
    let contributions: Vec<f64> = current
        .iter()
        .filter_map(|(metric, value)| {
            baseline
                .get(metric)
                .filter(|stats| stats.std_dev > 0.0)
                .map(|stats| (value - stats.mean).abs() / stats.std_dev)
        })
        .collect();

    if contributions.is_empty() {
        return 0.0;
    }
    contributions.iter().sum::<f64>() / contributions.len() as f64
}

/// Computes baseline statistics from a metric's recent history.
///
/// Uses the population standard deviation, matching the standardization in
/// [`drift_score`]. Returns `None` for an empty history.
pub fn baseline_from_history(history: &[f64]) -> Option<BaselineStats> {
    if history.is_empty() {
        return None;
    }
    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let variance = history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(BaselineStats {
        mean,
        std_dev: variance.sqrt(),
        sample_count: history.len() as u64,
    })
}
