//! Model performance assessment: classification metrics, confidence
//! statistics, and the model-path assessment record.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DataSentryError, Result};

/// Predictions and per-prediction confidences returned by an inference
/// provider for one labeled batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionBatch {
    pub predictions: Vec<String>,
    pub confidences: Vec<f64>,
}

/// Standard classification metrics for one evaluation batch.
///
/// Precision, recall, and F1 are support-weighted averages over the classes
/// present in the truth labels, with undefined per-class ratios treated
/// as 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassificationMetrics {
    /// Metric values keyed by name, the shape drift scoring consumes.
    pub fn as_map(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("accuracy".to_string(), self.accuracy),
            ("precision".to_string(), self.precision),
            ("recall".to_string(), self.recall),
            ("f1".to_string(), self.f1),
        ])
    }
}

/// Computes classification metrics from aligned truth/predicted label pairs.
///
/// Fails only on structurally unusable input: empty batches or mismatched
/// lengths.
pub fn classification_metrics(truth: &[String], predicted: &[String]) -> Result<ClassificationMetrics> {
    if truth.is_empty() {
        return Err(DataSentryError::evaluation(
            "model",
            "empty evaluation batch",
        ));
    }
    if truth.len() != predicted.len() {
        return Err(DataSentryError::evaluation(
            "model",
            format!(
                "{} truth labels but {} predictions",
                truth.len(),
                predicted.len()
            ),
        ));
    }

    let total = truth.len() as f64;
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count() as f64;
    let accuracy = correct / total;

    // Per-class counts; classes absent from the truth labels carry zero
    // support and cannot contribute to the weighted averages.
    let mut support: BTreeMap<&str, f64> = BTreeMap::new();
    let mut true_positives: BTreeMap<&str, f64> = BTreeMap::new();
    let mut predicted_positives: BTreeMap<&str, f64> = BTreeMap::new();
    for (t, p) in truth.iter().zip(predicted) {
        *support.entry(t).or_default() += 1.0;
        *predicted_positives.entry(p).or_default() += 1.0;
        if t == p {
            *true_positives.entry(t).or_default() += 1.0;
        }
    }

    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;
    for (class, class_support) in &support {
        let tp = true_positives.get(class).copied().unwrap_or(0.0);
        let pp = predicted_positives.get(class).copied().unwrap_or(0.0);
        let class_precision = if pp > 0.0 { tp / pp } else { 0.0 };
        let class_recall = tp / class_support;
        let class_f1 = if class_precision + class_recall > 0.0 {
            2.0 * class_precision * class_recall / (class_precision + class_recall)
        } else {
            0.0
        };
        let weight = class_support / total;
        precision += weight * class_precision;
        recall += weight * class_recall;
        f1 += weight * class_f1;
    }

    Ok(ClassificationMetrics {
        accuracy,
        precision,
        recall,
        f1,
    })
}

/// Mean and population standard deviation of prediction confidences.
/// Returns `(0.0, 0.0)` for an empty batch.
pub fn confidence_stats(confidences: &[f64]) -> (f64, f64) {
    if confidences.is_empty() {
        return (0.0, 0.0);
    }
    let n = confidences.len() as f64;
    let mean = confidences.iter().sum::<f64>() / n;
    let variance = confidences.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Complete performance assessment for one model evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelAssessment {
    pub id: Uuid,
    pub model_id: String,
    pub timestamp: DateTime<Utc>,
    pub metrics: ClassificationMetrics,
    pub predictions_count: u64,
    pub confidence_mean: f64,
    pub confidence_std: f64,
    pub drift_score: f64,
}
