//! Alert decisions derived from assessment results.
//!
//! Alerts are pure functions of an assessment plus thresholds: no clocks,
//! no history, no deduplication state. Each kind can appear at most once
//! per evaluation because each kind has exactly one decision site.

use crate::model::ModelAssessment;
use crate::models::{Alert, AlertKind, AlertSeverity, AssessmentResult};
use crate::rules::AlertThresholds;

/// Derives table-path alerts from one assessment.
///
/// Returned most severe first; within a severity the decision order
/// (overall, anomalies, failure rate) is preserved. Timestamps are copied
/// from the assessment so re-evaluation yields identical alerts.
pub fn evaluate_alerts(result: &AssessmentResult, thresholds: &AlertThresholds) -> Vec<Alert> {
    let subject = format!("{}.{}", result.source_id, result.table_id);
    let mut alerts = Vec::new();

    if result.overall_score < thresholds.overall {
        let severity = if result.overall_score < 70.0 {
            AlertSeverity::Critical
        } else {
            AlertSeverity::Warning
        };
        alerts.push(Alert {
            kind: AlertKind::OverallQualityDegradation,
            severity,
            subject_id: subject.clone(),
            message: format!(
                "overall quality score {:.1} is below {:.1}",
                result.overall_score, thresholds.overall
            ),
            observed_value: result.overall_score,
            threshold: thresholds.overall,
            timestamp: result.timestamp,
        });
    }

    let anomalies = result.anomalies_detected();
    if anomalies > thresholds.max_anomalies {
        alerts.push(Alert {
            kind: AlertKind::AnomalySpike,
            severity: AlertSeverity::Warning,
            subject_id: subject.clone(),
            message: format!(
                "{} anomaly findings exceed the limit of {}",
                anomalies, thresholds.max_anomalies
            ),
            observed_value: anomalies as f64,
            threshold: thresholds.max_anomalies as f64,
            timestamp: result.timestamp,
        });
    }

    let attempted = result.checks_passed + result.checks_failed;
    let failure_rate = if attempted == 0 {
        0.0
    } else {
        result.checks_failed as f64 / attempted as f64
    };
    if failure_rate > thresholds.max_failure_rate {
        alerts.push(Alert {
            kind: AlertKind::HighFailureRate,
            severity: AlertSeverity::Warning,
            subject_id: subject,
            message: format!(
                "{:.1}% of checks failed, above the {:.1}% limit",
                failure_rate * 100.0,
                thresholds.max_failure_rate * 100.0
            ),
            observed_value: failure_rate,
            threshold: thresholds.max_failure_rate,
            timestamp: result.timestamp,
        });
    }

    sort_most_severe_first(&mut alerts);
    alerts
}

/// Derives model-path alerts from one model assessment.
pub fn evaluate_model_alerts(
    assessment: &ModelAssessment,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if assessment.metrics.accuracy < thresholds.accuracy {
        alerts.push(Alert {
            kind: AlertKind::AccuracyDegradation,
            severity: AlertSeverity::Critical,
            subject_id: assessment.model_id.clone(),
            message: format!(
                "accuracy {:.3} is below {:.3}",
                assessment.metrics.accuracy, thresholds.accuracy
            ),
            observed_value: assessment.metrics.accuracy,
            threshold: thresholds.accuracy,
            timestamp: assessment.timestamp,
        });
    }

    if assessment.drift_score > thresholds.drift {
        alerts.push(Alert {
            kind: AlertKind::ModelDrift,
            severity: AlertSeverity::Warning,
            subject_id: assessment.model_id.clone(),
            message: format!(
                "drift score {:.3} exceeds {:.3}",
                assessment.drift_score, thresholds.drift
            ),
            observed_value: assessment.drift_score,
            threshold: thresholds.drift,
            timestamp: assessment.timestamp,
        });
    }

    if assessment.confidence_mean < thresholds.confidence {
        alerts.push(Alert {
            kind: AlertKind::LowConfidence,
            severity: AlertSeverity::Warning,
            subject_id: assessment.model_id.clone(),
            message: format!(
                "mean prediction confidence {:.3} is below {:.3}",
                assessment.confidence_mean, thresholds.confidence
            ),
            observed_value: assessment.confidence_mean,
            threshold: thresholds.confidence,
            timestamp: assessment.timestamp,
        });
    }

    sort_most_severe_first(&mut alerts);
    alerts
}

fn sort_most_severe_first(alerts: &mut [Alert]) {
    // Stable sort keeps decision order within a severity.
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassificationMetrics;
    use crate::models::{Anomaly, AnomalyMethod, DimensionSet};
    use chrono::Utc;
    use uuid::Uuid;

    fn result(overall: f64, anomalies: usize, passed: u64, failed: u64) -> AssessmentResult {
        AssessmentResult {
            id: Uuid::new_v4(),
            source_id: "timing".to_string(),
            table_id: "results".to_string(),
            timestamp: Utc::now(),
            dimensions: DimensionSet::default(),
            drift_score: None,
            overall_score: overall,
            anomalies: (0..anomalies)
                .map(|i| Anomaly {
                    column: format!("c{}", i),
                    method: AnomalyMethod::Zscore,
                    count: 1,
                    percentage_of_rows: 1.0,
                })
                .collect(),
            checks_passed: passed,
            checks_failed: failed,
            issues: vec![],
        }
    }

    fn model_assessment(accuracy: f64, drift: f64, confidence: f64) -> ModelAssessment {
        ModelAssessment {
            id: Uuid::new_v4(),
            model_id: "stage-winner".to_string(),
            timestamp: Utc::now(),
            metrics: ClassificationMetrics {
                accuracy,
                precision: accuracy,
                recall: accuracy,
                f1: accuracy,
            },
            predictions_count: 100,
            confidence_mean: confidence,
            confidence_std: 0.05,
            drift_score: drift,
        }
    }

    #[test]
    fn test_healthy_assessment_produces_no_alerts() {
        let alerts = evaluate_alerts(&result(99.0, 0, 10, 0), &AlertThresholds::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_boundary_is_strict() {
        // Exactly at the threshold: no alert.
        let alerts = evaluate_alerts(&result(85.0, 0, 0, 0), &AlertThresholds::default());
        assert!(alerts.is_empty());
        // Just below: warning.
        let alerts = evaluate_alerts(&result(84.9, 0, 0, 0), &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::OverallQualityDegradation);
        assert_eq!(alerts[0].severity, AlertSeverity::Warning);
    }

    #[test]
    fn test_severe_degradation_is_critical() {
        let alerts = evaluate_alerts(&result(65.0, 0, 0, 0), &AlertThresholds::default());
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
    }

    #[test]
    fn test_anomaly_spike_above_limit_only() {
        let alerts = evaluate_alerts(&result(95.0, 10, 0, 0), &AlertThresholds::default());
        assert!(alerts.is_empty());
        let alerts = evaluate_alerts(&result(95.0, 11, 0, 0), &AlertThresholds::default());
        assert_eq!(alerts[0].kind, AlertKind::AnomalySpike);
    }

    #[test]
    fn test_failure_rate_zero_denominator() {
        let alerts = evaluate_alerts(&result(95.0, 0, 0, 0), &AlertThresholds::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn test_high_failure_rate() {
        // 2 of 10 failed = 0.2 > 0.1.
        let alerts = evaluate_alerts(&result(95.0, 0, 8, 2), &AlertThresholds::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::HighFailureRate);
        assert_eq!(alerts[0].observed_value, 0.2);
    }

    #[test]
    fn test_alerts_sorted_most_severe_first_and_deterministic() {
        let r = result(60.0, 20, 5, 5);
        let alerts = evaluate_alerts(&r, &AlertThresholds::default());
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[0].kind, AlertKind::OverallQualityDegradation);
        assert_eq!(alerts[1].kind, AlertKind::AnomalySpike);
        assert_eq!(alerts[2].kind, AlertKind::HighFailureRate);

        let again = evaluate_alerts(&r, &AlertThresholds::default());
        assert_eq!(serde_json::to_value(&alerts).unwrap(), serde_json::to_value(&again).unwrap());
    }

    #[test]
    fn test_each_kind_at_most_once() {
        let alerts = evaluate_alerts(&result(10.0, 100, 0, 100), &AlertThresholds::default());
        let mut kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        let before = kinds.len();
        kinds.dedup();
        assert_eq!(kinds.len(), before);
    }

    #[test]
    fn test_model_alerts() {
        let alerts =
            evaluate_model_alerts(&model_assessment(0.80, 0.10, 0.60), &AlertThresholds::default());
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].kind, AlertKind::AccuracyDegradation);
        assert_eq!(alerts[0].severity, AlertSeverity::Critical);
        assert_eq!(alerts[1].kind, AlertKind::ModelDrift);
        assert_eq!(alerts[2].kind, AlertKind::LowConfidence);

        let healthy =
            evaluate_model_alerts(&model_assessment(0.95, 0.01, 0.90), &AlertThresholds::default());
        assert!(healthy.is_empty());
    }
}
