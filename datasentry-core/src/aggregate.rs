//! Assembly of per-dimension results into one assessment.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Anomaly, AssessmentResult, DimensionSet, IssueKind};
use crate::rules::AlertThresholds;

/// Builds the final [`AssessmentResult`] from evaluator outputs.
///
/// The overall score is the arithmetic mean of the dimensions that had at
/// least one applicable rule; inapplicable dimensions are excluded, not
/// defaulted. With no applicable dimension at all the overall score is 100:
/// nothing was checked, so nothing failed.
///
/// Checks are counted per check-kind issue by comparing the issue's score
/// against the floor registered for its dimension (default 95); error-kind
/// issues count toward neither side.
pub fn aggregate(
    source_id: impl Into<String>,
    table_id: impl Into<String>,
    timestamp: DateTime<Utc>,
    dimensions: DimensionSet,
    anomalies: Vec<Anomaly>,
    drift_score: Option<f64>,
    thresholds: &AlertThresholds,
) -> AssessmentResult {
    let applicable: Vec<f64> = dimensions
        .iter()
        .filter_map(|(_, result)| result.score)
        .collect();
    let overall_score = if applicable.is_empty() {
        100.0
    } else {
        applicable.iter().sum::<f64>() / applicable.len() as f64
    };

    let mut checks_passed: u64 = 0;
    let mut checks_failed: u64 = 0;
    let mut issues = Vec::new();
    for (dimension, result) in dimensions.iter() {
        let floor = thresholds.dimension_minimum(dimension);
        for issue in &result.issues {
            if issue.kind == IssueKind::Check {
                if issue.score >= floor {
                    checks_passed += 1;
                } else {
                    checks_failed += 1;
                }
            }
            issues.push(issue.clone());
        }
    }

    AssessmentResult {
        id: Uuid::new_v4(),
        source_id: source_id.into(),
        table_id: table_id.into(),
        timestamp,
        dimensions,
        drift_score,
        overall_score,
        anomalies,
        checks_passed,
        checks_failed,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dimension, DimensionResult, Issue, Severity};

    fn scored(score: f64) -> DimensionResult {
        DimensionResult {
            score: Some(score),
            issues: vec![],
        }
    }

    #[test]
    fn test_overall_excludes_inapplicable_dimensions() {
        let dimensions = DimensionSet {
            completeness: scored(90.0),
            uniqueness: scored(70.0),
            ..DimensionSet::default()
        };
        let result = aggregate(
            "timing",
            "results",
            Utc::now(),
            dimensions,
            vec![],
            None,
            &AlertThresholds::default(),
        );
        assert_eq!(result.overall_score, 80.0);
    }

    #[test]
    fn test_no_applicable_dimensions_is_vacuous_pass() {
        let result = aggregate(
            "timing",
            "results",
            Utc::now(),
            DimensionSet::default(),
            vec![],
            None,
            &AlertThresholds::default(),
        );
        assert_eq!(result.overall_score, 100.0);
        assert_eq!(result.checks_passed, 0);
        assert_eq!(result.checks_failed, 0);
    }

    #[test]
    fn test_check_counting_against_dimension_floor() {
        let dimensions = DimensionSet {
            completeness: DimensionResult {
                score: Some(96.0),
                issues: vec![
                    Issue::check(Dimension::Completeness, Severity::Medium, "a", 96.0, "ok-ish"),
                    Issue::check(Dimension::Completeness, Severity::High, "b", 60.0, "bad"),
                ],
            },
            validity: DimensionResult {
                score: Some(50.0),
                issues: vec![Issue::error(Dimension::Validity, "r", "validator failed")],
            },
            ..DimensionSet::default()
        };
        let result = aggregate(
            "timing",
            "results",
            Utc::now(),
            dimensions,
            vec![],
            None,
            &AlertThresholds::default(),
        );
        assert_eq!(result.checks_passed, 1);
        assert_eq!(result.checks_failed, 1);
        assert_eq!(result.issues.len(), 3);
    }

    #[test]
    fn test_anomaly_count_exposed() {
        use crate::models::{Anomaly, AnomalyMethod};
        let anomalies = vec![Anomaly {
            column: "v".to_string(),
            method: AnomalyMethod::Iqr,
            count: 3,
            percentage_of_rows: 1.5,
        }];
        let result = aggregate(
            "timing",
            "results",
            Utc::now(),
            DimensionSet::default(),
            anomalies,
            Some(0.2),
            &AlertThresholds::default(),
        );
        assert_eq!(result.anomalies_detected(), 1);
        assert_eq!(result.drift_score, Some(0.2));
    }
}
