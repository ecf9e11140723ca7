//! Accuracy evaluation: per-column validation rules.
//!
//! Supports range membership, regex pattern, and enum membership checks.
//! Each configured check scores `100 * matchingRows / rows` independently;
//! rows with a missing, null, or untypable value fail the check.

use regex::Regex;

use crate::models::{Dimension, DimensionResult, Issue, Sample, Severity, extract_numeric};
use crate::rules::RuleSet;

const SUB_CHECK_FLOOR: f64 = 95.0;

/// Evaluates every configured validation rule against the sample.
///
/// A rule whose column is absent contributes a 0 sub-score and a medium
/// issue; a pattern that fails to compile becomes a critical error-kind
/// issue for that rule alone.
pub fn evaluate_accuracy(sample: &Sample, rules: &RuleSet) -> DimensionResult {
    if rules.validation_rules.is_empty() {
        return DimensionResult::not_applicable();
    }

    let rows = sample.row_count();
    let mut scores: Vec<f64> = Vec::new();
    let mut issues: Vec<Issue> = Vec::new();

    for (column, validation) in &rules.validation_rules {
        if !sample.has_column(column) {
            scores.push(0.0);
            issues.push(Issue::check(
                Dimension::Accuracy,
                Severity::Medium,
                column,
                0.0,
                format!("validated column '{}' is missing from the sample", column),
            ));
            continue;
        }

        if validation.min_value.is_some() || validation.max_value.is_some() {
            let min = validation.min_value.unwrap_or(f64::NEG_INFINITY);
            let max = validation.max_value.unwrap_or(f64::INFINITY);
            let score = check_score(sample, column, rows, |v| {
                extract_numeric(v).is_some_and(|n| n >= min && n <= max)
            });
            push_check(&mut scores, &mut issues, column, "range", score);
        }

        if let Some(pattern) = &validation.pattern {
            match Regex::new(pattern) {
                Ok(regex) => {
                    let score = check_score(sample, column, rows, |v| match v {
                        serde_json::Value::String(s) => regex.is_match(s),
                        serde_json::Value::Null => false,
                        other => regex.is_match(&other.to_string()),
                    });
                    push_check(&mut scores, &mut issues, column, "pattern", score);
                }
                Err(e) => {
                    scores.push(0.0);
                    issues.push(Issue::error(
                        Dimension::Accuracy,
                        column,
                        format!("pattern for column '{}' failed to compile: {}", column, e),
                    ));
                }
            }
        }

        if let Some(allowed) = &validation.allowed_values {
            let score = check_score(sample, column, rows, |v| {
                !v.is_null() && allowed.contains(v)
            });
            push_check(&mut scores, &mut issues, column, "allowed values", score);
        }
    }

    DimensionResult::from_scores(&scores, issues)
}

fn check_score<F>(sample: &Sample, column: &str, rows: usize, predicate: F) -> f64
where
    F: Fn(&serde_json::Value) -> bool,
{
    if rows == 0 {
        return 0.0;
    }
    let matching = sample.column_values(column).filter(|v| predicate(v)).count();
    100.0 * matching as f64 / rows as f64
}

fn push_check(
    scores: &mut Vec<f64>,
    issues: &mut Vec<Issue>,
    column: &str,
    check_name: &str,
    score: f64,
) {
    scores.push(score);
    if score < SUB_CHECK_FLOOR {
        issues.push(Issue::check(
            Dimension::Accuracy,
            Severity::Medium,
            column,
            score,
            format!(
                "column '{}' fails the {} check for {:.1}% of rows",
                column,
                check_name,
                100.0 - score
            ),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueKind;
    use crate::rules::ColumnValidation;
    use serde_json::json;

    fn sample(rows: Vec<serde_json::Value>) -> Sample {
        Sample::new("timing", "results", rows)
    }

    fn rules_for(column: &str, validation: ColumnValidation) -> RuleSet {
        let mut rules = RuleSet::default();
        rules.validation_rules.insert(column.to_string(), validation);
        rules
    }

    #[test]
    fn test_no_rules_is_not_applicable() {
        let result = evaluate_accuracy(&sample(vec![json!({"a": 1})]), &RuleSet::default());
        assert!(result.score.is_none());
    }

    #[test]
    fn test_range_check_all_within() {
        let rules = rules_for(
            "speed_kmh",
            ColumnValidation {
                min_value: Some(0.0),
                max_value: Some(120.0),
                ..ColumnValidation::default()
            },
        );
        let s = sample(vec![
            json!({"speed_kmh": 42.5}),
            json!({"speed_kmh": 0}),
            json!({"speed_kmh": 120}),
        ]);
        let result = evaluate_accuracy(&s, &rules);
        assert_eq!(result.score, Some(100.0));
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_range_check_exact_ratio() {
        let rules = rules_for(
            "speed_kmh",
            ColumnValidation {
                min_value: Some(0.0),
                max_value: Some(120.0),
                ..ColumnValidation::default()
            },
        );
        let s = sample(vec![
            json!({"speed_kmh": 50}),
            json!({"speed_kmh": 200}),
            json!({"speed_kmh": 60}),
            json!({"speed_kmh": 70}),
        ]);
        let result = evaluate_accuracy(&s, &rules);
        assert_eq!(result.score, Some(75.0));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn test_null_fails_range_check() {
        let rules = rules_for(
            "v",
            ColumnValidation {
                min_value: Some(0.0),
                ..ColumnValidation::default()
            },
        );
        let s = sample(vec![json!({"v": 1}), json!({"v": null})]);
        let result = evaluate_accuracy(&s, &rules);
        assert_eq!(result.score, Some(50.0));
    }

    #[test]
    fn test_pattern_check() {
        let rules = rules_for(
            "email",
            ColumnValidation {
                pattern: Some("^[^@]+@[^@]+$".to_string()),
                ..ColumnValidation::default()
            },
        );
        let s = sample(vec![
            json!({"email": "a@b.com"}),
            json!({"email": "nope"}),
        ]);
        let result = evaluate_accuracy(&s, &rules);
        assert_eq!(result.score, Some(50.0));
    }

    #[test]
    fn test_enum_check() {
        let rules = rules_for(
            "status",
            ColumnValidation {
                allowed_values: Some(vec![json!("finished"), json!("dnf")]),
                ..ColumnValidation::default()
            },
        );
        let s = sample(vec![
            json!({"status": "finished"}),
            json!({"status": "dnf"}),
            json!({"status": "abducted"}),
            json!({"status": "finished"}),
        ]);
        let result = evaluate_accuracy(&s, &rules);
        assert_eq!(result.score, Some(75.0));
    }

    #[test]
    fn test_missing_column_scores_zero_with_issue() {
        let rules = rules_for(
            "gone",
            ColumnValidation {
                min_value: Some(0.0),
                ..ColumnValidation::default()
            },
        );
        let result = evaluate_accuracy(&sample(vec![json!({"a": 1})]), &rules);
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.issues[0].severity, Severity::Medium);
        assert_eq!(result.issues[0].kind, IssueKind::Check);
    }

    #[test]
    fn test_invalid_pattern_is_error_issue() {
        let mut rules = RuleSet::default();
        // Bypasses load-time validation to exercise the evaluation-time guard.
        rules.validation_rules.insert(
            "v".to_string(),
            ColumnValidation {
                pattern: Some("([unclosed".to_string()),
                ..ColumnValidation::default()
            },
        );
        let result = evaluate_accuracy(&sample(vec![json!({"v": "x"})]), &rules);
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.issues[0].kind, IssueKind::Error);
        assert_eq!(result.issues[0].severity, Severity::Critical);
    }

    #[test]
    fn test_multiple_checks_average() {
        let rules = rules_for(
            "v",
            ColumnValidation {
                min_value: Some(0.0),
                max_value: Some(10.0),
                allowed_values: Some(vec![json!(1), json!(2)]),
                ..ColumnValidation::default()
            },
        );
        let s = sample(vec![json!({"v": 1}), json!({"v": 7})]);
        // Range passes both rows (100), enum passes one of two (50).
        let result = evaluate_accuracy(&s, &rules);
        assert_eq!(result.score, Some(75.0));
    }
}
