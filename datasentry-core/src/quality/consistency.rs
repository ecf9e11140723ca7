//! Consistency evaluation: cross-column comparisons and value formats.

use crate::models::{Dimension, DimensionResult, Issue, Sample, Severity};
use crate::rules::{ColumnFormat, RuleSet};

use super::parse_timestamp;

const SUB_CHECK_FLOOR: f64 = 95.0;

/// Evaluates cross-column consistency rules and format rules.
///
/// A cross-column rule scores `100 * satisfyingRows / rows`; rows where
/// either side is missing or untypable fail the comparison. A date format
/// rule scores the parse rate of the column's present values, with a
/// critical issue when nothing parses at all.
pub fn evaluate_consistency(sample: &Sample, rules: &RuleSet) -> DimensionResult {
    if rules.consistency_rules.is_empty() && rules.format_rules.is_empty() {
        return DimensionResult::not_applicable();
    }

    let rows = sample.row_count();
    let mut scores: Vec<f64> = Vec::new();
    let mut issues: Vec<Issue> = Vec::new();

    for rule in &rules.consistency_rules {
        if !sample.has_column(&rule.column1) || !sample.has_column(&rule.column2) {
            scores.push(0.0);
            issues.push(Issue::check(
                Dimension::Consistency,
                Severity::Medium,
                &rule.name,
                0.0,
                format!(
                    "consistency rule '{}' references a column missing from the sample",
                    rule.name
                ),
            ));
            continue;
        }

        let satisfying = sample
            .rows
            .iter()
            .filter(|row| {
                row.as_object().is_some_and(|obj| {
                    match (obj.get(&rule.column1), obj.get(&rule.column2)) {
                        (Some(left), Some(right)) => rule.op.evaluate(left, right),
                        _ => false,
                    }
                })
            })
            .count();
        let score = if rows == 0 {
            0.0
        } else {
            100.0 * satisfying as f64 / rows as f64
        };
        scores.push(score);
        if score < SUB_CHECK_FLOOR {
            issues.push(Issue::check(
                Dimension::Consistency,
                Severity::Medium,
                &rule.name,
                score,
                format!(
                    "consistency rule '{}' fails for {:.1}% of rows",
                    rule.name,
                    100.0 - score
                ),
            ));
        }
    }

    for (column, format) in &rules.format_rules {
        match format {
            ColumnFormat::Date => {
                if !sample.has_column(column) {
                    scores.push(0.0);
                    issues.push(Issue::check(
                        Dimension::Consistency,
                        Severity::Medium,
                        column,
                        0.0,
                        format!("date column '{}' is missing from the sample", column),
                    ));
                    continue;
                }

                let present: Vec<_> = sample
                    .column_values(column)
                    .filter(|v| !v.is_null())
                    .collect();
                let parsed = present
                    .iter()
                    .filter(|v| parse_timestamp(v).is_some())
                    .count();

                if present.is_empty() || parsed == 0 {
                    scores.push(0.0);
                    issues.push(Issue::check(
                        Dimension::Consistency,
                        Severity::Critical,
                        column,
                        0.0,
                        format!("no value in column '{}' parses as a date", column),
                    ));
                    continue;
                }

                let score = 100.0 * parsed as f64 / present.len() as f64;
                scores.push(score);
                if score < SUB_CHECK_FLOOR {
                    issues.push(Issue::check(
                        Dimension::Consistency,
                        Severity::Medium,
                        column,
                        score,
                        format!(
                            "{:.1}% of values in column '{}' are not valid dates",
                            100.0 - score,
                            column
                        ),
                    ));
                }
            }
        }
    }

    DimensionResult::from_scores(&scores, issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CompareOp, CrossColumnRule};
    use serde_json::json;

    fn sample(rows: Vec<serde_json::Value>) -> Sample {
        Sample::new("timing", "results", rows)
    }

    fn cross_rule(name: &str, c1: &str, op: CompareOp, c2: &str) -> RuleSet {
        RuleSet {
            consistency_rules: vec![CrossColumnRule {
                name: name.to_string(),
                column1: c1.to_string(),
                op,
                column2: c2.to_string(),
            }],
            ..RuleSet::default()
        }
    }

    #[test]
    fn test_no_rules_is_not_applicable() {
        let result = evaluate_consistency(&sample(vec![json!({"a": 1})]), &RuleSet::default());
        assert!(result.score.is_none());
    }

    #[test]
    fn test_greater_than_rule_satisfied() {
        let rules = cross_rule("finish_after_start", "finish", CompareOp::GreaterThan, "start");
        let s = sample(vec![
            json!({"start": 10, "finish": 20}),
            json!({"start": 5, "finish": 30}),
        ]);
        let result = evaluate_consistency(&s, &rules);
        assert_eq!(result.score, Some(100.0));
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_violating_rows_lower_the_score() {
        let rules = cross_rule("finish_after_start", "finish", CompareOp::GreaterThan, "start");
        let s = sample(vec![
            json!({"start": 10, "finish": 20}),
            json!({"start": 30, "finish": 20}),
            json!({"start": 5, "finish": 30}),
            json!({"start": 40, "finish": 30}),
        ]);
        let result = evaluate_consistency(&s, &rules);
        assert_eq!(result.score, Some(50.0));
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].subject, "finish_after_start");
    }

    #[test]
    fn test_row_missing_one_side_fails() {
        let rules = cross_rule("r", "a", CompareOp::Equal, "b");
        let s = sample(vec![json!({"a": 1, "b": 1}), json!({"a": 1})]);
        let result = evaluate_consistency(&s, &rules);
        assert_eq!(result.score, Some(50.0));
    }

    #[test]
    fn test_missing_column_scores_zero() {
        let rules = cross_rule("r", "a", CompareOp::LessThan, "gone");
        let result = evaluate_consistency(&sample(vec![json!({"a": 1})]), &rules);
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn test_date_format_parse_rate() {
        let mut rules = RuleSet::default();
        rules
            .format_rules
            .insert("race_date".to_string(), ColumnFormat::Date);
        let s = sample(vec![
            json!({"race_date": "2026-07-04"}),
            json!({"race_date": "2026-07-05 14:00:00"}),
            json!({"race_date": "2026-07-06T10:00:00Z"}),
            json!({"race_date": "sometime in July"}),
        ]);
        let result = evaluate_consistency(&s, &rules);
        assert_eq!(result.score, Some(75.0));
        assert_eq!(result.issues[0].severity, Severity::Medium);
    }

    #[test]
    fn test_date_format_nothing_parses_is_critical() {
        let mut rules = RuleSet::default();
        rules
            .format_rules
            .insert("race_date".to_string(), ColumnFormat::Date);
        let s = sample(vec![json!({"race_date": "nope"}), json!({"race_date": 42})]);
        let result = evaluate_consistency(&s, &rules);
        assert_eq!(result.score, Some(0.0));
        assert_eq!(result.issues[0].severity, Severity::Critical);
    }
}
