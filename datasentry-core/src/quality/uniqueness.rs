//! Uniqueness evaluation: primary key and unique column duplicates.

use std::collections::HashSet;

use crate::models::{Dimension, DimensionResult, Issue, Sample, Severity};
use crate::rules::RuleSet;

/// Evaluates primary key sets and unique columns.
///
/// A primary key set scores `100 * distinctKeyTuples / rows`; duplicates
/// raise a high issue below 95, otherwise medium. A unique column scores
/// `100 * distinctNonNull / nonNull` with a medium issue on any duplicate.
pub fn evaluate_uniqueness(sample: &Sample, rules: &RuleSet) -> DimensionResult {
    if rules.uniqueness.is_empty() {
        return DimensionResult::not_applicable();
    }

    let rows = sample.row_count();
    let mut scores: Vec<f64> = Vec::new();
    let mut issues: Vec<Issue> = Vec::new();

    for key_columns in &rules.uniqueness.primary_keys {
        let subject = key_columns.join(", ");
        if key_columns.iter().any(|c| !sample.has_column(c)) {
            scores.push(0.0);
            issues.push(Issue::check(
                Dimension::Uniqueness,
                Severity::Medium,
                &subject,
                0.0,
                format!(
                    "primary key ({}) references a column missing from the sample",
                    subject
                ),
            ));
            continue;
        }

        let mut distinct: HashSet<String> = HashSet::with_capacity(rows);
        for row in &sample.rows {
            let key: Vec<String> = key_columns
                .iter()
                .map(|c| {
                    row.as_object()
                        .and_then(|obj| obj.get(c))
                        .map_or_else(|| "null".to_string(), serde_json::Value::to_string)
                })
                .collect();
            distinct.insert(key.join("\u{1f}"));
        }

        let score = if rows == 0 {
            100.0
        } else {
            100.0 * distinct.len() as f64 / rows as f64
        };
        scores.push(score);
        if distinct.len() < rows {
            let severity = if score < 95.0 {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(Issue::check(
                Dimension::Uniqueness,
                severity,
                &subject,
                score,
                format!(
                    "primary key ({}) has {} duplicate row(s)",
                    subject,
                    rows - distinct.len()
                ),
            ));
        }
    }

    for column in &rules.uniqueness.unique_columns {
        if !sample.has_column(column) {
            scores.push(0.0);
            issues.push(Issue::check(
                Dimension::Uniqueness,
                Severity::Medium,
                column,
                0.0,
                format!("unique column '{}' is missing from the sample", column),
            ));
            continue;
        }

        let non_null: Vec<String> = sample
            .column_values(column)
            .filter(|v| !v.is_null())
            .map(serde_json::Value::to_string)
            .collect();
        if non_null.is_empty() {
            continue;
        }
        let distinct: HashSet<&String> = non_null.iter().collect();
        let score = 100.0 * distinct.len() as f64 / non_null.len() as f64;
        scores.push(score);
        if distinct.len() < non_null.len() {
            issues.push(Issue::check(
                Dimension::Uniqueness,
                Severity::Medium,
                column,
                score,
                format!(
                    "column '{}' has {} duplicate value(s)",
                    column,
                    non_null.len() - distinct.len()
                ),
            ));
        }
    }

    DimensionResult::from_scores(&scores, issues)
}
