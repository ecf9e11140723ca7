//! Completeness evaluation: required columns are present and populated.
//!
//! Each required column scores `100 * nonNull / rows`. A column absent from
//! the sample scores 0 with a critical issue. Critical columns additionally
//! raise a critical issue when any null appears, independent of scoring.

use crate::models::{Dimension, DimensionResult, Issue, Sample, Severity};
use crate::rules::RuleSet;

/// Evaluates completeness for every required and critical column.
///
/// `floor` is the per-dimension score floor (default 95); a populated column
/// below it raises a medium issue, or a high issue below 80. When no required
/// columns are configured, critical column ratios carry the dimension score
/// so a configured dimension never passes vacuously.
pub fn evaluate_completeness(sample: &Sample, rules: &RuleSet, floor: f64) -> DimensionResult {
    if rules.required_columns.is_empty() && rules.critical_columns.is_empty() {
        return DimensionResult::not_applicable();
    }

    let rows = sample.row_count();
    let mut scores: Vec<f64> = Vec::new();
    let mut issues: Vec<Issue> = Vec::new();

    for column in &rules.required_columns {
        if !sample.has_column(column) {
            scores.push(0.0);
            issues.push(Issue::check(
                Dimension::Completeness,
                Severity::Critical,
                column,
                0.0,
                format!("required column '{}' is missing from the sample", column),
            ));
            continue;
        }

        let ratio = non_null_ratio(sample, column, rows);
        scores.push(ratio);
        if ratio < floor {
            let severity = if ratio < 80.0 {
                Severity::High
            } else {
                Severity::Medium
            };
            issues.push(Issue::check(
                Dimension::Completeness,
                severity,
                column,
                ratio,
                format!("column '{}' is {:.1}% complete", column, ratio),
            ));
        }
    }

    for column in &rules.critical_columns {
        // A critical column absent from the sample is a schema problem the
        // required-column check reports; null scanning only applies to
        // columns that exist.
        if !sample.has_column(column) {
            continue;
        }

        let ratio = non_null_ratio(sample, column, rows);
        let null_count = rows as u64 - count_non_null(sample, column);
        if null_count > 0 {
            issues.push(Issue::check(
                Dimension::Completeness,
                Severity::Critical,
                column,
                ratio,
                format!(
                    "critical column '{}' has {} null value(s)",
                    column, null_count
                ),
            ));
        }
        if rules.required_columns.is_empty() {
            scores.push(ratio);
        }
    }

    DimensionResult::from_scores(&scores, issues)
}

fn count_non_null(sample: &Sample, column: &str) -> u64 {
    sample
        .column_values(column)
        .filter(|v| !v.is_null())
        .count() as u64
}

fn non_null_ratio(sample: &Sample, column: &str, rows: usize) -> f64 {
    if rows == 0 {
        return 0.0;
    }
    100.0 * count_non_null(sample, column) as f64 / rows as f64
}
