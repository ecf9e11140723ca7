//! Timeliness evaluation: data freshness and ingestion gaps.
//!
//! The reference instant is injected rather than read from the clock, so
//! evaluation of the same sample at the same instant is reproducible.

use chrono::{DateTime, Utc};

use crate::models::{Dimension, DimensionResult, Issue, Sample, Severity};
use crate::rules::RuleSet;

use super::parse_timestamp;

/// Evaluates freshness and gap sub-scores against the configured windows.
///
/// Freshness is `max(0, 100 - (ageHours / expectedFreshnessHours) * 100)`
/// where age is measured from the newest parseable timestamp to `now`.
/// Gaps between consecutive sorted timestamps wider than twice the expected
/// interval are flagged; the gap sub-score is `100 * (1 - flagged / rows)`.
pub fn evaluate_timeliness(
    sample: &Sample,
    rules: &RuleSet,
    now: DateTime<Utc>,
) -> DimensionResult {
    let Some(timeliness) = &rules.timeliness else {
        return DimensionResult::not_applicable();
    };
    let column = &timeliness.timestamp_column;

    if !sample.has_column(column) {
        return DimensionResult::from_scores(
            &[0.0],
            vec![Issue::check(
                Dimension::Timeliness,
                Severity::Critical,
                column,
                0.0,
                format!("timestamp column '{}' is missing from the sample", column),
            )],
        );
    }

    let present: Vec<_> = sample
        .column_values(column)
        .filter(|v| !v.is_null())
        .collect();
    let mut timestamps: Vec<DateTime<Utc>> =
        present.iter().filter_map(|v| parse_timestamp(v)).collect();

    if timestamps.is_empty() {
        return DimensionResult::from_scores(
            &[0.0],
            vec![Issue::check(
                Dimension::Timeliness,
                Severity::Critical,
                column,
                0.0,
                format!("no value in column '{}' parses as a timestamp", column),
            )],
        );
    }

    let rows = sample.row_count();
    let mut scores: Vec<f64> = Vec::new();
    let mut issues: Vec<Issue> = Vec::new();

    let unparsable = present.len() - timestamps.len();
    if unparsable > 0 {
        scores.push(0.0);
        issues.push(Issue::check(
            Dimension::Timeliness,
            Severity::Critical,
            column,
            0.0,
            format!(
                "{} value(s) in column '{}' do not parse as timestamps",
                unparsable, column
            ),
        ));
    }

    timestamps.sort_unstable();
    // Sorted ascending, so the last element is the newest observation.
    let newest = timestamps[timestamps.len() - 1];
    let age_hours = (now - newest).num_seconds() as f64 / 3600.0;
    let expected = timeliness.expected_freshness_hours;
    let freshness = (100.0 - (age_hours / expected) * 100.0).max(0.0);
    scores.push(freshness);
    if age_hours > 2.0 * expected {
        issues.push(Issue::check(
            Dimension::Timeliness,
            Severity::High,
            column,
            freshness,
            format!(
                "data is {:.1}h old, more than twice the expected {:.1}h",
                age_hours, expected
            ),
        ));
    } else if age_hours > expected {
        issues.push(Issue::check(
            Dimension::Timeliness,
            Severity::Medium,
            column,
            freshness,
            format!(
                "data is {:.1}h old, older than the expected {:.1}h",
                age_hours, expected
            ),
        ));
    }

    let max_gap_hours = 2.0 * timeliness.expected_interval_hours;
    let flagged = timestamps
        .windows(2)
        .filter(|pair| (pair[1] - pair[0]).num_seconds() as f64 / 3600.0 > max_gap_hours)
        .count();
    let gap_score = if rows == 0 {
        100.0
    } else {
        100.0 * (1.0 - flagged as f64 / rows as f64)
    };
    scores.push(gap_score);
    if flagged > 0 {
        issues.push(Issue::check(
            Dimension::Timeliness,
            Severity::Medium,
            column,
            gap_score,
            format!(
                "{} ingestion gap(s) wider than {:.1}h detected",
                flagged, max_gap_hours
            ),
        ));
    }

    DimensionResult::from_scores(&scores, issues)
}
