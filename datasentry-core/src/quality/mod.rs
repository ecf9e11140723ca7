//! Dimension evaluators for rule-driven quality assessment.
//!
//! Each evaluator is a pure function from an immutable [`Sample`] and a
//! [`RuleSet`] to a [`DimensionResult`]. Evaluators never panic and never
//! propagate errors: an internal failure becomes a critical error-kind issue
//! with a 0 sub-score, leaving sibling dimensions untouched.
//!
//! A dimension with no applicable rules reports no score at all and is
//! excluded from aggregation rather than defaulted.

pub mod accuracy;
pub mod completeness;
pub mod consistency;
pub mod timeliness;
pub mod uniqueness;
pub mod validity;

pub use accuracy::evaluate_accuracy;
pub use completeness::evaluate_completeness;
pub use consistency::evaluate_consistency;
pub use timeliness::evaluate_timeliness;
pub use uniqueness::evaluate_uniqueness;
pub use validity::{Validator, ValidatorRegistry, evaluate_validity};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parses a timestamp value from a sampled row.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, and bare `YYYY-MM-DD` (midnight
/// UTC). Naive timestamps are interpreted as UTC.
pub(crate) fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp(&json!("2026-07-04T12:30:00Z")).is_some());
        assert!(parse_timestamp(&json!("2026-07-04T12:30:00+02:00")).is_some());
        assert!(parse_timestamp(&json!("2026-07-04 12:30:00")).is_some());
        assert!(parse_timestamp(&json!("2026-07-04")).is_some());
        assert!(parse_timestamp(&json!("not a date")).is_none());
        assert!(parse_timestamp(&json!(1234567890)).is_none());
        assert!(parse_timestamp(&json!(null)).is_none());
    }

    #[test]
    fn test_parse_timestamp_date_is_midnight_utc() {
        let parsed = parse_timestamp(&json!("2026-07-04")).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-07-04T00:00:00+00:00");
    }
}
