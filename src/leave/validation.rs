use chrono::NaiveDate;
use serde::Deserialize;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

use crate::error::{FieldError, LeaveError};
use crate::leave::dates::{RawDate, inclusive_span, to_calendar_date};
use crate::model::leave_request::LeaveCategory;

/// Leave request form as sent by a teacher.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LeaveSubmission {
    /// one of annual, sick, maternity, paternity, exceptional, unpaid
    #[schema(example = "annual")]
    #[serde(default)]
    pub category: String,
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub start_date: Option<RawDate>,
    #[schema(example = "2026-01-07", format = "date", value_type = Option<String>)]
    pub end_date: Option<RawDate>,
    #[schema(example = "Family event")]
    #[serde(default)]
    pub reason: String,
}

/// A submission that passed every precondition.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub category: LeaveCategory,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub days_requested: u32,
}

/// Checks a submission and reports every offending field at once.
pub fn validate_submission(
    submission: &LeaveSubmission,
    max_span_days: u32,
) -> Result<ValidSubmission, LeaveError> {
    let mut errors = Vec::new();

    let category = match submission.category.trim() {
        "" => {
            errors.push(FieldError::new("category", "leave category is required"));
            None
        }
        value => match value.to_lowercase().parse::<LeaveCategory>() {
            Ok(category) => Some(category),
            Err(_) => {
                let allowed: Vec<String> = LeaveCategory::iter().map(|c| c.to_string()).collect();
                errors.push(FieldError::new(
                    "category",
                    format!("leave category must be one of {}", allowed.join(", ")),
                ));
                None
            }
        },
    };

    let start_date = read_date(&submission.start_date, "start_date", "start date", &mut errors);
    let end_date = read_date(&submission.end_date, "end_date", "end date", &mut errors);

    if submission.reason.trim().is_empty() {
        errors.push(FieldError::new("reason", "reason is required"));
    }

    let mut days_requested = 0;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        let span = inclusive_span(start, end);
        if end < start {
            errors.push(FieldError::new(
                "end_date",
                "end date must not be before start date",
            ));
        } else if span > i64::from(max_span_days) {
            errors.push(FieldError::new(
                "end_date",
                format!("leave cannot exceed {max_span_days} days (requested {span})"),
            ));
        } else {
            days_requested = u32::try_from(span).unwrap_or(u32::MAX);
        }
    }

    match (category, start_date, end_date) {
        (Some(category), Some(start_date), Some(end_date)) if errors.is_empty() => {
            Ok(ValidSubmission {
                category,
                start_date,
                end_date,
                reason: submission.reason.clone(),
                days_requested,
            })
        }
        _ => Err(LeaveError::Validation(errors)),
    }
}

fn read_date(
    raw: &Option<RawDate>,
    field: &str,
    label: &str,
    errors: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
    match raw {
        None => {
            errors.push(FieldError::new(field, format!("{label} is required")));
            None
        }
        Some(raw) => {
            let date = to_calendar_date(raw);
            if date.is_none() {
                errors.push(FieldError::new(field, format!("{label} is not a valid date")));
            }
            date
        }
    }
}

/// A rejection needs a reason the teacher can read.
pub fn validate_rejection_reason(reason: &str) -> Result<(), LeaveError> {
    if reason.trim().is_empty() {
        return Err(LeaveError::invalid(
            "reason",
            "a rejection reason is required",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(category: &str, start: &str, end: &str, reason: &str) -> LeaveSubmission {
        LeaveSubmission {
            category: category.to_string(),
            start_date: Some(RawDate::Date(start.parse().unwrap())),
            end_date: Some(RawDate::Date(end.parse().unwrap())),
            reason: reason.to_string(),
        }
    }

    fn fields(err: LeaveError) -> Vec<String> {
        err.field_errors().iter().map(|f| f.field.clone()).collect()
    }

    #[test]
    fn accepts_a_three_day_request() {
        let valid = validate_submission(
            &submission("annual", "2025-03-10", "2025-03-12", "Family event"),
            30,
        )
        .unwrap();

        assert_eq!(valid.category, LeaveCategory::Annual);
        assert_eq!(valid.days_requested, 3);
        assert_eq!(valid.reason, "Family event");
    }

    #[test]
    fn category_is_case_insensitive() {
        let valid =
            validate_submission(&submission("Sick", "2025-03-10", "2025-03-10", "flu"), 30).unwrap();
        assert_eq!(valid.category, LeaveCategory::Sick);
    }

    #[test]
    fn rejects_end_before_start() {
        let err = validate_submission(&submission("annual", "2025-03-12", "2025-03-10", "x"), 30)
            .unwrap_err();
        assert_eq!(fields(err), vec!["end_date"]);
    }

    #[test]
    fn rejects_span_over_the_limit() {
        let err = validate_submission(&submission("annual", "2025-01-01", "2025-02-05", "x"), 30)
            .unwrap_err();
        let messages = err.field_errors().to_vec();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].field, "end_date");
        assert!(messages[0].message.contains("36"));
    }

    #[test]
    fn thirty_days_is_still_allowed() {
        let valid = validate_submission(&submission("unpaid", "2025-01-01", "2025-01-30", "x"), 30)
            .unwrap();
        assert_eq!(valid.days_requested, 30);
    }

    #[test]
    fn reports_every_missing_field() {
        let err = validate_submission(&LeaveSubmission::default(), 30).unwrap_err();
        assert_eq!(
            fields(err),
            vec!["category", "start_date", "end_date", "reason"]
        );
    }

    #[test]
    fn rejects_unknown_category_and_blank_reason() {
        let err = validate_submission(&submission("holiday", "2025-03-10", "2025-03-11", "  "), 30)
            .unwrap_err();
        assert_eq!(fields(err), vec!["category", "reason"]);
    }

    #[test]
    fn rejection_needs_a_reason() {
        assert!(validate_rejection_reason("   ").is_err());
        assert!(validate_rejection_reason("Exam week").is_ok());
    }

    #[test]
    fn impossible_dates_are_reported_with_the_other_fields() {
        let payload = serde_json::json!({
            "category": "annual",
            "start_date": "2025-02-30",
            "end_date": "2025-03-02",
            "reason": ""
        });
        let submission: LeaveSubmission = serde_json::from_value(payload).unwrap();

        let err = validate_submission(&submission, 30).unwrap_err();
        assert_eq!(fields(err), vec!["start_date", "reason"]);
    }
}
