use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::employee::Employee;

const SUMMARY_MAX_CHARS: usize = 255;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Timesheet {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2024-01-01T09:00:00", value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(example = "2024-01-01T17:00:00", value_type = String, format = "date-time")]
    pub end_time: NaiveDateTime,
    #[schema(example = "Sprint planning", nullable = true)]
    pub summary: Option<String>,
}

/// A timesheet with its owning employee embedded.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    #[serde(flatten)]
    pub timesheet: Timesheet,
    pub employee: Option<Employee>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTimesheet {
    pub employee_id: u64,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub summary: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetInput {
    /// Only checked on replace, where it must match the path id
    #[schema(example = 1, nullable = true)]
    pub id: Option<u64>,
    #[schema(example = 1)]
    pub employee_id: Option<u64>,
    #[schema(example = "2024-01-01T09:00:00", value_type = Option<String>, format = "date-time")]
    pub start_time: Option<NaiveDateTime>,
    #[schema(example = "2024-01-01T17:00:00", value_type = Option<String>, format = "date-time")]
    pub end_time: Option<NaiveDateTime>,
    #[schema(example = "Sprint planning", nullable = true)]
    pub summary: Option<String>,
}

impl TimesheetInput {
    pub fn validate(self) -> AppResult<NewTimesheet> {
        let employee_id = self
            .employee_id
            .ok_or_else(|| AppError::validation("employeeId is required"))?;
        let start_time = self
            .start_time
            .ok_or_else(|| AppError::validation("startTime is required"))?;
        let end_time = self
            .end_time
            .ok_or_else(|| AppError::validation("endTime is required"))?;

        if end_time < start_time {
            return Err(AppError::validation("endTime cannot be before startTime"));
        }

        let summary = self
            .summary
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if summary
            .as_deref()
            .is_some_and(|s| s.chars().count() > SUMMARY_MAX_CHARS)
        {
            return Err(AppError::validation(format!(
                "summary cannot exceed {SUMMARY_MAX_CHARS} characters"
            )));
        }

        Ok(NewTimesheet {
            employee_id,
            start_time,
            end_time,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(body: serde_json::Value) -> TimesheetInput {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn valid_input_keeps_trimmed_summary() {
        let ts = input(json!({
            "employeeId": 1,
            "startTime": "2024-01-01T09:00:00",
            "endTime": "2024-01-01T17:00:00",
            "summary": "  standup  "
        }))
        .validate()
        .unwrap();
        assert_eq!(ts.summary.as_deref(), Some("standup"));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let result = input(json!({
            "employeeId": 1,
            "startTime": "2024-01-01T17:00:00",
            "endTime": "2024-01-01T09:00:00"
        }))
        .validate();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn oversized_summary_is_rejected() {
        let result = input(json!({
            "employeeId": 1,
            "startTime": "2024-01-01T09:00:00",
            "endTime": "2024-01-01T10:00:00",
            "summary": "x".repeat(256)
        }))
        .validate();
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn missing_employee_is_rejected() {
        let result = input(json!({
            "startTime": "2024-01-01T09:00:00",
            "endTime": "2024-01-01T10:00:00"
        }))
        .validate();
        match result {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "employeeId is required"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
