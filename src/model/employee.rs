use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": 1,
        "name": "Ana",
        "email": "ana@x.com",
        "phone": "555",
        "jobTitle": "Eng",
        "department": "R&D",
        "salary": 1000.0,
        "startDate": "2024-01-01",
        "endDate": null
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Ana")]
    pub name: String,

    #[schema(example = "ana@x.com")]
    pub email: String,

    #[schema(example = "555")]
    pub phone: String,

    #[schema(example = "Eng")]
    pub job_title: String,

    #[schema(example = "R&D")]
    pub department: String,

    #[serde(with = "rust_decimal::serde::float")]
    #[schema(example = 1000.0, value_type = f64)]
    pub salary: Decimal,

    #[schema(example = "2024-01-01", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(value_type = Option<String>, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

/// An employee together with the path of their current profile picture.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    #[serde(flatten)]
    pub employee: Employee,

    #[schema(example = "uploads/photos/9b2f..._ana.png", nullable = true)]
    pub profile_picture: Option<String>,
}

/// Validated field set for inserting or fully replacing an employee.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub job_title: String,
    pub department: String,
    pub salary: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

/// Create/replace payload. Every field is optional at the wire level so that a
/// missing field is reported with its own name instead of a serde message.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    /// Only checked on replace, where it must match the path id
    #[schema(example = 1, nullable = true)]
    pub id: Option<u64>,
    #[schema(example = "Ana")]
    pub name: Option<String>,
    #[schema(example = "ana@x.com")]
    pub email: Option<String>,
    #[schema(example = "555")]
    pub phone: Option<String>,
    #[schema(example = "Eng")]
    pub job_title: Option<String>,
    #[schema(example = "R&D")]
    pub department: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(example = 1000.0, value_type = Option<f64>)]
    pub salary: Option<Decimal>,
    #[schema(example = "2024-01-01", value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date", nullable = true)]
    pub end_date: Option<NaiveDate>,
}

impl EmployeeInput {
    /// Builds the input from `multipart/form-data` text fields.
    pub fn from_form(fields: &HashMap<String, String>) -> AppResult<Self> {
        let text = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let id = text("id")
            .map(|raw| raw.parse::<u64>())
            .transpose()
            .map_err(|_| AppError::validation("id must be a positive integer"))?;
        let salary = text("salary")
            .map(|raw| Decimal::from_str(&raw))
            .transpose()
            .map_err(|_| AppError::validation("salary must be a decimal number"))?;
        let start_date = text("startDate").map(|raw| parse_date("startDate", &raw)).transpose()?;
        let end_date = text("endDate").map(|raw| parse_date("endDate", &raw)).transpose()?;

        Ok(Self {
            id,
            name: text("name"),
            email: text("email"),
            phone: text("phone"),
            job_title: text("jobTitle"),
            department: text("department"),
            salary,
            start_date,
            end_date,
        })
    }

    pub fn validate(self) -> AppResult<NewEmployee> {
        Ok(NewEmployee {
            name: required_text("name", self.name)?,
            email: required_text("email", self.email)?,
            phone: required_text("phone", self.phone)?,
            job_title: required_text("jobTitle", self.job_title)?,
            department: required_text("department", self.department)?,
            salary: check_salary(
                self.salary
                    .ok_or_else(|| AppError::validation("salary is required"))?,
            )?,
            start_date: self
                .start_date
                .ok_or_else(|| AppError::validation("startDate is required"))?,
            end_date: self.end_date,
        })
    }
}

/// Field-by-field update. `None` leaves a column untouched; for `end_date`
/// `Some(None)` clears it.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    #[schema(value_type = Option<f64>)]
    pub salary: Option<Decimal>,
    #[schema(value_type = Option<String>, format = "date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[schema(value_type = Option<String>, format = "date", nullable = true)]
    pub end_date: Option<Option<NaiveDate>>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Presence checks: a supplied text field may not be blank.
    pub fn validate(&self) -> AppResult<()> {
        if self.is_empty() {
            return Err(AppError::validation("No fields provided for update"));
        }
        for (key, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("jobTitle", &self.job_title),
            ("department", &self.department),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(AppError::validation(format!("{key} must not be empty")));
            }
        }
        if let Some(salary) = self.salary {
            check_salary(salary)?;
        }
        Ok(())
    }

    /// Change set that overwrites every column.
    pub fn replace_all(employee: &NewEmployee) -> Self {
        Self {
            name: Some(employee.name.clone()),
            email: Some(employee.email.clone()),
            phone: Some(employee.phone.clone()),
            job_title: Some(employee.job_title.clone()),
            department: Some(employee.department.clone()),
            salary: Some(employee.salary),
            start_date: Some(employee.start_date),
            end_date: Some(employee.end_date),
        }
    }
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Salaries travel as JSON numbers (f64), which keep 15 significant digits
/// exactly; with the column's 2 decimal places that leaves 13 integer digits.
const SALARY_LIMIT: i64 = 10_000_000_000_000;

fn check_salary(salary: Decimal) -> AppResult<Decimal> {
    if salary.normalize().scale() > 2 {
        return Err(AppError::validation(
            "salary cannot have more than 2 decimal places",
        ));
    }
    if salary.abs() >= Decimal::from(SALARY_LIMIT) {
        return Err(AppError::validation(format!(
            "salary must be below {SALARY_LIMIT}"
        )));
    }
    Ok(salary)
}

fn required_text(key: &str, value: Option<String>) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{key} is required"))),
    }
}

fn parse_date(key: &str, raw: &str) -> AppResult<NaiveDate> {
    // forms may send either a plain date or a full ISO timestamp
    let date_part = raw.split('T').next().unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("{key} must be a date (YYYY-MM-DD)")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn ana_json() -> serde_json::Value {
        json!({
            "name": "Ana",
            "email": "ana@x.com",
            "phone": "555",
            "jobTitle": "Eng",
            "department": "R&D",
            "salary": 1000,
            "startDate": "2024-01-01"
        })
    }

    #[test]
    fn json_input_validates_into_new_employee() {
        let input: EmployeeInput = serde_json::from_value(ana_json()).unwrap();
        let employee = input.validate().unwrap();
        assert_eq!(employee.name, "Ana");
        assert_eq!(employee.salary, Decimal::from(1000));
        assert_eq!(employee.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(employee.end_date, None);
    }

    #[test]
    fn missing_field_names_the_field() {
        let mut body = ana_json();
        body.as_object_mut().unwrap().remove("jobTitle");
        let input: EmployeeInput = serde_json::from_value(body).unwrap();
        match input.validate() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "jobTitle is required"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn blank_text_counts_as_missing() {
        let mut body = ana_json();
        body["name"] = json!("   ");
        let input: EmployeeInput = serde_json::from_value(body).unwrap();
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn form_fields_are_parsed() {
        let fields: HashMap<String, String> = [
            ("id", "7"),
            ("name", "Ana"),
            ("email", "ana@x.com"),
            ("phone", "555"),
            ("jobTitle", "Eng"),
            ("department", "R&D"),
            ("salary", "1234.50"),
            ("startDate", "2024-01-01T00:00:00"),
            ("endDate", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let input = EmployeeInput::from_form(&fields).unwrap();
        assert_eq!(input.id, Some(7));
        let employee = input.validate().unwrap();
        assert_eq!(employee.salary, Decimal::from_str("1234.50").unwrap());
        assert_eq!(employee.end_date, None);
    }

    #[test]
    fn form_rejects_bad_salary() {
        let fields: HashMap<String, String> =
            [("salary".to_string(), "a lot".to_string())].into_iter().collect();
        assert!(matches!(
            EmployeeInput::from_form(&fields),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn changes_distinguish_absent_and_null_end_date() {
        let absent: EmployeeChanges = serde_json::from_value(json!({ "phone": "556" })).unwrap();
        assert_eq!(absent.end_date, None);

        let cleared: EmployeeChanges = serde_json::from_value(json!({ "endDate": null })).unwrap();
        assert_eq!(cleared.end_date, Some(None));
        assert!(!cleared.is_empty());
    }

    #[test]
    fn empty_changes_are_rejected() {
        let changes = EmployeeChanges::default();
        assert!(matches!(changes.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn salary_is_bounded_to_what_json_round_trips() {
        let mut body = ana_json();
        body["salary"] = json!(12.345);
        let input: EmployeeInput = serde_json::from_value(body).unwrap();
        assert!(matches!(input.validate(), Err(AppError::Validation(_))));

        let fields: HashMap<String, String> = [
            ("name", "Ana"),
            ("email", "ana@x.com"),
            ("phone", "555"),
            ("jobTitle", "Eng"),
            ("department", "R&D"),
            ("salary", "9999999999999999.99"),
            ("startDate", "2024-01-01"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let input = EmployeeInput::from_form(&fields).unwrap();
        match input.validate() {
            Err(AppError::Validation(msg)) => assert!(msg.starts_with("salary must be below")),
            other => panic!("unexpected result: {other:?}"),
        }

        let largest = Decimal::from_str("9999999999999.99").unwrap();
        let serialized = serde_json::to_value(Employee {
            id: 1,
            name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
            phone: "555".to_string(),
            job_title: "Eng".to_string(),
            department: "R&D".to_string(),
            salary: check_salary(largest).unwrap(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
        })
        .unwrap();
        let back: Employee = serde_json::from_value(serialized).unwrap();
        assert_eq!(back.salary, largest);

        let changes: EmployeeChanges =
            serde_json::from_value(json!({ "salary": 10000000000000.0 })).unwrap();
        assert!(matches!(changes.validate(), Err(AppError::Validation(_))));
    }
}
