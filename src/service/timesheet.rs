use std::collections::HashMap;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::model::timesheet::{NewTimesheet, Timesheet, TimesheetEntry};
use crate::store::{EmployeeStore, Store, TimesheetStore};

async fn with_employees(store: &dyn Store, rows: Vec<Timesheet>) -> AppResult<Vec<TimesheetEntry>> {
    let mut ids: Vec<u64> = rows.iter().map(|t| t.employee_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let employees: HashMap<u64, _> = store
        .find_employees(&ids)
        .await?
        .into_iter()
        .map(|e| (e.id, e))
        .collect();

    Ok(rows
        .into_iter()
        .map(|timesheet| {
            let employee = employees.get(&timesheet.employee_id).cloned();
            TimesheetEntry { timesheet, employee }
        })
        .collect())
}

async fn ensure_employee(store: &dyn Store, employee_id: u64) -> AppResult<()> {
    match store.find_employee(employee_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::validation(format!(
            "Employee {employee_id} does not exist"
        ))),
    }
}

pub async fn list(store: &dyn Store, employee_id: Option<u64>) -> AppResult<Vec<TimesheetEntry>> {
    let rows = store.list_timesheets(employee_id).await?;
    with_employees(store, rows).await
}

pub async fn get(store: &dyn Store, id: u64) -> AppResult<TimesheetEntry> {
    let timesheet = store
        .find_timesheet(id)
        .await?
        .ok_or_else(|| AppError::not_found("Timesheet not found."))?;
    let employee = store.find_employee(timesheet.employee_id).await?;
    Ok(TimesheetEntry { timesheet, employee })
}

pub async fn create(store: &dyn Store, timesheet: NewTimesheet) -> AppResult<TimesheetEntry> {
    ensure_employee(store, timesheet.employee_id).await?;

    let id = store.insert_timesheet(&timesheet).await?;
    info!(timesheet_id = id, employee_id = timesheet.employee_id, "Timesheet created");
    get(store, id).await
}

pub async fn replace(store: &dyn Store, id: u64, timesheet: NewTimesheet) -> AppResult<()> {
    if store.find_timesheet(id).await?.is_none() {
        return Err(AppError::not_found("Timesheet not found."));
    }
    ensure_employee(store, timesheet.employee_id).await?;

    if !store.update_timesheet(id, &timesheet).await? {
        return Err(AppError::not_found("Timesheet not found."));
    }
    info!(timesheet_id = id, "Timesheet updated");
    Ok(())
}

pub async fn delete(store: &dyn Store, id: u64) -> AppResult<()> {
    if !store.delete_timesheet(id).await? {
        return Err(AppError::not_found("Timesheet not found."));
    }
    info!(timesheet_id = id, "Timesheet deleted");
    Ok(())
}
