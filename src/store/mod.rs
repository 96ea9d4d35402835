//! Persistence seam. Handlers only see `dyn Store`; `MySqlStore` is the
//! production implementation and `memory::MemoryStore` backs the tests.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::AppResult;
use crate::model::document::{Document, DocumentType, NewDocument};
use crate::model::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::model::timesheet::{NewTimesheet, Timesheet};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

/// Predicate over employee rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    /// Case-insensitive substring of `name`; `None` matches every row.
    pub name_contains: Option<String>,
}

impl EmployeeFilter {
    pub fn new(search: Option<&str>) -> Self {
        Self {
            name_contains: search
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Result of replacing a profile picture: the inserted row and the rows it
/// superseded, whose blobs are now orphaned.
#[derive(Debug, Clone)]
pub struct Replaced {
    pub document: Document,
    pub superseded: Vec<Document>,
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Inserts the employee and, when given, its first profile picture in one
    /// transaction. `photo.employee_id` is ignored and set to the new id.
    async fn insert_employee(
        &self,
        employee: &NewEmployee,
        photo: Option<&NewDocument>,
    ) -> AppResult<u64>;

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>>;

    async fn find_employees(&self, ids: &[u64]) -> AppResult<Vec<Employee>>;

    /// Rows matching `filter`, ordered by id ascending.
    async fn search_employees(
        &self,
        filter: &EmployeeFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<Employee>>;

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<i64>;

    /// Applies `changes` and, when given, replaces the profile picture, all in
    /// one transaction. Returns `None` when the employee does not exist.
    async fn update_employee(
        &self,
        id: u64,
        changes: &EmployeeChanges,
        photo: Option<&NewDocument>,
    ) -> AppResult<Option<Vec<Document>>>;

    /// Deletes the employee with its documents and timesheets. Returns the
    /// removed documents, or `None` when the employee does not exist.
    async fn delete_employee(&self, id: u64) -> AppResult<Option<Vec<Document>>>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_document(&self, document: &NewDocument) -> AppResult<Document>;

    /// Deletes every row sharing the (employee, type) pair and inserts
    /// `document`, in one transaction. Replacements for one employee are
    /// serialized; a missing employee is `NotFound`.
    async fn replace_document(&self, document: &NewDocument) -> AppResult<Replaced>;

    async fn find_document(&self, id: u64) -> AppResult<Option<Document>>;

    /// Newest first.
    async fn documents_for_employee(&self, employee_id: u64) -> AppResult<Vec<Document>>;

    /// Greatest `uploaded_at` wins, ties go to the greatest id.
    async fn latest_document(
        &self,
        employee_id: u64,
        kind: DocumentType,
    ) -> AppResult<Option<Document>>;

    /// Batched form of [`DocumentStore::latest_document`]; employees without a
    /// matching row are absent from the map.
    async fn latest_documents(
        &self,
        employee_ids: &[u64],
        kind: DocumentType,
    ) -> AppResult<HashMap<u64, Document>>;

    async fn delete_document(&self, id: u64) -> AppResult<bool>;
}

#[async_trait]
pub trait TimesheetStore: Send + Sync {
    async fn insert_timesheet(&self, timesheet: &NewTimesheet) -> AppResult<u64>;

    async fn find_timesheet(&self, id: u64) -> AppResult<Option<Timesheet>>;

    /// Ordered by start time, newest first.
    async fn list_timesheets(&self, employee_id: Option<u64>) -> AppResult<Vec<Timesheet>>;

    async fn update_timesheet(&self, id: u64, timesheet: &NewTimesheet) -> AppResult<bool>;

    async fn delete_timesheet(&self, id: u64) -> AppResult<bool>;
}

pub trait Store: EmployeeStore + DocumentStore + TimesheetStore {}

impl<T: EmployeeStore + DocumentStore + TimesheetStore> Store for T {}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_search_matches_everything() {
        assert_eq!(EmployeeFilter::new(Some("")), EmployeeFilter::default());
        assert_eq!(EmployeeFilter::new(None), EmployeeFilter::default());
        assert_eq!(
            EmployeeFilter::new(Some("an")).name_contains.as_deref(),
            Some("an")
        );
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("ana"), "%ana%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
