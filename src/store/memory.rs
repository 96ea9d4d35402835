//! In-process `Store` used by unit and HTTP tests. Mirrors the MySQL
//! semantics that callers rely on: case-insensitive name search, id-ordered
//! paging, newest-wins attachment resolution and cascading employee deletes.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{DocumentStore, EmployeeFilter, EmployeeStore, Replaced, TimesheetStore};
use crate::error::{AppError, AppResult};
use crate::model::document::{Document, DocumentType, NewDocument};
use crate::model::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::model::timesheet::{NewTimesheet, Timesheet};

#[derive(Default)]
struct Tables {
    employee_seq: u64,
    document_seq: u64,
    timesheet_seq: u64,
    employees: BTreeMap<u64, Employee>,
    documents: BTreeMap<u64, Document>,
    timesheets: BTreeMap<u64, Timesheet>,
}

impl Tables {
    fn insert_document(&mut self, document: &NewDocument) -> Document {
        self.document_seq += 1;
        let row = Document {
            id: self.document_seq,
            employee_id: document.employee_id,
            file_path: document.file_path.clone(),
            file_type: document.file_type,
            uploaded_at: Utc::now(),
        };
        self.documents.insert(row.id, row.clone());
        row
    }

    fn replace_document(&mut self, document: &NewDocument) -> Replaced {
        let superseded_ids: Vec<u64> = self
            .documents
            .values()
            .filter(|d| d.employee_id == document.employee_id && d.file_type == document.file_type)
            .map(|d| d.id)
            .collect();
        let superseded = superseded_ids
            .iter()
            .filter_map(|id| self.documents.remove(id))
            .collect();
        Replaced {
            document: self.insert_document(document),
            superseded,
        }
    }

    fn latest(&self, employee_id: u64, kind: DocumentType) -> Option<&Document> {
        self.documents
            .values()
            .filter(|d| d.employee_id == employee_id && d.file_type == kind)
            .max_by_key(|d| (d.uploaded_at, d.id))
    }
}

fn matches(filter: &EmployeeFilter, employee: &Employee) -> bool {
    match &filter.name_contains {
        Some(search) => employee
            .name
            .to_lowercase()
            .contains(&search.to_lowercase()),
        None => true,
    }
}

fn apply(changes: &EmployeeChanges, employee: &mut Employee) {
    if let Some(v) = &changes.name {
        employee.name = v.clone();
    }
    if let Some(v) = &changes.email {
        employee.email = v.clone();
    }
    if let Some(v) = &changes.phone {
        employee.phone = v.clone();
    }
    if let Some(v) = &changes.job_title {
        employee.job_title = v.clone();
    }
    if let Some(v) = &changes.department {
        employee.department = v.clone();
    }
    if let Some(v) = changes.salary {
        employee.salary = v;
    }
    if let Some(v) = changes.start_date {
        employee.start_date = v;
    }
    if let Some(v) = changes.end_date {
        employee.end_date = v;
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_next_write: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document row with an explicit timestamp.
    pub fn seed_document(&self, document: Document) {
        let mut tables = self.tables.lock().unwrap();
        tables.document_seq = tables.document_seq.max(document.id);
        tables.documents.insert(document.id, document);
    }

    /// Makes the next insert, update or replace fail with a database error
    /// without touching any table.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn check_write(&self) -> AppResult<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }
        Ok(())
    }

    fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn insert_employee(
        &self,
        employee: &NewEmployee,
        photo: Option<&NewDocument>,
    ) -> AppResult<u64> {
        self.check_write()?;
        let mut tables = self.tables();
        tables.employee_seq += 1;
        let id = tables.employee_seq;
        tables.employees.insert(
            id,
            Employee {
                id,
                name: employee.name.clone(),
                email: employee.email.clone(),
                phone: employee.phone.clone(),
                job_title: employee.job_title.clone(),
                department: employee.department.clone(),
                salary: employee.salary,
                start_date: employee.start_date,
                end_date: employee.end_date,
            },
        );
        if let Some(photo) = photo {
            tables.insert_document(&NewDocument {
                employee_id: id,
                ..photo.clone()
            });
        }
        Ok(id)
    }

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        Ok(self.tables().employees.get(&id).cloned())
    }

    async fn find_employees(&self, ids: &[u64]) -> AppResult<Vec<Employee>> {
        let tables = self.tables();
        Ok(ids
            .iter()
            .filter_map(|id| tables.employees.get(id).cloned())
            .collect())
    }

    async fn search_employees(
        &self,
        filter: &EmployeeFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<Employee>> {
        let tables = self.tables();
        Ok(tables
            .employees
            .values()
            .filter(|e| matches(filter, e))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<i64> {
        let tables = self.tables();
        Ok(tables.employees.values().filter(|e| matches(filter, e)).count() as i64)
    }

    async fn update_employee(
        &self,
        id: u64,
        changes: &EmployeeChanges,
        photo: Option<&NewDocument>,
    ) -> AppResult<Option<Vec<Document>>> {
        self.check_write()?;
        let mut tables = self.tables();
        let Some(employee) = tables.employees.get_mut(&id) else {
            return Ok(None);
        };
        apply(changes, employee);

        let superseded = match photo {
            Some(photo) => {
                tables
                    .replace_document(&NewDocument {
                        employee_id: id,
                        ..photo.clone()
                    })
                    .superseded
            }
            None => Vec::new(),
        };
        Ok(Some(superseded))
    }

    async fn delete_employee(&self, id: u64) -> AppResult<Option<Vec<Document>>> {
        let mut tables = self.tables();
        if tables.employees.remove(&id).is_none() {
            return Ok(None);
        }
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut tables.documents)
            .into_values()
            .partition(|d| d.employee_id == id);
        tables.documents = kept.into_iter().map(|d| (d.id, d)).collect();
        tables.timesheets.retain(|_, t| t.employee_id != id);
        Ok(Some(removed))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, document: &NewDocument) -> AppResult<Document> {
        self.check_write()?;
        Ok(self.tables().insert_document(document))
    }

    async fn replace_document(&self, document: &NewDocument) -> AppResult<Replaced> {
        self.check_write()?;
        let mut tables = self.tables();
        if !tables.employees.contains_key(&document.employee_id) {
            return Err(AppError::not_found("Employee not found."));
        }
        Ok(tables.replace_document(document))
    }

    async fn find_document(&self, id: u64) -> AppResult<Option<Document>> {
        Ok(self.tables().documents.get(&id).cloned())
    }

    async fn documents_for_employee(&self, employee_id: u64) -> AppResult<Vec<Document>> {
        let tables = self.tables();
        let mut documents: Vec<Document> = tables
            .documents
            .values()
            .filter(|d| d.employee_id == employee_id)
            .cloned()
            .collect();
        documents.sort_by_key(|d| std::cmp::Reverse((d.uploaded_at, d.id)));
        Ok(documents)
    }

    async fn latest_document(
        &self,
        employee_id: u64,
        kind: DocumentType,
    ) -> AppResult<Option<Document>> {
        Ok(self.tables().latest(employee_id, kind).cloned())
    }

    async fn latest_documents(
        &self,
        employee_ids: &[u64],
        kind: DocumentType,
    ) -> AppResult<HashMap<u64, Document>> {
        let tables = self.tables();
        Ok(employee_ids
            .iter()
            .filter_map(|id| tables.latest(*id, kind).map(|d| (*id, d.clone())))
            .collect())
    }

    async fn delete_document(&self, id: u64) -> AppResult<bool> {
        Ok(self.tables().documents.remove(&id).is_some())
    }
}

#[async_trait]
impl TimesheetStore for MemoryStore {
    async fn insert_timesheet(&self, timesheet: &NewTimesheet) -> AppResult<u64> {
        let mut tables = self.tables();
        tables.timesheet_seq += 1;
        let id = tables.timesheet_seq;
        tables.timesheets.insert(
            id,
            Timesheet {
                id,
                employee_id: timesheet.employee_id,
                start_time: timesheet.start_time,
                end_time: timesheet.end_time,
                summary: timesheet.summary.clone(),
            },
        );
        Ok(id)
    }

    async fn find_timesheet(&self, id: u64) -> AppResult<Option<Timesheet>> {
        Ok(self.tables().timesheets.get(&id).cloned())
    }

    async fn list_timesheets(&self, employee_id: Option<u64>) -> AppResult<Vec<Timesheet>> {
        let tables = self.tables();
        let mut timesheets: Vec<Timesheet> = tables
            .timesheets
            .values()
            .filter(|t| employee_id.is_none_or(|id| t.employee_id == id))
            .cloned()
            .collect();
        timesheets.sort_by_key(|t| std::cmp::Reverse((t.start_time, t.id)));
        Ok(timesheets)
    }

    async fn update_timesheet(&self, id: u64, timesheet: &NewTimesheet) -> AppResult<bool> {
        let mut tables = self.tables();
        let Some(row) = tables.timesheets.get_mut(&id) else {
            return Ok(false);
        };
        row.employee_id = timesheet.employee_id;
        row.start_time = timesheet.start_time;
        row.end_time = timesheet.end_time;
        row.summary = timesheet.summary.clone();
        Ok(true)
    }

    async fn delete_timesheet(&self, id: u64) -> AppResult<bool> {
        Ok(self.tables().timesheets.remove(&id).is_some())
    }
}
