use async_trait::async_trait;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};
use std::collections::HashMap;
use tracing::debug;

use super::{
    DocumentStore, EmployeeFilter, EmployeeStore, Replaced, TimesheetStore, like_pattern,
};
use crate::error::{AppError, AppResult};
use crate::model::document::{Document, DocumentType, NewDocument};
use crate::model::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::model::timesheet::{NewTimesheet, Timesheet};
use crate::utils::db_utils::{SqlValue, build_update_sql, execute_update};

const EMPLOYEE_COLUMNS: &str =
    "id, name, email, phone, job_title, department, salary, start_date, end_date";
const DOCUMENT_COLUMNS: &str = "id, employee_id, file_path, file_type, uploaded_at";
const TIMESHEET_COLUMNS: &str = "id, employee_id, start_time, end_time, summary";

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn employee_columns(changes: &EmployeeChanges) -> Vec<(&'static str, SqlValue)> {
    let mut columns = Vec::new();
    if let Some(v) = &changes.name {
        columns.push(("name", v.clone().into()));
    }
    if let Some(v) = &changes.email {
        columns.push(("email", v.clone().into()));
    }
    if let Some(v) = &changes.phone {
        columns.push(("phone", v.clone().into()));
    }
    if let Some(v) = &changes.job_title {
        columns.push(("job_title", v.clone().into()));
    }
    if let Some(v) = &changes.department {
        columns.push(("department", v.clone().into()));
    }
    if let Some(v) = changes.salary {
        columns.push(("salary", v.into()));
    }
    if let Some(v) = changes.start_date {
        columns.push(("start_date", v.into()));
    }
    if let Some(v) = changes.end_date {
        columns.push(("end_date", v.into()));
    }
    columns
}

fn push_employee_filter(builder: &mut QueryBuilder<'_, MySql>, filter: &EmployeeFilter) {
    if let Some(search) = &filter.name_contains {
        // default MySQL collation makes LIKE case-insensitive; '\' is the escape character
        builder.push(" WHERE name LIKE ");
        builder.push_bind(like_pattern(search));
    }
}

async fn insert_document_row(
    conn: &mut MySqlConnection,
    document: &NewDocument,
) -> Result<Document, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO documents (employee_id, file_path, file_type)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(document.employee_id)
    .bind(&document.file_path)
    .bind(document.file_type.to_string())
    .execute(&mut *conn)
    .await?;

    let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?");
    sqlx::query_as::<_, Document>(&sql)
        .bind(result.last_insert_id())
        .fetch_one(&mut *conn)
        .await
}

/// Removes all rows of `document`'s (employee, type) pair and inserts it.
async fn replace_document_rows(
    conn: &mut MySqlConnection,
    document: &NewDocument,
) -> Result<Replaced, sqlx::Error> {
    let sql = format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE employee_id = ? AND file_type = ? FOR UPDATE"
    );
    let superseded = sqlx::query_as::<_, Document>(&sql)
        .bind(document.employee_id)
        .bind(document.file_type.to_string())
        .fetch_all(&mut *conn)
        .await?;

    sqlx::query("DELETE FROM documents WHERE employee_id = ? AND file_type = ?")
        .bind(document.employee_id)
        .bind(document.file_type.to_string())
        .execute(&mut *conn)
        .await?;

    let document = insert_document_row(conn, document).await?;

    Ok(Replaced {
        document,
        superseded,
    })
}

async fn lock_employee(conn: &mut MySqlConnection, id: u64) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE id = ? FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn insert_employee(
        &self,
        employee: &NewEmployee,
        photo: Option<&NewDocument>,
    ) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (name, email, phone, job_title, department, salary, start_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(&employee.job_title)
        .bind(&employee.department)
        .bind(employee.salary)
        .bind(employee.start_date)
        .bind(employee.end_date)
        .execute(&mut *tx)
        .await?;

        let id = result.last_insert_id();

        if let Some(photo) = photo {
            let photo = NewDocument {
                employee_id: id,
                ..photo.clone()
            };
            insert_document_row(&mut tx, &photo).await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn find_employee(&self, id: u64) -> AppResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn find_employees(&self, ids: &[u64]) -> AppResult<Vec<Employee>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id IN ("
        ));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let employees = builder
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn search_employees(
        &self,
        filter: &EmployeeFilter,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<Employee>> {
        let mut builder =
            QueryBuilder::<MySql>::new(format!("SELECT {EMPLOYEE_COLUMNS} FROM employees"));
        push_employee_filter(&mut builder, filter);
        builder.push(" ORDER BY id ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        debug!(sql = %builder.sql(), ?filter, offset, limit, "Fetching employees");

        let employees = builder
            .build_query_as::<Employee>()
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM employees");
        push_employee_filter(&mut builder, filter);

        debug!(sql = %builder.sql(), ?filter, "Counting employees");

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn update_employee(
        &self,
        id: u64,
        changes: &EmployeeChanges,
        photo: Option<&NewDocument>,
    ) -> AppResult<Option<Vec<Document>>> {
        let mut tx = self.pool.begin().await?;

        if !lock_employee(&mut tx, id).await? {
            return Ok(None);
        }

        let columns = employee_columns(changes);
        if !columns.is_empty() {
            let update = build_update_sql("employees", columns, "id", id)?;
            execute_update(&mut *tx, update).await?;
        }

        let mut superseded = Vec::new();
        if let Some(photo) = photo {
            let photo = NewDocument {
                employee_id: id,
                ..photo.clone()
            };
            superseded = replace_document_rows(&mut tx, &photo).await?.superseded;
        }

        tx.commit().await?;
        Ok(Some(superseded))
    }

    async fn delete_employee(&self, id: u64) -> AppResult<Option<Vec<Document>>> {
        let mut tx = self.pool.begin().await?;

        if !lock_employee(&mut tx, id).await? {
            return Ok(None);
        }

        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE employee_id = ?");
        let documents = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM documents WHERE employee_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM timesheets WHERE employee_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(documents))
    }
}

#[async_trait]
impl DocumentStore for MySqlStore {
    async fn insert_document(&self, document: &NewDocument) -> AppResult<Document> {
        let mut conn = self.pool.acquire().await?;
        Ok(insert_document_row(&mut conn, document).await?)
    }

    async fn replace_document(&self, document: &NewDocument) -> AppResult<Replaced> {
        let mut tx = self.pool.begin().await?;

        // serializes first uploads, which would otherwise deadlock on the
        // (employee_id, file_type) gap lock
        if !lock_employee(&mut tx, document.employee_id).await? {
            return Err(AppError::not_found("Employee not found."));
        }

        let replaced = replace_document_rows(&mut tx, document).await?;
        tx.commit().await?;
        Ok(replaced)
    }

    async fn find_document(&self, id: u64) -> AppResult<Option<Document>> {
        let sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?");
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    async fn documents_for_employee(&self, employee_id: u64) -> AppResult<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE employee_id = ? ORDER BY uploaded_at DESC, id DESC"
        );
        let documents = sqlx::query_as::<_, Document>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(documents)
    }

    async fn latest_document(
        &self,
        employee_id: u64,
        kind: DocumentType,
    ) -> AppResult<Option<Document>> {
        let sql = format!(
            r#"
            SELECT {DOCUMENT_COLUMNS}
            FROM documents
            WHERE employee_id = ? AND file_type = ?
            ORDER BY uploaded_at DESC, id DESC
            LIMIT 1
            "#
        );
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(employee_id)
            .bind(kind.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(document)
    }

    async fn latest_documents(
        &self,
        employee_ids: &[u64],
        kind: DocumentType,
    ) -> AppResult<HashMap<u64, Document>> {
        if employee_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE file_type = "
        ));
        builder.push_bind(kind.to_string());
        builder.push(" AND employee_id IN (");
        let mut separated = builder.separated(", ");
        for id in employee_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");
        builder.push(" ORDER BY employee_id, uploaded_at DESC, id DESC");

        let rows = builder
            .build_query_as::<Document>()
            .fetch_all(&self.pool)
            .await?;

        // rows arrive newest first per employee, so the first one seen wins
        let mut latest = HashMap::with_capacity(employee_ids.len());
        for row in rows {
            latest.entry(row.employee_id).or_insert(row);
        }
        Ok(latest)
    }

    async fn delete_document(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TimesheetStore for MySqlStore {
    async fn insert_timesheet(&self, timesheet: &NewTimesheet) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO timesheets (employee_id, start_time, end_time, summary)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(timesheet.employee_id)
        .bind(timesheet.start_time)
        .bind(timesheet.end_time)
        .bind(&timesheet.summary)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn find_timesheet(&self, id: u64) -> AppResult<Option<Timesheet>> {
        let sql = format!("SELECT {TIMESHEET_COLUMNS} FROM timesheets WHERE id = ?");
        let timesheet = sqlx::query_as::<_, Timesheet>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(timesheet)
    }

    async fn list_timesheets(&self, employee_id: Option<u64>) -> AppResult<Vec<Timesheet>> {
        let mut builder =
            QueryBuilder::<MySql>::new(format!("SELECT {TIMESHEET_COLUMNS} FROM timesheets"));
        if let Some(employee_id) = employee_id {
            builder.push(" WHERE employee_id = ");
            builder.push_bind(employee_id);
        }
        builder.push(" ORDER BY start_time DESC, id DESC");

        let timesheets = builder
            .build_query_as::<Timesheet>()
            .fetch_all(&self.pool)
            .await?;
        Ok(timesheets)
    }

    async fn update_timesheet(&self, id: u64, timesheet: &NewTimesheet) -> AppResult<bool> {
        let update = build_update_sql(
            "timesheets",
            vec![
                ("employee_id", timesheet.employee_id.into()),
                ("start_time", timesheet.start_time.into()),
                ("end_time", timesheet.end_time.into()),
                ("summary", timesheet.summary.clone().into()),
            ],
            "id",
            id,
        )?;

        // rows_affected is 0 for an unchanged row, so existence is checked separately
        let affected = execute_update(&self.pool, update).await?;
        if affected > 0 {
            return Ok(true);
        }
        Ok(self.find_timesheet(id).await?.is_some())
    }

    async fn delete_timesheet(&self, id: u64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM timesheets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
