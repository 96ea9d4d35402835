use crate::api::employee::{DocumentForm, PhotoForm};
use crate::model::document::{Document, DocumentType};
use crate::model::employee::{Employee, EmployeeChanges, EmployeeInput, EmployeeProfile};
use crate::model::timesheet::{Timesheet, TimesheetEntry, TimesheetInput};
use crate::service::employee::EmployeePage;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Employee Records API",
        version = "1.0.0",
        description = r#"
## Employee Records

Back office API for employee records and the files attached to them.

### Key Features
- **Employees**
  - Create, replace, patch, delete, list and search employee profiles
  - Each profile carries the path of its latest profile picture
- **Documents**
  - Upload profile pictures (one per employee, a new upload replaces the old one)
  - Upload resumes, contracts, identification and certificates
  - Uploaded files are served read-only under `/uploads`
- **Timesheets**
  - Record worked time ranges per employee

### Response Format
- JSON bodies with camelCase field names
- Errors are `{ "message": "..." }`
- `GET /api/employees` is paginated (`page`, `pageSize`)

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::employee::list_employees,
        crate::api::employee::get_employee,
        crate::api::employee::create_employee,
        crate::api::employee::replace_employee,
        crate::api::employee::patch_employee,
        crate::api::employee::delete_employee,

        crate::api::employee::upload_photo,
        crate::api::employee::get_photo,
        crate::api::employee::upload_document,
        crate::api::employee::list_documents,
        crate::api::document::get_document,
        crate::api::document::delete_document,

        crate::api::timesheet::list_timesheets,
        crate::api::timesheet::get_timesheet,
        crate::api::timesheet::create_timesheet,
        crate::api::timesheet::replace_timesheet,
        crate::api::timesheet::delete_timesheet
    ),
    components(
        schemas(
            Employee,
            EmployeeProfile,
            EmployeeInput,
            EmployeeChanges,
            EmployeePage,
            Document,
            DocumentType,
            PhotoForm,
            DocumentForm,
            Timesheet,
            TimesheetEntry,
            TimesheetInput
        )
    ),
    tags(
        (name = "Employee", description = "Employee management APIs"),
        (name = "Document", description = "Profile picture and document APIs"),
        (name = "Timesheet", description = "Timesheet APIs"),
    )
)]
pub struct ApiDoc;
