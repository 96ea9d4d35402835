use actix_multipart::Multipart;
use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::blob_store::BlobStore;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::document::{Document, DocumentType};
use crate::model::employee::{EmployeeChanges, EmployeeInput, EmployeeProfile};
use crate::service::document as documents;
use crate::service::employee::{self as employees, EmployeePage};
use crate::store::Store;
use crate::utils::multipart::FormData;
use crate::utils::pagination::PageRequest;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EmployeeQuery {
    /// Case-insensitive substring of the employee name
    #[param(example = "ana")]
    pub search: Option<String>,
    /// 1-based page number, defaults to 1
    #[param(example = 1)]
    pub page: Option<i64>,
    /// Rows per page, defaults to 5
    #[param(example = 5)]
    pub page_size: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DocumentTypeQuery {
    /// Tag for the uploaded file; may also be sent as the `fileType` form field
    #[param(value_type = Option<String>, example = "Contract")]
    pub file_type: Option<String>,
}

/// Multipart body of a photo upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct PhotoForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Multipart body of a document upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DocumentForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    #[schema(example = "Contract")]
    pub file_type: String,
}

fn location(config: &Config, id: u64) -> String {
    format!("{}/employees/{}", config.api_prefix, id)
}

fn check_path_id(path_id: u64, body_id: Option<u64>) -> AppResult<()> {
    match body_id {
        Some(body_id) if body_id != path_id => {
            Err(AppError::validation("Employee ID mismatch."))
        }
        _ => Ok(()),
    }
}

/// List Employees
#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeePage),
        (status = 400, description = "Malformed query string")
    ),
    tag = "Employee"
)]
pub async fn list_employees(
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    query: web::Query<EmployeeQuery>,
) -> AppResult<HttpResponse> {
    let request = PageRequest::new(query.page, query.page_size, config.max_page_size);
    let page = employees::list_employees(store.get_ref(), query.search.as_deref(), request).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeProfile),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found."
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let profile = employees::employee_profile(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body(
        content = EmployeeInput,
        description = "JSON body, or the same fields as multipart/form-data with an optional `profilePicture` file part"
    ),
    responses(
        (status = 201, description = "Employee created", body = EmployeeProfile),
        (status = 400, description = "Missing or malformed field", body = Object, example = json!({
            "message": "name is required"
        })),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Something went wrong, Contact with system admin"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    config: web::Data<Config>,
    payload: web::Json<EmployeeInput>,
) -> AppResult<HttpResponse> {
    let employee = payload.into_inner().validate()?;
    let profile = employees::create_employee(store.get_ref(), &blobs, employee, None).await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location(&config, profile.employee.id)))
        .json(profile))
}

/// Multipart variant of [`create_employee`]; shares its OpenAPI entry.
pub async fn create_employee_form(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    config: web::Data<Config>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let mut form = FormData::read(payload, config.max_upload_bytes).await?;
    let employee = EmployeeInput::from_form(&form.fields)?.validate()?;
    let photo = form.take_file("profilePicture");

    let profile = employees::create_employee(store.get_ref(), &blobs, employee, photo).await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location(&config, profile.employee.id)))
        .json(profile))
}

/// Replace Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body(
        content = EmployeeInput,
        description = "Full record; multipart/form-data with an optional `profilePicture` file part is also accepted"
    ),
    responses(
        (status = 204, description = "Employee updated"),
        (status = 400, description = "Employee ID mismatch or missing field", body = Object, example = json!({
            "message": "Employee ID mismatch."
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn replace_employee(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeInput>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let input = payload.into_inner();
    check_path_id(employee_id, input.id)?;

    let changes = EmployeeChanges::replace_all(&input.validate()?);
    employees::update_employee(store.get_ref(), &blobs, employee_id, changes, None).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Multipart variant of [`replace_employee`].
pub async fn replace_employee_form(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let mut form = FormData::read(payload, config.max_upload_bytes).await?;
    let input = EmployeeInput::from_form(&form.fields)?;
    check_path_id(employee_id, input.id)?;

    let changes = EmployeeChanges::replace_all(&input.validate()?);
    let photo = form.take_file("profilePicture");
    employees::update_employee(store.get_ref(), &blobs, employee_id, changes, photo).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Patch Employee
#[utoipa::path(
    patch,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = EmployeeChanges,
    responses(
        (status = 204, description = "Employee updated"),
        (status = 400, description = "No fields provided for update"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee"
)]
pub async fn patch_employee(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    path: web::Path<u64>,
    payload: web::Json<EmployeeChanges>,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let changes = payload.into_inner();
    changes.validate()?;

    debug!(employee_id, ?changes, "Patching employee");
    employees::update_employee(store.get_ref(), &blobs, employee_id, changes, None).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 204, description = "Employee, documents and timesheets deleted"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found."
        }))
    ),
    tag = "Employee"
)]
pub async fn delete_employee(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    employees::delete_employee(store.get_ref(), &blobs, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Upload Profile Picture
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/upload-photo",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body(content = PhotoForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Photo stored; the previous one is replaced", body = Object, example = json!({
            "message": "Profile Picture uploaded successfully.",
            "documentPath": "uploads/photos/2c1f..._ana.png"
        })),
        (status = 400, description = "No file uploaded."),
        (status = 404, description = "Employee not found.")
    ),
    tag = "Document"
)]
pub async fn upload_photo(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let mut form = FormData::read(payload, config.max_upload_bytes).await?;

    let document = documents::upload(
        store.get_ref(),
        &blobs,
        employee_id,
        DocumentType::ProfilePicture,
        form.take_file("file"),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Profile Picture uploaded successfully.",
        "documentPath": document.file_path
    })))
}

/// Get Profile Picture
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/photo",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Latest profile picture", body = Object, example = json!({
            "photoPath": "uploads/photos/2c1f..._ana.png"
        })),
        (status = 404, description = "No profile picture found.")
    ),
    tag = "Document"
)]
pub async fn get_photo(
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let photo = documents::profile_picture(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "photoPath": photo.file_path })))
}

/// Upload Document
#[utoipa::path(
    post,
    path = "/api/employees/{employee_id}/upload-document",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        DocumentTypeQuery
    ),
    request_body(content = DocumentForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document stored", body = Object, example = json!({
            "message": "Document uploaded successfully.",
            "documentPath": "uploads/documents/0f6c..._contract.pdf"
        })),
        (status = 400, description = "No file uploaded or unknown fileType"),
        (status = 404, description = "Employee not found.")
    ),
    tag = "Document"
)]
pub async fn upload_document(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<DocumentTypeQuery>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();
    let mut form = FormData::read(payload, config.max_upload_bytes).await?;

    let raw_type = form
        .text("fileType")
        .map(str::to_string)
        .or_else(|| query.into_inner().file_type)
        .ok_or_else(|| AppError::validation("fileType is required"))?;
    let kind: DocumentType = raw_type
        .trim()
        .parse()
        .map_err(|_| AppError::validation(format!("Unknown fileType '{raw_type}'")))?;

    let document =
        documents::upload(store.get_ref(), &blobs, employee_id, kind, form.take_file("file"))
            .await?;

    let message = if kind == DocumentType::ProfilePicture {
        "Profile Picture uploaded successfully."
    } else {
        "Document uploaded successfully."
    };
    Ok(HttpResponse::Ok().json(json!({
        "message": message,
        "documentPath": document.file_path
    })))
}

/// List Employee Documents
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/documents",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Documents, newest first", body = [Document]),
        (status = 404, description = "Employee not found.")
    ),
    tag = "Document"
)]
pub async fn list_documents(
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let documents = documents::documents_for_employee(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(documents))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_id_must_match_path_id() {
        assert!(check_path_id(3, None).is_ok());
        assert!(check_path_id(3, Some(3)).is_ok());
        assert!(matches!(check_path_id(3, Some(4)), Err(AppError::Validation(_))));
    }
}
