use serde::Serialize;
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::blob_store::BlobStore;
use crate::error::{AppError, AppResult};
use crate::model::document::{DocumentType, NewDocument};
use crate::model::employee::{EmployeeChanges, EmployeeProfile, NewEmployee};
use crate::service::document::{discard_all, stage_upload};
use crate::store::{DocumentStore, EmployeeFilter, EmployeeStore, Store};
use crate::utils::multipart::UploadedFile;
use crate::utils::pagination::PageRequest;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePage {
    pub data: Vec<EmployeeProfile>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 5)]
    pub page_size: u64,
    #[schema(example = 1)]
    pub total_records: i64,
    #[schema(example = 1)]
    pub total_pages: i64,
}

/// Filtered, paginated listing with each row's latest profile picture.
pub async fn list_employees(
    store: &dyn Store,
    search: Option<&str>,
    request: PageRequest,
) -> AppResult<EmployeePage> {
    let filter = EmployeeFilter::new(search);

    let total_records = store.count_employees(&filter).await?;
    let employees = store
        .search_employees(&filter, request.offset(), request.page_size)
        .await?;

    let ids: Vec<u64> = employees.iter().map(|e| e.id).collect();
    let mut pictures = store
        .latest_documents(&ids, DocumentType::ProfilePicture)
        .await?;

    debug!(
        ?filter,
        page = request.page,
        page_size = request.page_size,
        total_records,
        returned = employees.len(),
        "Composed employee page"
    );

    let data = employees
        .into_iter()
        .map(|employee| EmployeeProfile {
            profile_picture: pictures.remove(&employee.id).map(|d| d.file_path),
            employee,
        })
        .collect();

    Ok(EmployeePage {
        data,
        page: request.page,
        page_size: request.page_size,
        total_records,
        total_pages: request.total_pages(total_records),
    })
}

pub async fn employee_profile(store: &dyn Store, id: u64) -> AppResult<EmployeeProfile> {
    let employee = store
        .find_employee(id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found."))?;

    let profile_picture = store
        .latest_document(id, DocumentType::ProfilePicture)
        .await?
        .map(|d| d.file_path);

    Ok(EmployeeProfile {
        employee,
        profile_picture,
    })
}

/// Inserts the employee and optional first photo atomically. The photo blob
/// is written first and removed again if the insert fails.
pub async fn create_employee(
    store: &dyn Store,
    blobs: &BlobStore,
    employee: NewEmployee,
    photo: Option<UploadedFile>,
) -> AppResult<EmployeeProfile> {
    let photo = match photo {
        Some(file) => Some(stage_upload(blobs, 0, DocumentType::ProfilePicture, &file).await?),
        None => None,
    };

    let id = match store.insert_employee(&employee, photo.as_ref()).await {
        Ok(id) => id,
        Err(e) => {
            discard_staged(blobs, photo.as_ref()).await;
            return Err(e);
        }
    };

    info!(employee_id = id, with_photo = photo.is_some(), "Employee created");
    employee_profile(store, id).await
}

/// Applies `changes` and optionally swaps the profile picture in one
/// transaction; superseded photo blobs are removed after commit.
pub async fn update_employee(
    store: &dyn Store,
    blobs: &BlobStore,
    id: u64,
    changes: EmployeeChanges,
    photo: Option<UploadedFile>,
) -> AppResult<()> {
    if store.find_employee(id).await?.is_none() {
        return Err(AppError::not_found("Employee not found."));
    }

    let photo = match photo {
        Some(file) => Some(stage_upload(blobs, id, DocumentType::ProfilePicture, &file).await?),
        None => None,
    };

    let superseded = match store.update_employee(id, &changes, photo.as_ref()).await {
        Ok(Some(superseded)) => superseded,
        Ok(None) => {
            discard_staged(blobs, photo.as_ref()).await;
            return Err(AppError::not_found("Employee not found."));
        }
        Err(e) => {
            discard_staged(blobs, photo.as_ref()).await;
            return Err(e);
        }
    };

    discard_all(blobs, &superseded).await;
    info!(employee_id = id, replaced_photos = superseded.len(), "Employee updated");
    Ok(())
}

/// Cascading delete: rows go in one transaction, then their blobs.
pub async fn delete_employee(store: &dyn Store, blobs: &BlobStore, id: u64) -> AppResult<()> {
    let documents = store
        .delete_employee(id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found."))?;

    discard_all(blobs, &documents).await;
    info!(employee_id = id, documents = documents.len(), "Employee deleted");
    Ok(())
}

async fn discard_staged(blobs: &BlobStore, photo: Option<&NewDocument>) {
    if let Some(photo) = photo {
        blobs.discard(&photo.file_path).await;
    }
}
