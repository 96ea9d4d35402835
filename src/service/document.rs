use tracing::info;

use crate::blob_store::BlobStore;
use crate::error::{AppError, AppResult};
use crate::model::document::{Document, DocumentType, NewDocument};
use crate::store::{DocumentStore, EmployeeStore, Store};
use crate::utils::multipart::UploadedFile;

/// Writes the blob for an upload and returns the row that should point at it.
pub(crate) async fn stage_upload(
    blobs: &BlobStore,
    employee_id: u64,
    kind: DocumentType,
    file: &UploadedFile,
) -> AppResult<NewDocument> {
    if file.bytes.is_empty() {
        return Err(AppError::validation("No file uploaded."));
    }
    let file_path = blobs.save(kind.folder(), &file.file_name, &file.bytes).await?;
    Ok(NewDocument {
        employee_id,
        file_path,
        file_type: kind,
    })
}

pub(crate) async fn discard_all(blobs: &BlobStore, documents: &[Document]) {
    for document in documents {
        blobs.discard(&document.file_path).await;
    }
}

/// Stores an upload for an employee. Profile pictures replace the previous
/// one (its blob is removed); every other type is appended.
pub async fn upload(
    store: &dyn Store,
    blobs: &BlobStore,
    employee_id: u64,
    kind: DocumentType,
    file: Option<UploadedFile>,
) -> AppResult<Document> {
    if store.find_employee(employee_id).await?.is_none() {
        return Err(AppError::not_found("Employee not found."));
    }
    let file = file.ok_or_else(|| AppError::validation("No file uploaded."))?;

    let staged = stage_upload(blobs, employee_id, kind, &file).await?;

    let result = match kind {
        DocumentType::ProfilePicture => store.replace_document(&staged).await.map(|replaced| {
            (replaced.document, replaced.superseded)
        }),
        _ => store.insert_document(&staged).await.map(|d| (d, Vec::new())),
    };

    let (document, superseded) = match result {
        Ok(rows) => rows,
        Err(e) => {
            blobs.discard(&staged.file_path).await;
            return Err(e);
        }
    };

    discard_all(blobs, &superseded).await;
    info!(
        employee_id,
        document_id = document.id,
        file_type = %kind,
        "Document uploaded"
    );
    Ok(document)
}

pub async fn profile_picture(store: &dyn Store, employee_id: u64) -> AppResult<Document> {
    store
        .latest_document(employee_id, DocumentType::ProfilePicture)
        .await?
        .ok_or_else(|| AppError::not_found("No profile picture found."))
}

pub async fn documents_for_employee(store: &dyn Store, employee_id: u64) -> AppResult<Vec<Document>> {
    if store.find_employee(employee_id).await?.is_none() {
        return Err(AppError::not_found("Employee not found."));
    }
    store.documents_for_employee(employee_id).await
}

pub async fn find(store: &dyn Store, id: u64) -> AppResult<Document> {
    store
        .find_document(id)
        .await?
        .ok_or_else(|| AppError::not_found("Document not found."))
}

/// Removes the blob (when present) before the row, so a filesystem failure
/// leaves the row in place and surfaces as a storage error.
pub async fn delete(store: &dyn Store, blobs: &BlobStore, id: u64) -> AppResult<()> {
    let document = find(store, id).await?;

    if blobs.exists(&document.file_path).await? {
        blobs.delete(&document.file_path).await?;
    }

    if !store.delete_document(id).await? {
        return Err(AppError::not_found("Document not found."));
    }

    info!(document_id = id, employee_id = document.employee_id, "Document deleted");
    Ok(())
}
