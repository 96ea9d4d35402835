use actix_web::{HttpResponse, web};
use serde_json::json;

use crate::blob_store::BlobStore;
use crate::error::AppResult;
use crate::model::document::Document;
use crate::service::document as documents;
use crate::store::Store;

/// Get Document by ID
#[utoipa::path(
    get,
    path = "/api/documents/{document_id}",
    params(
        ("document_id" = u64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document found", body = Document),
        (status = 404, description = "Document not found.")
    ),
    tag = "Document"
)]
pub async fn get_document(
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let document = documents::find(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(document))
}

/// Delete Document
#[utoipa::path(
    delete,
    path = "/api/documents/{document_id}",
    params(
        ("document_id" = u64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Row and file removed", body = Object, example = json!({
            "message": "Document deleted successfully."
        })),
        (status = 404, description = "Document not found.", body = Object, example = json!({
            "message": "Document not found."
        })),
        (status = 500, description = "The file could not be removed; the row is kept")
    ),
    tag = "Document"
)]
pub async fn delete_document(
    store: web::Data<dyn Store>,
    blobs: web::Data<BlobStore>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    documents::delete(store.get_ref(), &blobs, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Document deleted successfully."
    })))
}
