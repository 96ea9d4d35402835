use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "Something went wrong, Contact with system admin";

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Not Found: {}", _0)]
    NotFound(String),
    #[display(fmt = "Validation Failure: {}", _0)]
    Validation(String),
    #[display(fmt = "Database Error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "File System Error: {}", _0)]
    FileSystem(std::io::Error),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::FileSystem(e)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::FileSystem(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.as_str(),
            AppError::Database(e) => {
                error!(error = %e, "Database operation failed");
                INTERNAL_MESSAGE
            }
            AppError::FileSystem(e) => {
                error!(error = %e, "File system operation failed");
                INTERNAL_MESSAGE
            }
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn storage_failures_do_not_leak_their_cause() {
        let err = AppError::FileSystem(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "/srv/wwwroot/uploads is read-only",
        ));
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], INTERNAL_MESSAGE);
    }

    #[actix_web::test]
    async fn not_found_and_validation_keep_their_message() {
        let resp = AppError::not_found("Document not found.").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body()).await.unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&body).unwrap()["message"],
            "Document not found."
        );

        let resp = AppError::validation("No file uploaded.").error_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
