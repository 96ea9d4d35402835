use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};

/// Budget shared by all text fields of one form.
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A fully buffered `multipart/form-data` body.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Buffers the whole body. File parts share one `max_file_bytes` budget
    /// and text fields share another, so extra parts cannot multiply the
    /// memory a request may hold.
    pub async fn read(mut payload: Multipart, max_file_bytes: usize) -> AppResult<Self> {
        let mut form = FormData::default();
        let mut file_bytes = 0usize;
        let mut text_bytes = 0usize;

        while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
            let disposition = field.content_disposition();
            let name = disposition.get_name().unwrap_or_default().to_string();
            let file_name = disposition.get_filename().map(str::to_string);

            let (used, limit, what) = if file_name.is_some() {
                (&mut file_bytes, max_file_bytes, "Uploaded files")
            } else {
                (&mut text_bytes, MAX_TEXT_FIELD_BYTES, "Form fields")
            };

            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(malformed)? {
                *used += chunk.len();
                if *used > limit {
                    return Err(AppError::validation(format!(
                        "{what} exceed the {limit} byte limit"
                    )));
                }
                bytes.extend_from_slice(&chunk);
            }

            match file_name {
                Some(file_name) => {
                    form.files.insert(name, UploadedFile { file_name, bytes });
                }
                None => {
                    let text = String::from_utf8(bytes).map_err(|_| {
                        AppError::validation(format!("Field '{name}' is not valid UTF-8"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Removes the named file part; an empty part counts as absent.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.bytes.is_empty())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

fn malformed(e: actix_multipart::MultipartError) -> AppError {
    AppError::validation(format!("Malformed multipart body: {e}"))
}
