use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Canonical attachment tag. Parsing ignores ASCII case and accepts the
/// legacy "Profile Picture" spelling.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum DocumentType {
    #[strum(to_string = "ProfilePicture", serialize = "Profile Picture")]
    ProfilePicture,
    Resume,
    Contract,
    Identification,
    Certificate,
    Other,
}

impl DocumentType {
    /// Directory below the public root that holds blobs of this type.
    pub fn folder(self) -> &'static str {
        match self {
            DocumentType::ProfilePicture => "uploads/photos",
            _ => "uploads/documents",
        }
    }
}

impl TryFrom<String> for DocumentType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "uploads/documents/0f6c..._contract.pdf")]
    pub file_path: String,

    #[sqlx(try_from = "String")]
    pub file_type: DocumentType,

    #[schema(example = "2024-01-01T00:00:00Z", value_type = String, format = "date-time")]
    pub uploaded_at: DateTime<Utc>,
}

/// A document row about to be inserted; `uploaded_at` is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub employee_id: u64,
    pub file_path: String,
    pub file_type: DocumentType,
}
