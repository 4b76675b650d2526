use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::persistence::FileRecord;

/// Response DTO for a stored file.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// File ID (UUID).
    #[schema(example = "9b2f6a52-4c3e-4c1e-9a3e-1f0c2d7b8e11")]
    pub id: String,
    /// Original upload filename.
    #[schema(example = "a.txt")]
    pub filename: String,
    /// Object-store key holding the content.
    #[schema(example = "9b2f6a52-4c3e-4c1e-9a3e-1f0c2d7b8e11-a.txt")]
    pub storage_ref: String,
    pub created_at: DateTime<Utc>,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id.to_string(),
            filename: record.filename,
            storage_ref: record.storage_key,
            created_at: record.created_at,
        }
    }
}
