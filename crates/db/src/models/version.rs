//! Version row and DTOs.

use corpus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VersionRow {
    pub id: DbId,
    pub post_id: DbId,
    pub version_number: i64,
    pub status: String,
    pub created_from_version: Option<i64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for `versions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVersion {
    pub post_id: DbId,
    pub version_number: i64,
    pub status: String,
    pub created_from_version: Option<i64>,
}
