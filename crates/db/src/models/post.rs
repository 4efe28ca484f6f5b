//! Post row and DTOs.

use corpus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `posts` table.
///
/// `slug` always holds the canonical base identifier; timestamp-mode posts
/// additionally carry their date/time segments in `post_date` / `post_time`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PostRow {
    pub id: DbId,
    pub group_id: DbId,
    pub slug: String,
    pub post_date: Option<String>,
    pub post_time: Option<String>,
    pub status: String,
    pub primary_language: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for `posts`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub group_id: DbId,
    pub slug: String,
    pub post_date: Option<String>,
    pub post_time: Option<String>,
    pub status: String,
    pub primary_language: String,
    pub created_by: Option<String>,
}
