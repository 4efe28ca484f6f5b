//! Group mirror row.
//!
//! Groups are authoritative in the settings blob; these rows exist only to
//! anchor the post hierarchy's foreign keys and are kept in step by the
//! synchronizer and importer.

use corpus_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `groups` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupRow {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub mode: String,
    pub content_type: String,
    pub item_name: String,
    pub item_name_plural: String,
    pub language: String,
    pub position: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
