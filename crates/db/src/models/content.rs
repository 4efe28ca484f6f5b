//! Content row and DTOs.

use corpus_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `contents` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentRow {
    pub id: DbId,
    pub version_id: DbId,
    pub language: String,
    pub title: String,
    pub body: String,
    pub status: String,
    pub custom_slug: Option<String>,
    /// Free-form JSON blob: description, SEO fields, `previous_slugs`.
    pub metadata: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ContentRow {
    /// Decode the metadata blob, if present and valid JSON.
    pub fn metadata_json(&self) -> Option<serde_json::Value> {
        self.metadata
            .as_deref()
            .and_then(|m| serde_json::from_str(m).ok())
    }

    /// The prior URL slugs recorded in metadata for redirect resolution.
    pub fn previous_slugs(&self) -> Vec<String> {
        self.metadata_json()
            .and_then(|m| {
                m.get("previous_slugs").map(|v| {
                    v.as_array()
                        .map(|arr| {
                            arr.iter()
                                .filter_map(|s| s.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default()
                })
            })
            .unwrap_or_default()
    }
}

/// Insert DTO for `contents`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContent {
    pub version_id: DbId,
    pub language: String,
    pub title: String,
    pub body: String,
    pub status: String,
    pub custom_slug: Option<String>,
    pub metadata: Option<String>,
}

/// Patch DTO for `contents`; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateContent {
    pub title: Option<String>,
    pub body: Option<String>,
    pub status: Option<String>,
    pub custom_slug: Option<String>,
    pub metadata: Option<String>,
}
