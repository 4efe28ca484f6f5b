//! Input and output types of the file store.

use std::path::PathBuf;

use corpus_core::frontmatter::ContentFile;
use corpus_core::paths::PostId;
use corpus_core::types::{ContentStatus, Timestamp};
use serde::Serialize;

/// Parameters for creating a post.
#[derive(Debug, Clone, Default)]
pub struct CreatePostInput {
    pub title: String,
    pub body: String,
    /// Content language; defaults to the group's configured language.
    pub language: Option<String>,
    pub created_by: Option<String>,
    pub created_by_email: Option<String>,
}

/// Result of creating a post.
#[derive(Debug, Clone)]
pub struct CreatedPost {
    pub id: PostId,
    /// `slug` or `date/time`.
    pub base_id: String,
    pub version: i64,
    pub language: String,
    pub path: PathBuf,
}

/// A resolved post content read.
#[derive(Debug, Clone)]
pub struct PostContent {
    pub id: PostId,
    /// `None` addresses the legacy non-versioned layout.
    pub version: Option<i64>,
    pub language: String,
    pub file: ContentFile,
    /// Display title derived from the body.
    pub title: String,
    /// Set when the requested language file did not exist yet: the content
    /// is an empty placeholder for a translation about to be written.
    pub is_new_translation: bool,
}

/// Parameters for updating a post's content file. `None` fields are left
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostInput {
    pub body: Option<String>,
    pub status: Option<ContentStatus>,
    /// Slug-mode only: relocate the post tree under a new slug.
    pub new_slug: Option<String>,
    pub custom_slug: Option<String>,
    pub description: Option<String>,
    pub updated_by: Option<String>,
    pub updated_by_email: Option<String>,
}

/// Result of a post update.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    /// The post's identity after the update (relocated on slug change).
    pub id: PostId,
    pub slug_changed: bool,
    pub status_changed: bool,
}

/// Per-language listing metadata. Excerpt only, never the full body: these
/// are the values cached and read by copy.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageSummary {
    pub language: String,
    pub title: String,
    pub excerpt: String,
    pub status: ContentStatus,
    pub updated_at: Option<Timestamp>,
}

/// Lightweight listing projection of a post.
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub base_id: String,
    /// Whether the post uses the versioned layout.
    pub has_version_info: bool,
    pub latest_version: Option<i64>,
    pub status: ContentStatus,
    pub languages: Vec<LanguageSummary>,
}
