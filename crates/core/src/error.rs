//! The tagged error taxonomy shared across the store.
//!
//! Validation and state-invariant violations are returned to the caller for
//! direct user feedback; each variant carries a stable [`code`](CoreError::code)
//! string so callers can branch without matching on message text.

use thiserror::Error;

/// Errors produced by the content store's primary write/read paths.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("slug already exists: {0}")]
    SlugAlreadyExists(String),

    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("invalid content type: {0}")]
    InvalidType(String),

    /// A version must keep at least one non-archived language.
    #[error("cannot delete the last active language of a version")]
    LastLanguage,

    /// A post must keep at least one non-archived version.
    #[error("cannot delete the last active version of a post")]
    LastVersion,

    /// The currently published version cannot be deleted.
    #[error("cannot delete the live version")]
    CannotDeleteLive,

    /// The source version for a version branch does not exist.
    #[error("source version {0} not found")]
    SourceNotFound(i64),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("post not found: {0}")]
    PostNotFound(String),

    #[error("read failed at {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed at {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mkdir failed at {path}: {source}")]
    MkdirFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Validation(String),
}

impl CoreError {
    /// Stable machine-readable error tag.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::SlugAlreadyExists(_) => "slug_already_exists",
            Self::InvalidSlug(_) => "invalid_slug",
            Self::InvalidMode(_) => "invalid_mode",
            Self::InvalidType(_) => "invalid_type",
            Self::LastLanguage => "last_language",
            Self::LastVersion => "last_version",
            Self::CannotDeleteLive => "cannot_delete_live",
            Self::SourceNotFound(_) => "source_not_found",
            Self::GroupNotFound(_) => "group_not_found",
            Self::PostNotFound(_) => "post_not_found",
            Self::ReadFailed { .. } => "read_failed",
            Self::WriteFailed { .. } => "write_failed",
            Self::MkdirFailed { .. } => "mkdir_failed",
            Self::Validation(_) => "validation",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
