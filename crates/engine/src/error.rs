//! Engine error type wrapping the primary-path failure sources.

use corpus_core::CoreError;
use thiserror::Error;

/// Errors surfaced by the engine's primary read/write paths.
///
/// Synchronizer and Importer failures never appear here; they are converted
/// to logged outcomes and counters respectively.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("settings error: {0}")]
    Settings(String),
}

impl EngineError {
    /// Stable machine-readable error tag.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Core(e) => e.code(),
            Self::Db(_) => "db_error",
            Self::Settings(_) => "settings",
        }
    }
}
