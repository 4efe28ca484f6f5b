//! File-backed content store.
//!
//! Posts live as directory trees of frontmatter files (see the core path
//! codec for the layouts). All methods are synchronous blocking I/O; the
//! store is the source of truth while the global mode flag is `filesystem`.

pub mod store;
pub mod types;
pub mod versioning;

pub use store::FileStore;
pub use types::{
    CreatePostInput, CreatedPost, LanguageSummary, PostContent, PostSummary, UpdateOutcome,
    UpdatePostInput,
};
