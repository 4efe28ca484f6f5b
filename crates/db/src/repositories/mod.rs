//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&SqlitePool` as the first argument.

pub mod content_repo;
pub mod group_repo;
pub mod post_repo;
pub mod version_repo;

pub use content_repo::ContentRepo;
pub use group_repo::GroupRepo;
pub use post_repo::PostRepo;
pub use version_repo::VersionRepo;
