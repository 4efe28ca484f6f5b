//! Corpus core: pure logic shared by every backend of the content store.
//!
//! This crate has no I/O. It carries the shared type and error taxonomy,
//! the path codec (directory layouts and identifier parsing), the content
//! codec (frontmatter parse/serialize and title extraction), slug
//! generation, and the group configuration entities.

pub mod error;
pub mod frontmatter;
pub mod groups;
pub mod naming;
pub mod paths;
pub mod title;
pub mod types;

pub use error::CoreError;
pub use types::{ContentStatus, DbId, GroupMode, StoreMode, Timestamp};
