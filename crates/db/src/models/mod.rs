//! Row structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - Create/update DTOs for inserts and patches
//!
//! Status and mode columns are stored as their string form; use the
//! `corpus_core` enums' `from_str` at the edges.

pub mod content;
pub mod group;
pub mod post;
pub mod version;

pub use content::{ContentRow, CreateContent, UpdateContent};
pub use group::GroupRow;
pub use post::{CreatePost, PostRow};
pub use version::{CreateVersion, VersionRow};
