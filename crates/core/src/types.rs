//! Core type definitions shared across the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Database entity id.
pub type DbId = i64;

/// UTC timestamp used across the store.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

// ---------------------------------------------------------------------------
// ContentStatus
// ---------------------------------------------------------------------------

/// Lifecycle status shared by posts, versions, and contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl ContentStatus {
    pub const ALL: &'static [&'static str] = &["draft", "published", "archived"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GroupMode
// ---------------------------------------------------------------------------

/// How posts in a group are identified on disk. Fixed for the group's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    /// Posts are identified by a URL slug.
    Slug,
    /// Posts are identified by a `YYYY-MM-DD/HH:MM` pair.
    Timestamp,
}

impl GroupMode {
    pub const ALL: &'static [&'static str] = &["slug", "timestamp"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Timestamp => "timestamp",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "slug" => Some(Self::Slug),
            "timestamp" => Some(Self::Timestamp),
            _ => None,
        }
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StoreMode
// ---------------------------------------------------------------------------

/// Which backend is authoritative for the whole store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    #[default]
    Filesystem,
    Db,
}

impl StoreMode {
    pub const ALL: &'static [&'static str] = &["filesystem", "db"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filesystem => "filesystem",
            Self::Db => "db",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "filesystem" => Some(Self::Filesystem),
            "db" => Some(Self::Db),
            _ => None,
        }
    }
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
