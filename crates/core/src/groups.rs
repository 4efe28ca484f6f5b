//! Group configuration entities and ordered-list operations.
//!
//! Groups are configuration-list entities, not store rows: the full list is
//! persisted as a settings blob, ordered by position. The relational
//! `groups` table only mirrors this list for foreign-key anchoring.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::naming;
use crate::types::GroupMode;

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

pub const CONTENT_TYPE_POSTS: &str = "posts";
pub const CONTENT_TYPE_PAGES: &str = "pages";

/// All valid content-type labels.
pub const VALID_CONTENT_TYPES: &[&str] = &[CONTENT_TYPE_POSTS, CONTENT_TYPE_PAGES];

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// A named content collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier; also the top-level directory name.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Naming mode, fixed for the group's lifetime.
    pub mode: GroupMode,
    /// Content-type label (see [`VALID_CONTENT_TYPES`]).
    pub content_type: String,
    /// Item naming, singular (e.g. "article").
    pub item_name: String,
    /// Item naming, plural (e.g. "articles").
    pub item_name_plural: String,
    /// The group's configured content language. Used when an identifier
    /// omits a language and as the primary language of new posts.
    pub language: String,
    /// Ordering position in the group list.
    pub position: i64,
}

/// Parse a mode string into a [`GroupMode`].
pub fn parse_mode(s: &str) -> Result<GroupMode, CoreError> {
    GroupMode::from_str(s).ok_or_else(|| {
        CoreError::InvalidMode(format!(
            "'{s}' is not a valid mode. Must be one of: {}",
            GroupMode::ALL.join(", ")
        ))
    })
}

/// Validate a group's slug, content type, and language.
///
/// Group slugs must not collide with known language codes: the path codec
/// could not otherwise tell a group segment from a content file stem.
pub fn validate_group(group: &Group) -> Result<(), CoreError> {
    naming::validate_slug(&group.slug)?;
    if naming::is_language_code(&group.slug) {
        return Err(CoreError::InvalidSlug(format!(
            "'{}' is a reserved language code",
            group.slug
        )));
    }
    if !VALID_CONTENT_TYPES.contains(&group.content_type.as_str()) {
        return Err(CoreError::InvalidType(format!(
            "'{}' is not a valid content type. Must be one of: {}",
            group.content_type,
            VALID_CONTENT_TYPES.join(", ")
        )));
    }
    if group.language.is_empty() {
        return Err(CoreError::Validation(
            "group language must not be empty".into(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// List operations
// ---------------------------------------------------------------------------

/// Find a group by slug.
pub fn find_group<'a>(groups: &'a [Group], slug: &str) -> Option<&'a Group> {
    groups.iter().find(|g| g.slug == slug)
}

/// Insert a validated group into the ordered list.
pub fn insert_group(groups: &mut Vec<Group>, group: Group) -> Result<(), CoreError> {
    validate_group(&group)?;
    if find_group(groups, &group.slug).is_some() {
        return Err(CoreError::SlugAlreadyExists(group.slug));
    }
    groups.push(group);
    sort_by_position(groups);
    Ok(())
}

/// Replace a group in place. The mode is fixed for the group's lifetime and
/// cannot be changed here.
pub fn update_group(groups: &mut [Group], slug: &str, updated: Group) -> Result<(), CoreError> {
    validate_group(&updated)?;
    let existing = groups
        .iter_mut()
        .find(|g| g.slug == slug)
        .ok_or_else(|| CoreError::GroupNotFound(slug.to_string()))?;
    if updated.mode != existing.mode {
        return Err(CoreError::InvalidMode(
            "a group's mode is fixed for its lifetime".into(),
        ));
    }
    *existing = updated;
    sort_by_position(groups);
    Ok(())
}

/// Remove a group from the list, returning it.
pub fn remove_group(groups: &mut Vec<Group>, slug: &str) -> Result<Group, CoreError> {
    let idx = groups
        .iter()
        .position(|g| g.slug == slug)
        .ok_or_else(|| CoreError::GroupNotFound(slug.to_string()))?;
    Ok(groups.remove(idx))
}

/// Stable sort by position.
pub fn sort_by_position(groups: &mut [Group]) {
    groups.sort_by_key(|g| g.position);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
