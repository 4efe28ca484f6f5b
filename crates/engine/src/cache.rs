//! Per-group listing cache with coalesced regeneration.
//!
//! Entries are disposable projections (post + latest version + per-language
//! excerpt metadata, never full bodies) regenerable from the file store at
//! any time. Values are read by clone from the shared map.
//!
//! Regeneration is coalesced per group through an in-progress marker. The
//! contains-check and the marker insert are separate lock acquisitions, so
//! two near-simultaneous misses can both start regenerating; the duplicate
//! scan is tolerated and the second write simply overwrites the first.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use corpus_core::error::CoreError;
use corpus_core::groups::Group;
use corpus_core::types::{ContentStatus, StoreMode};
use corpus_fs::{FileStore, PostSummary};
use tracing::debug;

use crate::settings::lock;

/// What a regeneration attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenOutcome {
    /// This caller performed the regeneration; the cache is now populated.
    Regenerated,
    /// Another regeneration for the group was already running; the caller
    /// should fall back to a direct store scan for this one request.
    InProgress,
}

/// The listing cache service. One instance per engine, injected into
/// callers; never reached through ambient state.
#[derive(Debug, Default)]
pub struct ListingCache {
    entries: Mutex<HashMap<String, Vec<PostSummary>>>,
    in_progress: Mutex<HashSet<String>>,
}

impl ListingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached listing of a group, cloned out. `None` on a miss.
    pub fn read(&self, group_slug: &str) -> Option<Vec<PostSummary>> {
        lock(&self.entries).get(group_slug).cloned()
    }

    /// Drop a group's entry.
    pub fn invalidate(&self, group_slug: &str) {
        lock(&self.entries).remove(group_slug);
    }

    /// Regenerate a group's entry from a direct store scan, unless another
    /// regeneration for the same group is already running.
    pub fn regenerate_if_not_in_progress(
        &self,
        group: &Group,
        store: &FileStore,
    ) -> Result<RegenOutcome, CoreError> {
        if lock(&self.in_progress).contains(&group.slug) {
            debug!(group = %group.slug, "cache regeneration already in progress");
            return Ok(RegenOutcome::InProgress);
        }
        lock(&self.in_progress).insert(group.slug.clone());

        let result = store.list_posts(group);
        lock(&self.in_progress).remove(&group.slug);

        let summaries = result?;
        debug!(group = %group.slug, posts = summaries.len(), "cache regenerated");
        lock(&self.entries).insert(group.slug.clone(), summaries);
        Ok(RegenOutcome::Regenerated)
    }

    /// Whether a write warrants regenerating the group's cache.
    ///
    /// Everything regenerates except a status-only edit that leaves a
    /// legacy (non-versioned) post unpublished: listings key on published
    /// state, and such an edit cannot change what a listing shows.
    pub fn should_regenerate(
        mode: StoreMode,
        has_version_info: bool,
        new_status: Option<ContentStatus>,
    ) -> bool {
        match (mode, has_version_info, new_status) {
            (StoreMode::Filesystem, false, Some(status)) => status == ContentStatus::Published,
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_core::types::GroupMode;
    use corpus_fs::CreatePostInput;
    use tempfile::TempDir;

    fn blog() -> Group {
        Group {
            slug: "blog".into(),
            name: "Blog".into(),
            mode: GroupMode::Slug,
            content_type: "posts".into(),
            item_name: "post".into(),
            item_name_plural: "posts".into(),
            language: "en".into(),
            position: 0,
        }
    }

    fn seeded_store() -> (TempDir, FileStore) {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        store
            .create_post(
                &blog(),
                &CreatePostInput {
                    title: "Hello World".into(),
                    body: "# Hello World\n\nBody.".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        (tmp, store)
    }

    // -- read / regenerate ----------------------------------------------------

    #[test]
    fn miss_then_regenerate_then_hit() {
        let (_tmp, store) = seeded_store();
        let cache = ListingCache::new();
        let group = blog();

        assert!(cache.read("blog").is_none());
        assert_eq!(
            cache.regenerate_if_not_in_progress(&group, &store).unwrap(),
            RegenOutcome::Regenerated
        );
        let listing = cache.read("blog").unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].base_id, "hello-world");
    }

    #[test]
    fn invalidate_drops_entry() {
        let (_tmp, store) = seeded_store();
        let cache = ListingCache::new();
        cache.regenerate_if_not_in_progress(&blog(), &store).unwrap();

        cache.invalidate("blog");
        assert!(cache.read("blog").is_none());
    }

    #[test]
    fn concurrent_miss_observes_in_progress() {
        let (_tmp, store) = seeded_store();
        let cache = ListingCache::new();
        let group = blog();

        // Simulate another caller mid-regeneration.
        super::lock(&cache.in_progress).insert("blog".into());
        assert_eq!(
            cache.regenerate_if_not_in_progress(&group, &store).unwrap(),
            RegenOutcome::InProgress
        );
        assert!(cache.read("blog").is_none());

        super::lock(&cache.in_progress).remove("blog");
        assert_eq!(
            cache.regenerate_if_not_in_progress(&group, &store).unwrap(),
            RegenOutcome::Regenerated
        );
    }

    #[test]
    fn marker_is_cleared_when_the_scan_fails() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let cache = ListingCache::new();

        // Force a scan failure: the group path exists but is a plain file.
        std::fs::write(tmp.path().join("broken"), "x").unwrap();
        let mut group = blog();
        group.slug = "broken".into();

        assert!(cache.regenerate_if_not_in_progress(&group, &store).is_err());
        assert!(!super::lock(&cache.in_progress).contains("broken"));
    }

    // -- decision table -------------------------------------------------------

    #[test]
    fn status_only_edit_of_unpublished_legacy_post_skips() {
        assert!(!ListingCache::should_regenerate(
            StoreMode::Filesystem,
            false,
            Some(ContentStatus::Draft)
        ));
        assert!(!ListingCache::should_regenerate(
            StoreMode::Filesystem,
            false,
            Some(ContentStatus::Archived)
        ));
    }

    #[test]
    fn everything_else_regenerates() {
        assert!(ListingCache::should_regenerate(
            StoreMode::Filesystem,
            false,
            Some(ContentStatus::Published)
        ));
        assert!(ListingCache::should_regenerate(
            StoreMode::Filesystem,
            true,
            Some(ContentStatus::Draft)
        ));
        assert!(ListingCache::should_regenerate(StoreMode::Filesystem, false, None));
        assert!(ListingCache::should_regenerate(
            StoreMode::Db,
            false,
            Some(ContentStatus::Draft)
        ));
    }
}
