//! Version branching, the cross-version publish walk, version deletion,
//! and legacy-layout migration.
//!
//! Multi-file operations here are sequences of independent writes with no
//! cross-file atomicity. The publish walk recomputes the correct end state
//! from each file's current status, so re-running it after a partial
//! failure converges.

use std::fs;
use std::io;

use chrono::Utc;
use corpus_core::error::CoreError;
use corpus_core::frontmatter::{self, ContentFile, FrontMatter};
use corpus_core::groups::Group;
use corpus_core::paths::{self, PostId};
use corpus_core::types::ContentStatus;
use tracing::debug;

use crate::store::{ensure_dir, write_file, FileStore};

impl FileStore {
    /// Branch a new version of a post.
    ///
    /// With a source version, every language file is copied into the new
    /// version directory with status reset to draft and provenance recorded.
    /// Without one, a single empty primary-language draft is created. The
    /// new number is the on-disk maximum plus one, allocated through a
    /// mkdir-retry loop that tolerates directory-creation races.
    pub fn create_version_from(
        &self,
        group: &Group,
        id: &PostId,
        source: Option<i64>,
    ) -> Result<i64, CoreError> {
        let post_dir = self.require_post_dir(group, id)?;

        if let Some(source) = source {
            if !post_dir.join(paths::version_dir_name(source)).is_dir() {
                return Err(CoreError::SourceNotFound(source));
            }
        }

        // Allocate the next number. A concurrent branch may take the same
        // number first; mkdir failing with AlreadyExists re-scans and
        // retries with the new maximum.
        let (new_version, new_dir) = loop {
            let next = self.version_numbers(&post_dir)?.last().copied().unwrap_or(0) + 1;
            let dir = post_dir.join(paths::version_dir_name(next));
            match fs::create_dir(&dir) {
                Ok(()) => break (next, dir),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(CoreError::MkdirFailed {
                        path: dir.display().to_string(),
                        source,
                    })
                }
            }
        };

        let now = Utc::now();
        match source {
            Some(source_version) => {
                let source_dir = post_dir.join(paths::version_dir_name(source_version));
                for language in self.languages_in(&source_dir)? {
                    let mut file =
                        self.parse_file(&source_dir.join(paths::content_file_name(&language)))?;
                    file.front.status = ContentStatus::Draft;
                    file.front.published_at = None;
                    file.front.version = Some(new_version);
                    file.front.created_from_version = Some(source_version);
                    file.front.updated_at = Some(now);
                    write_file(
                        &new_dir.join(paths::content_file_name(&language)),
                        &frontmatter::serialize(&file),
                    )?;
                }
            }
            None => {
                let file = ContentFile {
                    front: FrontMatter {
                        slug: id.base_id(),
                        status: ContentStatus::Draft,
                        created_at: Some(now),
                        updated_at: Some(now),
                        version: Some(new_version),
                        ..Default::default()
                    },
                    body: String::new(),
                };
                write_file(
                    &new_dir.join(paths::content_file_name(&group.language)),
                    &frontmatter::serialize(&file),
                )?;
            }
        }

        debug!(
            group = %group.slug,
            id = %id.base_id(),
            version = new_version,
            from = ?source,
            "version branched"
        );
        Ok(new_version)
    }

    /// Cross-version publish walk.
    ///
    /// For every language file of every version: the target version becomes
    /// `published`, any file currently `published` elsewhere becomes
    /// `archived`, everything else is untouched. Sequential per-file
    /// rewrites; idempotent.
    pub fn publish_version(
        &self,
        group: &Group,
        id: &PostId,
        target: i64,
    ) -> Result<(), CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        if !post_dir.join(paths::version_dir_name(target)).is_dir() {
            return Err(CoreError::NotFound(format!("version {target}")));
        }

        let now = Utc::now();
        for version in self.version_numbers(&post_dir)? {
            let dir = post_dir.join(paths::version_dir_name(version));
            for language in self.languages_in(&dir)? {
                let path = dir.join(paths::content_file_name(&language));
                let mut file = self.parse_file(&path)?;
                let new_status = if version == target {
                    ContentStatus::Published
                } else if file.front.status == ContentStatus::Published {
                    ContentStatus::Archived
                } else {
                    continue;
                };
                if file.front.status == new_status {
                    continue;
                }
                file.front.status = new_status;
                if new_status == ContentStatus::Published {
                    file.front.published_at = Some(now);
                }
                file.front.updated_at = Some(now);
                write_file(&path, &frontmatter::serialize(&file))?;
            }
        }
        debug!(group = %group.slug, id = %id.base_id(), version = target, "version published");
        Ok(())
    }

    /// Archive a version.
    ///
    /// Refused when the version is live (`cannot_delete_live`) or is the
    /// only remaining non-archived version (`last_version`).
    pub fn delete_version(
        &self,
        group: &Group,
        id: &PostId,
        version: i64,
    ) -> Result<(), CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        let dir = post_dir.join(paths::version_dir_name(version));
        if !dir.is_dir() {
            return Err(CoreError::NotFound(format!("version {version}")));
        }

        if self.version_status(group, &post_dir, version)? == ContentStatus::Published {
            return Err(CoreError::CannotDeleteLive);
        }

        let mut active = 0;
        for v in self.version_numbers(&post_dir)? {
            if self.version_status(group, &post_dir, v)? != ContentStatus::Archived {
                active += 1;
            }
        }
        if active < 2 {
            return Err(CoreError::LastVersion);
        }

        for language in self.languages_in(&dir)? {
            let path = dir.join(paths::content_file_name(&language));
            let mut file = self.parse_file(&path)?;
            file.front.status = ContentStatus::Archived;
            file.front.updated_at = Some(Utc::now());
            write_file(&path, &frontmatter::serialize(&file))?;
        }
        Ok(())
    }

    /// Migrate a legacy (non-versioned) post directory into the `v1/`
    /// layout: every language file moves into a new `v1` subdirectory with
    /// version bookkeeping stamped, content untouched. A post with no
    /// legacy files is a no-op.
    pub fn migrate_legacy_post(&self, group: &Group, id: &PostId) -> Result<(), CoreError> {
        let post_dir = self.require_post_dir(group, id)?;
        let legacy = self.languages_in(&post_dir)?;
        if legacy.is_empty() {
            return Ok(());
        }

        let v1_dir = post_dir.join(paths::version_dir_name(1));
        ensure_dir(&v1_dir)?;
        for language in legacy {
            let old_path = post_dir.join(paths::content_file_name(&language));
            let mut file = self.parse_file(&old_path)?;
            file.front.version = Some(1);
            write_file(
                &v1_dir.join(paths::content_file_name(&language)),
                &frontmatter::serialize(&file),
            )?;
            fs::remove_file(&old_path).map_err(|source| CoreError::WriteFailed {
                path: old_path.display().to_string(),
                source,
            })?;
        }
        debug!(group = %group.slug, id = %id.base_id(), "legacy post migrated");
        Ok(())
    }

    /// A version's status: the primary-language file's, else the first
    /// file's, else archived for an empty directory.
    fn version_status(
        &self,
        group: &Group,
        post_dir: &std::path::Path,
        version: i64,
    ) -> Result<ContentStatus, CoreError> {
        let dir = post_dir.join(paths::version_dir_name(version));
        let languages = self.languages_in(&dir)?;
        let pick = languages
            .iter()
            .find(|l| **l == group.language)
            .or_else(|| languages.first());
        match pick {
            Some(language) => {
                let file = self.parse_file(&dir.join(paths::content_file_name(language)))?;
                Ok(file.front.status)
            }
            None => Ok(ContentStatus::Archived),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CreatePostInput, UpdatePostInput};
    use corpus_core::types::GroupMode;
    use tempfile::TempDir;

    fn slug_group() -> Group {
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

    fn setup() -> (TempDir, FileStore, Group, PostId) {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let group = slug_group();
        let created = store
            .create_post(
                &group,
                &CreatePostInput {
                    title: "Hello World".into(),
                    body: "# Hello World\n\nBody.".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        (tmp, store, group, created.id)
    }

    fn status_of(store: &FileStore, group: &Group, id: &PostId, v: i64, lang: &str) -> ContentStatus {
        store
            .read_post(group, id, Some(lang), Some(v))
            .unwrap()
            .file
            .front
            .status
    }

    // -- branching ------------------------------------------------------------

    #[test]
    fn branch_from_source_copies_languages_as_draft() {
        let (_tmp, store, group, id) = setup();
        store.add_language(&group, &id, None, "de").unwrap();
        store.publish_version(&group, &id, 1).unwrap();

        let v2 = store.create_version_from(&group, &id, Some(1)).unwrap();
        assert_eq!(v2, 2);

        for lang in ["en", "de"] {
            let content = store.read_post(&group, &id, Some(lang), Some(2)).unwrap();
            assert_eq!(content.file.front.status, ContentStatus::Draft);
            assert_eq!(content.file.front.version, Some(2));
            assert_eq!(content.file.front.created_from_version, Some(1));
            assert_eq!(content.file.front.published_at, None);
        }
        // The source is untouched.
        assert_eq!(status_of(&store, &group, &id, 1, "en"), ContentStatus::Published);
    }

    #[test]
    fn branch_without_source_creates_empty_primary_draft() {
        let (_tmp, store, group, id) = setup();
        let v2 = store.create_version_from(&group, &id, None).unwrap();
        let content = store.read_post(&group, &id, None, Some(v2)).unwrap();
        assert!(content.file.body.is_empty());
        assert_eq!(content.language, "en");
        assert_eq!(content.file.front.created_from_version, None);
    }

    #[test]
    fn branch_from_missing_source_fails() {
        let (_tmp, store, group, id) = setup();
        let err = store.create_version_from(&group, &id, Some(9)).unwrap_err();
        assert_eq!(err.code(), "source_not_found");
    }

    #[test]
    fn version_numbers_increase_from_max() {
        let (_tmp, store, group, id) = setup();
        assert_eq!(store.create_version_from(&group, &id, Some(1)).unwrap(), 2);
        assert_eq!(store.create_version_from(&group, &id, Some(2)).unwrap(), 3);
    }

    // -- publish --------------------------------------------------------------

    #[test]
    fn publish_archives_previously_live_version() {
        let (_tmp, store, group, id) = setup();
        store.publish_version(&group, &id, 1).unwrap();
        store.create_version_from(&group, &id, Some(1)).unwrap();

        store.publish_version(&group, &id, 2).unwrap();
        assert_eq!(status_of(&store, &group, &id, 1, "en"), ContentStatus::Archived);
        assert_eq!(status_of(&store, &group, &id, 2, "en"), ContentStatus::Published);
    }

    #[test]
    fn publish_leaves_drafts_untouched() {
        let (_tmp, store, group, id) = setup();
        store.create_version_from(&group, &id, Some(1)).unwrap();
        store.create_version_from(&group, &id, Some(1)).unwrap();

        store.publish_version(&group, &id, 2).unwrap();
        assert_eq!(status_of(&store, &group, &id, 1, "en"), ContentStatus::Draft);
        assert_eq!(status_of(&store, &group, &id, 3, "en"), ContentStatus::Draft);
    }

    #[test]
    fn publish_is_idempotent() {
        let (_tmp, store, group, id) = setup();
        store.create_version_from(&group, &id, Some(1)).unwrap();
        store.publish_version(&group, &id, 2).unwrap();
        store.publish_version(&group, &id, 2).unwrap();

        assert_eq!(status_of(&store, &group, &id, 2, "en"), ContentStatus::Published);
        let summaries = store.list_posts(&group).unwrap();
        assert_eq!(summaries[0].status, ContentStatus::Published);
    }

    #[test]
    fn at_most_one_published_version() {
        let (_tmp, store, group, id) = setup();
        for _ in 0..3 {
            store.create_version_from(&group, &id, Some(1)).unwrap();
        }
        store.publish_version(&group, &id, 2).unwrap();
        store.publish_version(&group, &id, 4).unwrap();
        store.publish_version(&group, &id, 3).unwrap();

        let post_dir = store.require_post_dir(&group, &id).unwrap();
        let published: Vec<i64> = store
            .version_numbers(&post_dir)
            .unwrap()
            .into_iter()
            .filter(|v| status_of(&store, &group, &id, *v, "en") == ContentStatus::Published)
            .collect();
        assert_eq!(published, vec![3]);
    }

    // -- deletion -------------------------------------------------------------

    #[test]
    fn delete_live_version_is_refused() {
        let (_tmp, store, group, id) = setup();
        store.create_version_from(&group, &id, Some(1)).unwrap();
        store.publish_version(&group, &id, 1).unwrap();

        let err = store.delete_version(&group, &id, 1).unwrap_err();
        assert_eq!(err.code(), "cannot_delete_live");
    }

    #[test]
    fn delete_last_active_version_is_refused() {
        let (_tmp, store, group, id) = setup();
        let err = store.delete_version(&group, &id, 1).unwrap_err();
        assert_eq!(err.code(), "last_version");
    }

    #[test]
    fn delete_version_archives_its_files() {
        let (_tmp, store, group, id) = setup();
        store.create_version_from(&group, &id, Some(1)).unwrap();

        store.delete_version(&group, &id, 1).unwrap();
        assert_eq!(status_of(&store, &group, &id, 1, "en"), ContentStatus::Archived);
        // The directory still exists; nothing is physically removed.
        let post_dir = store.require_post_dir(&group, &id).unwrap();
        assert_eq!(store.version_numbers(&post_dir).unwrap(), vec![1, 2]);
    }

    // -- legacy migration -----------------------------------------------------

    #[test]
    fn migrate_legacy_post_moves_files_into_v1() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        let group = slug_group();

        // Hand-build a legacy post: language files directly in the post dir.
        let post_dir = tmp.path().join("blog/old-post");
        std::fs::create_dir_all(&post_dir).unwrap();
        for lang in ["en", "de"] {
            std::fs::write(
                post_dir.join(format!("{lang}.md")),
                "---\nslug: old-post\nstatus: published\npublished_at:\n---\n\n# Old\nBody",
            )
            .unwrap();
        }

        let id = PostId::Slug("old-post".into());
        store.migrate_legacy_post(&group, &id).unwrap();

        assert!(!post_dir.join("en.md").exists());
        for lang in ["en", "de"] {
            let content = store.read_post(&group, &id, Some(lang), Some(1)).unwrap();
            assert_eq!(content.file.front.version, Some(1));
            assert_eq!(content.file.front.status, ContentStatus::Published);
            assert_eq!(content.file.body, "# Old\nBody");
        }
    }

    #[test]
    fn migrate_already_versioned_post_is_a_noop() {
        let (_tmp, store, group, id) = setup();
        store.migrate_legacy_post(&group, &id).unwrap();
        let post_dir = store.require_post_dir(&group, &id).unwrap();
        assert_eq!(store.version_numbers(&post_dir).unwrap(), vec![1]);
    }

    // -- update after publish (scenario) --------------------------------------

    #[test]
    fn publish_then_edit_keeps_live_status() {
        let (_tmp, store, group, id) = setup();
        store.publish_version(&group, &id, 1).unwrap();
        store
            .update_post(
                &group,
                &id,
                "en",
                None,
                &UpdatePostInput {
                    body: Some("# Hello World\n\nEdited live.".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(status_of(&store, &group, &id, 1, "en"), ContentStatus::Published);
    }
}
