//! Idempotent bulk copy of the file tree into the relational store.
//!
//! Upserts on the deterministic keys (group slug, post slug, version
//! number, content language) make re-runs update-only. Per-post and
//! per-version failures increment an error counter instead of aborting the
//! enclosing group or catalog; after a fully error-free catalog import the
//! global mode flag flips to `db`.

use corpus_core::groups::Group;
use corpus_core::paths::PostId;
use corpus_core::types::StoreMode;
use corpus_db::models::post::CreatePost;
use corpus_db::models::version::CreateVersion;
use corpus_db::repositories::{ContentRepo, GroupRepo, PostRepo, VersionRepo};
use corpus_events::{names, EventBus, StoreEvent};
use corpus_fs::FileStore;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::settings::{self, Settings};
use crate::sync::{create_content_from_front, MirrorContent};

/// Aggregate import counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub groups: u64,
    pub posts: u64,
    pub versions: u64,
    pub contents: u64,
    pub errors: u64,
}

impl ImportStats {
    fn merge(&mut self, other: ImportStats) {
        self.groups += other.groups;
        self.posts += other.posts;
        self.versions += other.versions;
        self.contents += other.contents;
        self.errors += other.errors;
    }
}

/// The FileStore → RelationalStore bulk importer.
pub struct Importer<'a> {
    store: &'a FileStore,
    pool: &'a SqlitePool,
    bus: &'a EventBus,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a FileStore, pool: &'a SqlitePool, bus: &'a EventBus) -> Self {
        Self { store, pool, bus }
    }

    /// Import one group. Per-post failures are counted, never raised.
    pub async fn import_group(&self, group: &Group) -> ImportStats {
        let mut stats = ImportStats::default();

        let group_row = match GroupRepo::upsert(self.pool, group).await {
            Ok(row) => row,
            Err(error) => {
                warn!(group = %group.slug, %error, "group import failed");
                stats.errors += 1;
                return stats;
            }
        };
        stats.groups += 1;

        let ids = match self.store.post_ids(group) {
            Ok(ids) => ids,
            Err(error) => {
                warn!(group = %group.slug, %error, "group scan failed");
                stats.errors += 1;
                return stats;
            }
        };

        for id in &ids {
            match self.import_post(group, group_row.id, id).await {
                Ok(post_stats) => stats.merge(post_stats),
                Err(error) => {
                    warn!(group = %group.slug, id = %id.base_id(), %error, "post import failed");
                    stats.errors += 1;
                }
            }
        }

        self.bus.publish(
            StoreEvent::new(names::IMPORT_PROGRESS)
                .in_group(&group.slug)
                .with_payload(progress_payload(&stats)),
        );
        stats
    }

    /// Import one group looked up by slug.
    pub async fn import_group_by_slug(&self, groups: &[Group], slug: &str) -> ImportStats {
        match corpus_core::groups::find_group(groups, slug) {
            Some(group) => self.import_group(group).await,
            None => {
                warn!(group = slug, "unknown group, nothing imported");
                ImportStats {
                    errors: 1,
                    ..Default::default()
                }
            }
        }
    }

    /// Import the whole catalog. Flips the mode flag to `db` only after a
    /// fully error-free run.
    pub async fn import_all(
        &self,
        groups: &[Group],
        settings: &dyn Settings,
    ) -> Result<ImportStats, EngineError> {
        self.bus.publish(StoreEvent::new(names::IMPORT_STARTED));

        let mut stats = ImportStats::default();
        for group in groups {
            stats.merge(self.import_group(group).await);
        }

        if stats.errors == 0 {
            settings::store_mode(settings, StoreMode::Db)?;
            info!(
                posts = stats.posts,
                contents = stats.contents,
                "catalog imported, mode switched to db"
            );
        } else {
            warn!(errors = stats.errors, "catalog imported with errors, mode unchanged");
        }

        self.bus
            .publish(StoreEvent::new(names::IMPORT_COMPLETED).with_payload(progress_payload(&stats)));
        Ok(stats)
    }

    /// One post with all its versions and languages. Per-version failures
    /// are counted inside; row-level failures bubble to the per-post catch.
    async fn import_post(
        &self,
        group: &Group,
        group_id: i64,
        id: &PostId,
    ) -> Result<ImportStats, EngineError> {
        let mut stats = ImportStats::default();

        let versions = self.store.version_list(group, id)?;
        // A legacy post imports its flat layout as version 1.
        let version_keys: Vec<(i64, Option<i64>)> = if versions.is_empty() {
            vec![(1, None)]
        } else {
            versions.iter().map(|v| (*v, Some(*v))).collect()
        };

        let summary = self.store.summarize_post(group, id)?;
        let (post_date, post_time) = match id {
            PostId::Slug(_) => (None, None),
            PostId::Stamp { date, time } => (Some(date.clone()), Some(time.clone())),
        };
        let post = PostRepo::upsert(
            self.pool,
            &CreatePost {
                group_id,
                slug: id.base_id(),
                post_date,
                post_time,
                status: summary.status.as_str().to_string(),
                primary_language: group.language.clone(),
                created_by: None,
            },
        )
        .await?;
        stats.posts += 1;

        for (number, fs_version) in version_keys {
            match self.import_version(group, id, post.id, number, fs_version).await {
                Ok((versions, contents)) => {
                    stats.versions += versions;
                    stats.contents += contents;
                }
                Err(error) => {
                    warn!(
                        group = %group.slug,
                        id = %id.base_id(),
                        version = number,
                        %error,
                        "version import failed"
                    );
                    stats.errors += 1;
                }
            }
        }
        Ok(stats)
    }

    async fn import_version(
        &self,
        group: &Group,
        id: &PostId,
        post_id: i64,
        number: i64,
        fs_version: Option<i64>,
    ) -> Result<(u64, u64), EngineError> {
        let languages = self.store.language_list(group, id, fs_version)?;

        // Read all files first; the version's status follows the primary
        // language, else the first.
        let mut files = Vec::with_capacity(languages.len());
        for language in &languages {
            files.push((
                language.clone(),
                self.store.read_post(group, id, Some(language), fs_version)?,
            ));
        }
        let status = files
            .iter()
            .find(|(l, _)| *l == group.language)
            .or_else(|| files.first())
            .map(|(_, c)| c.file.front.status)
            .unwrap_or_default();

        let version_row = VersionRepo::upsert(
            self.pool,
            &CreateVersion {
                post_id,
                version_number: number,
                status: status.as_str().to_string(),
                created_from_version: files
                    .first()
                    .and_then(|(_, c)| c.file.front.created_from_version),
            },
        )
        .await?;

        let mut contents = 0;
        for (language, content) in &files {
            let mirror = MirrorContent {
                language,
                title: &content.title,
                body: &content.file.body,
                front: &content.file.front,
            };
            ContentRepo::upsert(self.pool, &create_content_from_front(version_row.id, &mirror))
                .await?;
            contents += 1;
        }
        Ok((1, contents))
    }
}

fn progress_payload(stats: &ImportStats) -> serde_json::Value {
    serde_json::json!({
        "groups": stats.groups,
        "posts": stats.posts,
        "versions": stats.versions,
        "contents": stats.contents,
        "errors": stats.errors,
    })
}
