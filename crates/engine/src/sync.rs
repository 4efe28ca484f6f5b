//! Best-effort one-way mirror of file-store writes into the relational
//! store.
//!
//! Every mirror function returns a [`SyncOutcome`], never an error: the
//! primary write has already committed, and nothing here may roll it back
//! or block it. Database failures and internal skip signals (the target
//! group or post has no relational row yet) become warnings on the log
//! side channel.

use corpus_core::frontmatter::FrontMatter;
use corpus_core::groups::Group;
use corpus_core::paths::PostId;
use corpus_core::types::ContentStatus;
use corpus_db::models::content::CreateContent;
use corpus_db::models::post::{CreatePost, PostRow};
use corpus_db::models::version::CreateVersion;
use corpus_db::repositories::{ContentRepo, GroupRepo, PostRepo, VersionRepo};
use sqlx::SqlitePool;
use tracing::warn;

/// What a mirror call did. Only ever "success shaped".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The change was re-expressed against the relational store.
    Applied,
    /// The change was deliberately not applied (e.g. no relational row to
    /// apply it to). Logged, not an error.
    Skipped(String),
    /// The relational write failed. Logged, swallowed.
    Failed,
}

/// A language file's content as the mirror needs it.
#[derive(Debug, Clone)]
pub struct MirrorContent<'a> {
    pub language: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub front: &'a FrontMatter,
}

/// The one-way FileStore → RelationalStore mirror.
pub struct Synchronizer {
    pool: SqlitePool,
}

impl Synchronizer {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Mirror a group create or update.
    pub async fn sync_group_saved(&self, group: &Group) -> SyncOutcome {
        let result = GroupRepo::upsert(&self.pool, group).await.map(|_| SyncOutcome::Applied);
        self.finish("group_saved", result)
    }

    /// Mirror a group deletion (cascades through the mirrored rows).
    pub async fn sync_group_deleted(&self, slug: &str) -> SyncOutcome {
        let result = GroupRepo::delete(&self.pool, slug).await.map(|_| SyncOutcome::Applied);
        self.finish("group_deleted", result)
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// Mirror a post creation: post row, version row, and the initial
    /// content row.
    pub async fn sync_post_created(
        &self,
        group: &Group,
        id: &PostId,
        version: i64,
        content: &MirrorContent<'_>,
    ) -> SyncOutcome {
        let result = self.post_created(group, id, version, content).await;
        self.finish("post_created", result)
    }

    async fn post_created(
        &self,
        group: &Group,
        id: &PostId,
        version: i64,
        content: &MirrorContent<'_>,
    ) -> Result<SyncOutcome, sqlx::Error> {
        let Some(group_row) = GroupRepo::find_by_slug(&self.pool, &group.slug).await? else {
            return Ok(SyncOutcome::Skipped(format!(
                "group '{}' not mirrored",
                group.slug
            )));
        };
        let (post_date, post_time) = stamp_parts(id);
        let post = PostRepo::upsert(
            &self.pool,
            &CreatePost {
                group_id: group_row.id,
                slug: id.base_id(),
                post_date,
                post_time,
                status: content.front.status.as_str().to_string(),
                primary_language: group.language.clone(),
                created_by: content.front.created_by.clone(),
            },
        )
        .await?;
        let version_row = VersionRepo::upsert(
            &self.pool,
            &CreateVersion {
                post_id: post.id,
                version_number: version,
                status: content.front.status.as_str().to_string(),
                created_from_version: content.front.created_from_version,
            },
        )
        .await?;
        ContentRepo::upsert(&self.pool, &create_content_from_front(version_row.id, content)).await?;
        Ok(SyncOutcome::Applied)
    }

    /// Mirror a content save (post update or translation edit).
    pub async fn sync_content_saved(
        &self,
        group: &Group,
        id: &PostId,
        version: Option<i64>,
        content: &MirrorContent<'_>,
    ) -> SyncOutcome {
        let result = self.content_saved(group, id, version, content).await;
        self.finish("content_saved", result)
    }

    async fn content_saved(
        &self,
        group: &Group,
        id: &PostId,
        version: Option<i64>,
        content: &MirrorContent<'_>,
    ) -> Result<SyncOutcome, sqlx::Error> {
        let Some(post) = self.post_row(group, id).await? else {
            return Ok(skipped_post(id));
        };
        // Legacy (non-versioned) content mirrors as version 1.
        let number = version.unwrap_or(1);
        let version_row = VersionRepo::upsert(
            &self.pool,
            &CreateVersion {
                post_id: post.id,
                version_number: number,
                status: content.front.status.as_str().to_string(),
                created_from_version: content.front.created_from_version,
            },
        )
        .await?;
        ContentRepo::upsert(&self.pool, &create_content_from_front(version_row.id, content)).await?;
        Ok(SyncOutcome::Applied)
    }

    /// Mirror a slug rename.
    pub async fn sync_slug_changed(
        &self,
        group: &Group,
        old_id: &PostId,
        new_slug: &str,
    ) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, old_id).await? else {
                return Ok(skipped_post(old_id));
            };
            PostRepo::update_slug(&self.pool, post.id, new_slug).await?;
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("slug_changed", result)
    }

    /// Mirror a post-level status change.
    pub async fn sync_status_changed(
        &self,
        group: &Group,
        id: &PostId,
        status: ContentStatus,
    ) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, id).await? else {
                return Ok(skipped_post(id));
            };
            PostRepo::update_status(&self.pool, post.id, status.as_str(), None).await?;
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("status_changed", result)
    }

    /// Mirror a primary-language change.
    pub async fn sync_primary_language_changed(
        &self,
        group: &Group,
        id: &PostId,
        language: &str,
    ) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, id).await? else {
                return Ok(skipped_post(id));
            };
            PostRepo::set_primary_language(&self.pool, post.id, language).await?;
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("primary_language_changed", result)
    }

    /// Mirror a post deletion: archive on soft delete, remove rows on hard
    /// delete.
    pub async fn sync_post_deleted(&self, group: &Group, id: &PostId, hard: bool) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, id).await? else {
                return Ok(skipped_post(id));
            };
            if hard {
                PostRepo::delete(&self.pool, post.id).await?;
            } else {
                PostRepo::update_status(&self.pool, post.id, ContentStatus::Archived.as_str(), None)
                    .await?;
            }
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("post_deleted", result)
    }

    // -----------------------------------------------------------------------
    // Versions and languages
    // -----------------------------------------------------------------------

    /// Mirror a version branch with its cloned contents.
    pub async fn sync_version_created(
        &self,
        group: &Group,
        id: &PostId,
        version: i64,
        created_from: Option<i64>,
        contents: &[MirrorContent<'_>],
    ) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, id).await? else {
                return Ok(skipped_post(id));
            };
            let version_row = VersionRepo::upsert(
                &self.pool,
                &CreateVersion {
                    post_id: post.id,
                    version_number: version,
                    status: ContentStatus::Draft.as_str().to_string(),
                    created_from_version: created_from,
                },
            )
            .await?;
            for content in contents {
                ContentRepo::upsert(&self.pool, &create_content_from_front(version_row.id, content)).await?;
            }
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("version_created", result)
    }

    /// Mirror a version archive: the version row and every one of its
    /// content rows go to `archived`, matching the file store archiving
    /// every language file of the version.
    pub async fn sync_version_deleted(
        &self,
        group: &Group,
        id: &PostId,
        version: i64,
    ) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, id).await? else {
                return Ok(skipped_post(id));
            };
            let Some(version_row) =
                VersionRepo::find_by_post_and_number(&self.pool, post.id, version).await?
            else {
                return Ok(SyncOutcome::Skipped(format!("version {version} not mirrored")));
            };
            VersionRepo::update_status(&self.pool, version_row.id, ContentStatus::Archived.as_str())
                .await?;
            for content in ContentRepo::list_by_version(&self.pool, version_row.id).await? {
                ContentRepo::set_status(&self.pool, content.id, ContentStatus::Archived.as_str())
                    .await?;
            }
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("version_deleted", result)
    }

    /// Mirror a language archive.
    pub async fn sync_language_deleted(
        &self,
        group: &Group,
        id: &PostId,
        version: Option<i64>,
        language: &str,
    ) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, id).await? else {
                return Ok(skipped_post(id));
            };
            let number = version.unwrap_or(1);
            let Some(version_row) =
                VersionRepo::find_by_post_and_number(&self.pool, post.id, number).await?
            else {
                return Ok(SyncOutcome::Skipped(format!("version {number} not mirrored")));
            };
            let Some(content) =
                ContentRepo::find_by_version_and_language(&self.pool, version_row.id, language)
                    .await?
            else {
                return Ok(SyncOutcome::Skipped(format!(
                    "language '{language}' not mirrored"
                )));
            };
            ContentRepo::set_status(&self.pool, content.id, ContentStatus::Archived.as_str())
                .await?;
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("language_deleted", result)
    }

    /// Mirror the cross-version publish walk (per-row loop, matching the
    /// file store's per-file rewrite).
    pub async fn sync_publish(&self, group: &Group, id: &PostId, target: i64) -> SyncOutcome {
        let result = async {
            let Some(post) = self.post_row(group, id).await? else {
                return Ok(skipped_post(id));
            };
            VersionRepo::publish(&self.pool, post.id, target).await?;
            PostRepo::update_status(&self.pool, post.id, ContentStatus::Published.as_str(), None)
                .await?;
            Ok(SyncOutcome::Applied)
        }
        .await;
        self.finish("publish", result)
    }

    // -----------------------------------------------------------------------
    // Shared
    // -----------------------------------------------------------------------

    async fn post_row(&self, group: &Group, id: &PostId) -> Result<Option<PostRow>, sqlx::Error> {
        let Some(group_row) = GroupRepo::find_by_slug(&self.pool, &group.slug).await? else {
            return Ok(None);
        };
        PostRepo::find_by_group_and_slug(&self.pool, group_row.id, &id.base_id()).await
    }

    fn finish(&self, op: &str, result: Result<SyncOutcome, sqlx::Error>) -> SyncOutcome {
        match result {
            Ok(SyncOutcome::Skipped(reason)) => {
                warn!(op, %reason, "mirror write skipped");
                SyncOutcome::Skipped(reason)
            }
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(op, %error, "mirror write failed");
                SyncOutcome::Failed
            }
        }
    }
}

fn skipped_post(id: &PostId) -> SyncOutcome {
    SyncOutcome::Skipped(format!("post '{}' not mirrored", id.base_id()))
}

fn stamp_parts(id: &PostId) -> (Option<String>, Option<String>) {
    match id {
        PostId::Slug(_) => (None, None),
        PostId::Stamp { date, time } => (Some(date.clone()), Some(time.clone())),
    }
}

/// Build a content insert DTO from a mirror payload. Description and prior
/// slugs travel in the metadata blob.
pub(crate) fn create_content_from_front(
    version_id: i64,
    content: &MirrorContent<'_>,
) -> CreateContent {
    CreateContent {
        version_id,
        language: content.language.to_string(),
        title: content.title.to_string(),
        body: content.body.to_string(),
        status: content.front.status.as_str().to_string(),
        custom_slug: content.front.custom_slug.clone(),
        metadata: metadata_blob(content.front),
    }
}

fn metadata_blob(front: &FrontMatter) -> Option<String> {
    let mut map = serde_json::Map::new();
    if let Some(description) = &front.description {
        map.insert("description".into(), serde_json::Value::String(description.clone()));
    }
    if !front.previous_slugs.is_empty() {
        map.insert(
            "previous_slugs".into(),
            serde_json::Value::Array(
                front
                    .previous_slugs
                    .iter()
                    .map(|s| serde_json::Value::String(s.clone()))
                    .collect(),
            ),
        );
    }
    if map.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(map).to_string())
    }
}
