//! The facade: mode-flag routing over the two store backends.
//!
//! Every public operation reads the persisted mode flag and routes to the
//! file store (plus listing cache and best-effort mirror) or the relational
//! store. The facade owns the shared identifier parsing, the cache
//! regeneration decision, and the canonical publish sequence: store publish,
//! post-level status, cache regeneration, then change events.

use std::sync::Arc;

use corpus_core::error::CoreError;
use corpus_core::frontmatter::{ContentFile, FrontMatter};
use corpus_core::groups::{self, Group};
use corpus_core::naming;
use corpus_core::paths::{self, PostId};
use corpus_core::title;
use corpus_core::types::{ContentStatus, GroupMode, StoreMode};
use corpus_db::models::content::{ContentRow, CreateContent, UpdateContent};
use corpus_db::models::group::GroupRow;
use corpus_db::models::post::{CreatePost, PostRow};
use corpus_db::models::version::{CreateVersion, VersionRow};
use corpus_db::repositories::{ContentRepo, GroupRepo, PostRepo, VersionRepo};
use corpus_events::{names, EventBus, StoreEvent};
use corpus_fs::{
    CreatePostInput, CreatedPost, FileStore, LanguageSummary, PostContent, PostSummary,
    UpdateOutcome, UpdatePostInput,
};
use sqlx::SqlitePool;
use tracing::info;

use crate::cache::{ListingCache, RegenOutcome};
use crate::error::EngineError;
use crate::import::{Importer, ImportStats};
use crate::settings::{self, Settings};
use crate::sync::{MirrorContent, Synchronizer};

/// The content store engine.
pub struct ContentEngine {
    store: FileStore,
    pool: SqlitePool,
    settings: Arc<dyn Settings>,
    cache: ListingCache,
    sync: Synchronizer,
    bus: Arc<EventBus>,
}

impl ContentEngine {
    pub fn new(
        store: FileStore,
        pool: SqlitePool,
        settings: Arc<dyn Settings>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            sync: Synchronizer::new(pool.clone()),
            store,
            pool,
            settings,
            cache: ListingCache::new(),
            bus,
        }
    }

    /// The authoritative backend for the current call.
    pub fn mode(&self) -> StoreMode {
        settings::load_mode(self.settings.as_ref())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// The configured group list, ordered by position.
    pub fn groups(&self) -> Vec<Group> {
        settings::load_groups(self.settings.as_ref())
    }

    /// Look up a configured group.
    pub fn group(&self, slug: &str) -> Result<Group, EngineError> {
        let groups = self.groups();
        groups::find_group(&groups, slug)
            .cloned()
            .ok_or_else(|| CoreError::GroupNotFound(slug.to_string()).into())
    }

    /// Create a group: validate, persist to the settings blob, mirror
    /// best-effort, event.
    pub async fn create_group(&self, group: Group) -> Result<(), EngineError> {
        let mut list = self.groups();
        let slug = group.slug.clone();
        groups::insert_group(&mut list, group.clone()).map_err(EngineError::from)?;
        settings::store_groups(self.settings.as_ref(), &list)?;
        self.sync.sync_group_saved(&group).await;
        self.bus
            .publish(StoreEvent::new(names::GROUP_CREATED).in_group(slug));
        Ok(())
    }

    /// Update a group in place. The mode is immutable.
    pub async fn update_group(&self, slug: &str, updated: Group) -> Result<(), EngineError> {
        let mut list = self.groups();
        groups::update_group(&mut list, slug, updated.clone()).map_err(EngineError::from)?;
        settings::store_groups(self.settings.as_ref(), &list)?;
        self.sync.sync_group_saved(&updated).await;
        self.bus
            .publish(StoreEvent::new(names::GROUP_UPDATED).in_group(slug));
        Ok(())
    }

    /// Remove a group from the configuration and drop its cache entry.
    pub async fn delete_group(&self, slug: &str) -> Result<Group, EngineError> {
        let mut list = self.groups();
        let removed = groups::remove_group(&mut list, slug).map_err(EngineError::from)?;
        settings::store_groups(self.settings.as_ref(), &list)?;
        self.cache.invalidate(slug);
        self.bus.publish(
            StoreEvent::new(names::CACHE_OPERATION)
                .in_group(slug)
                .with_payload(serde_json::json!({ "op": "invalidate" })),
        );
        self.sync.sync_group_deleted(slug).await;
        self.bus
            .publish(StoreEvent::new(names::GROUP_DELETED).in_group(slug));
        Ok(removed)
    }

    /// Reorder the group list; positions follow the given slug order.
    /// Slugs not named keep their relative order after the named ones.
    pub async fn reorder_groups(&self, order: &[String]) -> Result<(), EngineError> {
        let mut list = self.groups();
        let unnamed_base = order.len() as i64;
        for group in list.iter_mut() {
            group.position = match order.iter().position(|s| *s == group.slug) {
                Some(pos) => pos as i64,
                None => unnamed_base + group.position,
            };
        }
        groups::sort_by_position(&mut list);
        settings::store_groups(self.settings.as_ref(), &list)?;
        for group in &list {
            self.sync.sync_group_saved(group).await;
        }
        self.bus.publish(StoreEvent::new(names::GROUP_UPDATED));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Posts
    // -----------------------------------------------------------------------

    /// Create a post with version 1 and one primary-language content.
    pub async fn create_post(
        &self,
        group_slug: &str,
        input: &CreatePostInput,
    ) -> Result<CreatedPost, EngineError> {
        let group = self.group(group_slug)?;
        let created = match self.mode() {
            StoreMode::Filesystem => {
                let created = self.store.create_post(&group, input)?;
                let content = self
                    .store
                    .read_post(&group, &created.id, Some(&created.language), None)?;
                self.sync
                    .sync_post_created(
                        &group,
                        &created.id,
                        created.version,
                        &mirror(&content.language, &content),
                    )
                    .await;
                self.regenerate_cache(&group);
                created
            }
            StoreMode::Db => self.db_create_post(&group, input).await?,
        };
        self.bus.publish(
            StoreEvent::new(names::POST_CREATED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": created.base_id })),
        );
        Ok(created)
    }

    /// Read a post through a free-form identifier (`slug`, `slug/vN/lang.md`,
    /// `date/time[/vN/lang.md]`).
    pub async fn read_post(
        &self,
        group_slug: &str,
        identifier: &str,
    ) -> Result<PostContent, EngineError> {
        let group = self.group(group_slug)?;
        let (id, version, language) = self.locate(&group, identifier)?;
        match self.mode() {
            StoreMode::Filesystem => Ok(self
                .store
                .read_post(&group, &id, language.as_deref(), version)?),
            StoreMode::Db => self.db_read_post(&group, &id, language.as_deref(), version).await,
        }
    }

    /// Update a post's content.
    pub async fn update_post(
        &self,
        group_slug: &str,
        identifier: &str,
        input: &UpdatePostInput,
    ) -> Result<UpdateOutcome, EngineError> {
        let group = self.group(group_slug)?;
        let (id, version, language) = self.locate(&group, identifier)?;
        let language = language.unwrap_or_else(|| group.language.clone());

        let outcome = match self.mode() {
            StoreMode::Filesystem => {
                let has_version_info = !self.store.version_list(&group, &id)?.is_empty();
                let outcome = self.store.update_post(&group, &id, &language, version, input)?;

                if outcome.slug_changed {
                    self.sync
                        .sync_slug_changed(&group, &id, &outcome.id.base_id())
                        .await;
                }
                let content = self
                    .store
                    .read_post(&group, &outcome.id, Some(&language), version)?;
                self.sync
                    .sync_content_saved(&group, &outcome.id, content.version, &mirror(&language, &content))
                    .await;
                if outcome.status_changed && language == group.language {
                    self.sync
                        .sync_status_changed(&group, &outcome.id, content.file.front.status)
                        .await;
                }

                // Status-only edits that leave a legacy post unpublished
                // are a cache no-op.
                let new_status = if input.status.is_some() {
                    Some(content.file.front.status)
                } else {
                    None
                };
                if input.body.is_some()
                    || outcome.slug_changed
                    || ListingCache::should_regenerate(
                        StoreMode::Filesystem,
                        has_version_info,
                        new_status,
                    )
                {
                    self.regenerate_cache(&group);
                }
                outcome
            }
            StoreMode::Db => self.db_update_post(&group, &id, &language, version, input).await?,
        };

        self.bus.publish(
            StoreEvent::new(names::POST_UPDATED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": outcome.id.base_id() })),
        );
        if outcome.status_changed {
            self.bus.publish(
                StoreEvent::new(names::POST_STATUS_CHANGED)
                    .in_group(group_slug)
                    .with_payload(serde_json::json!({ "id": outcome.id.base_id() })),
            );
        }
        Ok(outcome)
    }

    /// Delete a post: archive on soft delete, remove on hard delete.
    pub async fn delete_post(
        &self,
        group_slug: &str,
        identifier: &str,
        hard: bool,
    ) -> Result<(), EngineError> {
        let group = self.group(group_slug)?;
        let (id, _, _) = self.locate(&group, identifier)?;
        match self.mode() {
            StoreMode::Filesystem => {
                self.store.delete_post(&group, &id, hard)?;
                self.sync.sync_post_deleted(&group, &id, hard).await;
                self.regenerate_cache(&group);
            }
            StoreMode::Db => {
                let (_, post) = self.db_post(&group, &id).await?;
                if hard {
                    PostRepo::delete(&self.pool, post.id).await?;
                } else {
                    PostRepo::update_status(
                        &self.pool,
                        post.id,
                        ContentStatus::Archived.as_str(),
                        None,
                    )
                    .await?;
                }
            }
        }
        self.bus.publish(
            StoreEvent::new(names::POST_DELETED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": id.base_id(), "hard": hard })),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Languages
    // -----------------------------------------------------------------------

    /// Add a new draft translation to a version.
    pub async fn add_language(
        &self,
        group_slug: &str,
        identifier: &str,
        language: &str,
    ) -> Result<(), EngineError> {
        let group = self.group(group_slug)?;
        let (id, version, _) = self.locate(&group, identifier)?;
        match self.mode() {
            StoreMode::Filesystem => {
                self.store.add_language(&group, &id, version, language)?;
                let content = self.store.read_post(&group, &id, Some(language), version)?;
                self.sync
                    .sync_content_saved(&group, &id, content.version, &mirror(language, &content))
                    .await;
                self.regenerate_cache(&group);
            }
            StoreMode::Db => {
                let (_, post) = self.db_post(&group, &id).await?;
                let version_row = self.db_version(&post, version).await?;
                if ContentRepo::find_by_version_and_language(&self.pool, version_row.id, language)
                    .await?
                    .is_some()
                {
                    return Err(CoreError::AlreadyExists(language.to_string()).into());
                }
                ContentRepo::create(
                    &self.pool,
                    &CreateContent {
                        version_id: version_row.id,
                        language: language.to_string(),
                        title: String::new(),
                        body: String::new(),
                        status: ContentStatus::Draft.as_str().to_string(),
                        custom_slug: None,
                        metadata: None,
                    },
                )
                .await?;
            }
        }
        self.bus.publish(
            StoreEvent::new(names::TRANSLATION_CREATED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": id.base_id(), "language": language })),
        );
        Ok(())
    }

    /// Archive a translation; refused for the last active language.
    pub async fn delete_language(
        &self,
        group_slug: &str,
        identifier: &str,
        language: &str,
    ) -> Result<(), EngineError> {
        let group = self.group(group_slug)?;
        let (id, version, _) = self.locate(&group, identifier)?;
        match self.mode() {
            StoreMode::Filesystem => {
                self.store.delete_language(&group, &id, version, language)?;
                self.sync
                    .sync_language_deleted(&group, &id, version, language)
                    .await;
                self.regenerate_cache(&group);
            }
            StoreMode::Db => {
                let (_, post) = self.db_post(&group, &id).await?;
                let version_row = self.db_version(&post, version).await?;
                let Some(content) =
                    ContentRepo::find_by_version_and_language(&self.pool, version_row.id, language)
                        .await?
                else {
                    return Err(CoreError::NotFound(language.to_string()).into());
                };
                if ContentRepo::count_active(&self.pool, version_row.id).await? < 2 {
                    return Err(CoreError::LastLanguage.into());
                }
                ContentRepo::set_status(&self.pool, content.id, ContentStatus::Archived.as_str())
                    .await?;
            }
        }
        self.bus.publish(
            StoreEvent::new(names::TRANSLATION_DELETED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": id.base_id(), "language": language })),
        );
        Ok(())
    }

    /// Change a post's primary language.
    pub async fn set_primary_language(
        &self,
        group_slug: &str,
        identifier: &str,
        language: &str,
    ) -> Result<(), EngineError> {
        let group = self.group(group_slug)?;
        let (id, _, _) = self.locate(&group, identifier)?;
        match self.mode() {
            StoreMode::Filesystem => {
                // The file layout carries no primary marker; only the
                // mirror is updated.
                self.sync
                    .sync_primary_language_changed(&group, &id, language)
                    .await;
            }
            StoreMode::Db => {
                let (_, post) = self.db_post(&group, &id).await?;
                PostRepo::set_primary_language(&self.pool, post.id, language).await?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Versions
    // -----------------------------------------------------------------------

    /// Branch a new version, optionally from a source version.
    pub async fn create_version(
        &self,
        group_slug: &str,
        identifier: &str,
        source: Option<i64>,
    ) -> Result<i64, EngineError> {
        let group = self.group(group_slug)?;
        let (id, _, _) = self.locate(&group, identifier)?;
        let version = match self.mode() {
            StoreMode::Filesystem => {
                let version = self.store.create_version_from(&group, &id, source)?;
                let languages = self.store.language_list(&group, &id, Some(version))?;
                let mut contents = Vec::with_capacity(languages.len());
                for language in &languages {
                    contents.push(self.store.read_post(&group, &id, Some(language), Some(version))?);
                }
                let mirrors: Vec<MirrorContent<'_>> = languages
                    .iter()
                    .zip(&contents)
                    .map(|(language, content)| mirror(language, content))
                    .collect();
                self.sync
                    .sync_version_created(&group, &id, version, source, &mirrors)
                    .await;
                self.regenerate_cache(&group);
                version
            }
            StoreMode::Db => {
                let (_, post) = self.db_post(&group, &id).await?;
                match source {
                    Some(source) => {
                        let row = VersionRepo::clone_from(&self.pool, post.id, source)
                            .await
                            .map_err(|e| match e {
                                sqlx::Error::RowNotFound => {
                                    EngineError::from(CoreError::SourceNotFound(source))
                                }
                                other => EngineError::from(other),
                            })?;
                        row.version_number
                    }
                    None => {
                        let next = VersionRepo::max_version_number(&self.pool, post.id).await? + 1;
                        let row = VersionRepo::create(
                            &self.pool,
                            &CreateVersion {
                                post_id: post.id,
                                version_number: next,
                                status: ContentStatus::Draft.as_str().to_string(),
                                created_from_version: None,
                            },
                        )
                        .await?;
                        ContentRepo::create(
                            &self.pool,
                            &CreateContent {
                                version_id: row.id,
                                language: post.primary_language.clone(),
                                title: String::new(),
                                body: String::new(),
                                status: ContentStatus::Draft.as_str().to_string(),
                                custom_slug: None,
                                metadata: None,
                            },
                        )
                        .await?;
                        next
                    }
                }
            }
        };
        self.bus.publish(
            StoreEvent::new(names::VERSION_CREATED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": id.base_id(), "version": version })),
        );
        Ok(version)
    }

    /// Publish a version: exactly one version ends up `published`, the
    /// previously live one is archived. The canonical sequence is store
    /// publish, post-level status, cache regeneration, events.
    pub async fn publish_version(
        &self,
        group_slug: &str,
        identifier: &str,
        target: i64,
    ) -> Result<(), EngineError> {
        let group = self.group(group_slug)?;
        let (id, _, _) = self.locate(&group, identifier)?;
        match self.mode() {
            StoreMode::Filesystem => {
                self.store.publish_version(&group, &id, target)?;
                self.sync.sync_publish(&group, &id, target).await;
                self.regenerate_cache(&group);
            }
            StoreMode::Db => {
                let (_, post) = self.db_post(&group, &id).await?;
                self.db_version_number(&post, target).await?;
                VersionRepo::publish(&self.pool, post.id, target).await?;
                PostRepo::update_status(
                    &self.pool,
                    post.id,
                    ContentStatus::Published.as_str(),
                    None,
                )
                .await?;
            }
        }
        info!(group = group_slug, id = %id.base_id(), version = target, "version published");
        for name in [names::VERSION_PUBLISHED, names::VERSION_LIVE_CHANGED] {
            self.bus.publish(
                StoreEvent::new(name)
                    .in_group(group_slug)
                    .with_payload(serde_json::json!({ "id": id.base_id(), "version": target })),
            );
        }
        Ok(())
    }

    /// Archive a version; refused when live or last active.
    pub async fn delete_version(
        &self,
        group_slug: &str,
        identifier: &str,
        version: i64,
    ) -> Result<(), EngineError> {
        let group = self.group(group_slug)?;
        let (id, _, _) = self.locate(&group, identifier)?;
        match self.mode() {
            StoreMode::Filesystem => {
                self.store.delete_version(&group, &id, version)?;
                self.sync.sync_version_deleted(&group, &id, version).await;
                self.regenerate_cache(&group);
            }
            StoreMode::Db => {
                let (_, post) = self.db_post(&group, &id).await?;
                let target = self.db_version_number(&post, version).await?;
                if target.status == ContentStatus::Published.as_str() {
                    return Err(CoreError::CannotDeleteLive.into());
                }
                let versions = VersionRepo::list_by_post(&self.pool, post.id).await?;
                let active = versions
                    .iter()
                    .filter(|v| v.status != ContentStatus::Archived.as_str())
                    .count();
                if active < 2 {
                    return Err(CoreError::LastVersion.into());
                }
                VersionRepo::update_status(&self.pool, target.id, ContentStatus::Archived.as_str())
                    .await?;
            }
        }
        self.bus.publish(
            StoreEvent::new(names::VERSION_DELETED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": id.base_id(), "version": version })),
        );
        Ok(())
    }

    /// Migrate a legacy (non-versioned) post into the `v1/` layout and
    /// mirror the moved files.
    pub async fn migrate_legacy_post(
        &self,
        group_slug: &str,
        identifier: &str,
    ) -> Result<(), EngineError> {
        let group = self.group(group_slug)?;
        let (id, _, _) = self.locate(&group, identifier)?;
        self.store.migrate_legacy_post(&group, &id)?;
        for language in self.store.language_list(&group, &id, Some(1))? {
            let content = self.store.read_post(&group, &id, Some(&language), Some(1))?;
            self.sync
                .sync_content_saved(&group, &id, Some(1), &mirror(&language, &content))
                .await;
            self.bus.publish(
                StoreEvent::new(names::MIGRATION_PROGRESS)
                    .in_group(group_slug)
                    .with_payload(
                        serde_json::json!({ "id": id.base_id(), "language": language }),
                    ),
            );
        }
        self.regenerate_cache(&group);
        self.bus.publish(
            StoreEvent::new(names::MIGRATION_COMPLETED)
                .in_group(group_slug)
                .with_payload(serde_json::json!({ "id": id.base_id() })),
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// List a group's posts.
    ///
    /// Filesystem mode reads through the cache; a coalesced miss (another
    /// regeneration already running) falls back to one direct scan rather
    /// than waiting. Db mode reads rows directly.
    pub async fn list_posts(&self, group_slug: &str) -> Result<Vec<PostSummary>, EngineError> {
        let group = self.group(group_slug)?;
        match self.mode() {
            StoreMode::Filesystem => {
                if let Some(listing) = self.cache.read(&group.slug) {
                    return Ok(listing);
                }
                match self.cache.regenerate_if_not_in_progress(&group, &self.store)? {
                    RegenOutcome::Regenerated => {
                        Ok(self.cache.read(&group.slug).unwrap_or_default())
                    }
                    RegenOutcome::InProgress => Ok(self.store.list_posts(&group)?),
                }
            }
            StoreMode::Db => self.db_list_posts(&group).await,
        }
    }

    /// Resolve a public URL slug against the relational rows: content-level
    /// custom slug first, then the post slug, then the previous-slugs
    /// redirect scan. Returns the canonical base id.
    pub async fn resolve_public_slug(
        &self,
        group_slug: &str,
        slug: &str,
    ) -> Result<Option<String>, EngineError> {
        let group = self.group(group_slug)?;
        let group_row = self.db_group(&group).await?;

        if let Some(content) =
            ContentRepo::find_by_custom_slug(&self.pool, group_row.id, slug).await?
        {
            return self.post_slug_of(content.version_id).await;
        }
        if PostRepo::find_by_group_and_slug(&self.pool, group_row.id, slug)
            .await?
            .is_some()
        {
            return Ok(Some(slug.to_string()));
        }
        if let Some(content) =
            ContentRepo::find_by_previous_slug(&self.pool, group_row.id, slug).await?
        {
            return self.post_slug_of(content.version_id).await;
        }
        Ok(None)
    }

    async fn post_slug_of(&self, version_id: i64) -> Result<Option<String>, EngineError> {
        let Some(version) = VersionRepo::find_by_id(&self.pool, version_id).await? else {
            return Ok(None);
        };
        Ok(PostRepo::find_by_id(&self.pool, version.post_id)
            .await?
            .map(|p| p.slug))
    }

    /// Run the bulk importer for one group.
    pub async fn import_group(&self, group_slug: &str) -> Result<ImportStats, EngineError> {
        let group = self.group(group_slug)?;
        let importer = Importer::new(&self.store, &self.pool, &self.bus);
        Ok(importer.import_group(&group).await)
    }

    /// Run the bulk importer for the whole catalog; flips the mode flag on
    /// an error-free run.
    pub async fn import_all(&self) -> Result<ImportStats, EngineError> {
        let groups = self.groups();
        let importer = Importer::new(&self.store, &self.pool, &self.bus);
        importer.import_all(&groups, self.settings.as_ref()).await
    }

    // -----------------------------------------------------------------------
    // Shared routing helpers
    // -----------------------------------------------------------------------

    /// Parse a free-form identifier against a group's mode.
    fn locate(
        &self,
        group: &Group,
        identifier: &str,
    ) -> Result<(PostId, Option<i64>, Option<String>), EngineError> {
        let parsed = paths::parse_identifier(identifier);
        let id = PostId::from_base_id(group.mode, &parsed.base_id)
            .ok_or_else(|| CoreError::PostNotFound(parsed.base_id.clone()))?;
        Ok((id, parsed.version, parsed.language))
    }

    /// Regenerate a group's cache and announce the change. A coalesced
    /// in-progress outcome is left alone; a failed scan only logs.
    fn regenerate_cache(&self, group: &Group) {
        match self.cache.regenerate_if_not_in_progress(group, &self.store) {
            Ok(RegenOutcome::Regenerated) => {
                self.bus
                    .publish(StoreEvent::new(names::CACHE_CHANGED).in_group(&group.slug));
            }
            Ok(RegenOutcome::InProgress) => {}
            Err(error) => {
                tracing::warn!(group = %group.slug, %error, "cache regeneration failed");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Db-mode implementations
    // -----------------------------------------------------------------------

    async fn db_group(&self, group: &Group) -> Result<GroupRow, EngineError> {
        GroupRepo::find_by_slug(&self.pool, &group.slug)
            .await?
            .ok_or_else(|| CoreError::GroupNotFound(group.slug.clone()).into())
    }

    async fn db_post(&self, group: &Group, id: &PostId) -> Result<(GroupRow, PostRow), EngineError> {
        let group_row = self.db_group(group).await?;
        let post = PostRepo::find_by_group_and_slug(&self.pool, group_row.id, &id.base_id())
            .await?
            .ok_or_else(|| EngineError::from(CoreError::PostNotFound(id.base_id())))?;
        Ok((group_row, post))
    }

    /// Resolve an optional version number to its row, defaulting to the
    /// latest.
    async fn db_version(
        &self,
        post: &PostRow,
        version: Option<i64>,
    ) -> Result<VersionRow, EngineError> {
        let number = match version {
            Some(v) => v,
            None => VersionRepo::max_version_number(&self.pool, post.id).await?,
        };
        self.db_version_number(post, number).await
    }

    async fn db_version_number(
        &self,
        post: &PostRow,
        number: i64,
    ) -> Result<VersionRow, EngineError> {
        VersionRepo::find_by_post_and_number(&self.pool, post.id, number)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::NotFound(format!("version {number}"))))
    }

    async fn db_create_post(
        &self,
        group: &Group,
        input: &CreatePostInput,
    ) -> Result<CreatedPost, EngineError> {
        let group_row = self.db_group(group).await?;
        let language = input
            .language
            .clone()
            .unwrap_or_else(|| group.language.clone());

        let id = match group.mode {
            GroupMode::Slug => {
                let mut base = naming::generate_slug(&input.title);
                if base.is_empty() {
                    base = "untitled".to_string();
                }
                let mut slug = base.clone();
                let mut n = 2u64;
                while PostRepo::find_by_group_and_slug(&self.pool, group_row.id, &slug)
                    .await?
                    .is_some()
                {
                    slug = format!("{base}-{n}");
                    n += 1;
                }
                PostId::Slug(slug)
            }
            GroupMode::Timestamp => {
                let now = chrono::Utc::now();
                PostId::Stamp {
                    date: now.format("%Y-%m-%d").to_string(),
                    time: now.format("%H:%M").to_string(),
                }
            }
        };

        let (post_date, post_time) = match &id {
            PostId::Slug(_) => (None, None),
            PostId::Stamp { date, time } => (Some(date.clone()), Some(time.clone())),
        };
        let post = PostRepo::create(
            &self.pool,
            &CreatePost {
                group_id: group_row.id,
                slug: id.base_id(),
                post_date,
                post_time,
                status: ContentStatus::Draft.as_str().to_string(),
                primary_language: language.clone(),
                created_by: input.created_by.clone(),
            },
        )
        .await?;
        let version = VersionRepo::create(
            &self.pool,
            &CreateVersion {
                post_id: post.id,
                version_number: 1,
                status: ContentStatus::Draft.as_str().to_string(),
                created_from_version: None,
            },
        )
        .await?;
        ContentRepo::create(
            &self.pool,
            &CreateContent {
                version_id: version.id,
                language: language.clone(),
                title: title::extract_title(&input.body),
                body: input.body.clone(),
                status: ContentStatus::Draft.as_str().to_string(),
                custom_slug: None,
                metadata: None,
            },
        )
        .await?;

        let path = paths::content_path(self.store.root(), &group.slug, &id, Some(1), &language);
        Ok(CreatedPost {
            base_id: id.base_id(),
            id,
            version: 1,
            language,
            path,
        })
    }

    async fn db_read_post(
        &self,
        group: &Group,
        id: &PostId,
        language: Option<&str>,
        version: Option<i64>,
    ) -> Result<PostContent, EngineError> {
        let (_, post) = self.db_post(group, id).await?;
        let version_row = self.db_version(&post, version).await?;
        let resolved =
            ContentRepo::resolve(&self.pool, version_row.id, language, &post.primary_language)
                .await?;

        match resolved {
            Some(row) => {
                let file = content_file_from_row(&post, &row);
                Ok(PostContent {
                    id: id.clone(),
                    version: Some(version_row.version_number),
                    language: row.language.clone(),
                    title: title::extract_title(&row.body),
                    file,
                    is_new_translation: false,
                })
            }
            None => Ok(PostContent {
                id: id.clone(),
                version: Some(version_row.version_number),
                language: language.unwrap_or(&post.primary_language).to_string(),
                file: ContentFile::default(),
                title: title::UNTITLED.to_string(),
                is_new_translation: true,
            }),
        }
    }

    async fn db_update_post(
        &self,
        group: &Group,
        id: &PostId,
        language: &str,
        version: Option<i64>,
        input: &UpdatePostInput,
    ) -> Result<UpdateOutcome, EngineError> {
        let (_, post) = self.db_post(group, id).await?;
        let version_row = self.db_version(&post, version).await?;
        let row = ContentRepo::find_by_version_and_language(&self.pool, version_row.id, language)
            .await?
            .ok_or_else(|| EngineError::from(CoreError::NotFound(language.to_string())))?;

        let previous_status =
            ContentStatus::from_str(&row.status).unwrap_or_default();
        // Patch only the description key; the blob also carries the
        // previous-slugs redirect array, which must survive the edit.
        let metadata = input.description.as_ref().map(|description| {
            let mut map = row
                .metadata_json()
                .and_then(|v| v.as_object().cloned())
                .unwrap_or_default();
            map.insert(
                "description".into(),
                serde_json::Value::String(description.clone()),
            );
            serde_json::Value::Object(map).to_string()
        });
        ContentRepo::update(
            &self.pool,
            row.id,
            &UpdateContent {
                title: input.body.as_deref().map(title::extract_title),
                body: input.body.clone(),
                status: input.status.map(|s| s.as_str().to_string()),
                custom_slug: input.custom_slug.clone(),
                metadata,
            },
        )
        .await?;

        let mut result_id = id.clone();
        let mut slug_changed = false;
        if let Some(new_slug) = &input.new_slug {
            if group.mode == GroupMode::Slug && *new_slug != id.base_id() {
                naming::validate_slug(new_slug)?;
                PostRepo::update_slug(&self.pool, post.id, new_slug).await?;
                result_id = PostId::Slug(new_slug.clone());
                slug_changed = true;
            }
        }

        let status_changed = input.status.is_some_and(|s| s != previous_status);
        if status_changed && language == post.primary_language {
            if let Some(status) = input.status {
                PostRepo::update_status(&self.pool, post.id, status.as_str(), None).await?;
            }
        }

        Ok(UpdateOutcome {
            id: result_id,
            slug_changed,
            status_changed,
        })
    }

    async fn db_list_posts(&self, group: &Group) -> Result<Vec<PostSummary>, EngineError> {
        let group_row = self.db_group(group).await?;
        let posts = PostRepo::list_by_group(&self.pool, group_row.id).await?;
        let mut summaries = Vec::with_capacity(posts.len());
        for post in posts {
            let latest = VersionRepo::max_version_number(&self.pool, post.id).await?;
            let mut languages = Vec::new();
            if latest > 0 {
                if let Some(version_row) =
                    VersionRepo::find_by_post_and_number(&self.pool, post.id, latest).await?
                {
                    for row in ContentRepo::list_by_version(&self.pool, version_row.id).await? {
                        languages.push(LanguageSummary {
                            language: row.language.clone(),
                            title: row.title.clone(),
                            excerpt: title::excerpt(&row.body),
                            status: ContentStatus::from_str(&row.status).unwrap_or_default(),
                            updated_at: Some(row.updated_at),
                        });
                    }
                }
            }
            summaries.push(PostSummary {
                base_id: post.slug.clone(),
                has_version_info: latest > 0,
                latest_version: (latest > 0).then_some(latest),
                status: ContentStatus::from_str(&post.status).unwrap_or_default(),
                languages,
            });
        }
        Ok(summaries)
    }
}

// ---------------------------------------------------------------------------
// Row/file adapters
// ---------------------------------------------------------------------------

fn mirror<'a>(language: &'a str, content: &'a PostContent) -> MirrorContent<'a> {
    MirrorContent {
        language,
        title: &content.title,
        body: &content.file.body,
        front: &content.file.front,
    }
}

/// Rebuild a frontmatter view from a relational row so both backends hand
/// callers the same shape.
fn content_file_from_row(post: &PostRow, row: &ContentRow) -> ContentFile {
    let metadata = row.metadata_json();
    ContentFile {
        front: FrontMatter {
            slug: post.slug.clone(),
            status: ContentStatus::from_str(&row.status).unwrap_or_default(),
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
            custom_slug: row.custom_slug.clone(),
            description: metadata
                .as_ref()
                .and_then(|m| m.get("description"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            previous_slugs: row.previous_slugs(),
            ..Default::default()
        },
        body: row.body.clone(),
    }
}
