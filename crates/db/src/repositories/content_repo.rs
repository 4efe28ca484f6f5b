//! Repository for the `contents` table.
//!
//! Read-side language resolution uses the same three-step fallback as the
//! file backend (exact match, post primary language, first available row)
//! so callers see uniform behavior regardless of backend.

use chrono::Utc;
use corpus_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::content::{ContentRow, CreateContent, UpdateContent};

/// Column list for contents queries.
const COLUMNS: &str =
    "id, version_id, language, title, body, status, custom_slug, metadata, created_at, updated_at";

/// Qualified column list for joined lookups.
const QUALIFIED_COLUMNS: &str =
    "c.id, c.version_id, c.language, c.title, c.body, c.status, c.custom_slug, c.metadata, \
     c.created_at, c.updated_at";

/// Provides CRUD, language resolution, and URL lookups for content rows.
pub struct ContentRepo;

impl ContentRepo {
    /// Create a content row. Fails on a `(version_id, language)` collision.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateContent,
    ) -> Result<ContentRow, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO contents (version_id, language, title, body, status, custom_slug, \
                                   metadata, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(input.version_id)
            .bind(&input.language)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.status)
            .bind(&input.custom_slug)
            .bind(&input.metadata)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Insert or update on the deterministic `(version_id, language)` key.
    pub async fn upsert(
        pool: &SqlitePool,
        input: &CreateContent,
    ) -> Result<ContentRow, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO contents (version_id, language, title, body, status, custom_slug, \
                                   metadata, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(version_id, language) DO UPDATE SET \
                title = excluded.title, \
                body = excluded.body, \
                status = excluded.status, \
                custom_slug = excluded.custom_slug, \
                metadata = excluded.metadata, \
                updated_at = excluded.updated_at \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(input.version_id)
            .bind(&input.language)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.status)
            .bind(&input.custom_slug)
            .bind(&input.metadata)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a specific language of a version.
    pub async fn find_by_version_and_language(
        pool: &SqlitePool,
        version_id: DbId,
        language: &str,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contents WHERE version_id = ? AND language = ?");
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(version_id)
            .bind(language)
            .fetch_optional(pool)
            .await
    }

    /// List all contents of a version in insertion order.
    pub async fn list_by_version(
        pool: &SqlitePool,
        version_id: DbId,
    ) -> Result<Vec<ContentRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM contents WHERE version_id = ? ORDER BY id");
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(version_id)
            .fetch_all(pool)
            .await
    }

    /// Resolve a content row using the three-step language fallback:
    /// exact requested language, then the post's primary language, then the
    /// first available row.
    pub async fn resolve(
        pool: &SqlitePool,
        version_id: DbId,
        language: Option<&str>,
        primary_language: &str,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        if let Some(lang) = language {
            if let Some(row) = Self::find_by_version_and_language(pool, version_id, lang).await? {
                return Ok(Some(row));
            }
        }
        if let Some(row) =
            Self::find_by_version_and_language(pool, version_id, primary_language).await?
        {
            return Ok(Some(row));
        }
        let query = format!("SELECT {COLUMNS} FROM contents WHERE version_id = ? ORDER BY id LIMIT 1");
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(version_id)
            .fetch_optional(pool)
            .await
    }

    /// Patch a content row; `None` fields are left unchanged.
    pub async fn update(
        pool: &SqlitePool,
        id: DbId,
        input: &UpdateContent,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET \
                title = COALESCE(?, title), \
                body = COALESCE(?, body), \
                status = COALESCE(?, status), \
                custom_slug = COALESCE(?, custom_slug), \
                metadata = COALESCE(?, metadata), \
                updated_at = ? \
             WHERE id = ? RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(&input.title)
            .bind(&input.body)
            .bind(&input.status)
            .bind(&input.custom_slug)
            .bind(&input.metadata)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set a content row's status.
    pub async fn set_status(
        pool: &SqlitePool,
        id: DbId,
        status: &str,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!(
            "UPDATE contents SET status = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Count a version's non-archived languages (the last-language guard).
    pub async fn count_active(
        pool: &SqlitePool,
        version_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM contents WHERE version_id = ? AND status != 'archived'",
        )
        .bind(version_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// URL lookup by content-level custom slug within a group.
    pub async fn find_by_custom_slug(
        pool: &SqlitePool,
        group_id: DbId,
        slug: &str,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM contents c \
             JOIN versions v ON v.id = c.version_id \
             JOIN posts p ON p.id = v.post_id \
             WHERE p.group_id = ? AND c.custom_slug = ? \
             ORDER BY c.id LIMIT 1"
        );
        sqlx::query_as::<_, ContentRow>(&query)
            .bind(group_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Redirect lookup through the `previous_slugs` metadata array.
    ///
    /// Candidates are narrowed with a LIKE scan over the JSON blob, then
    /// verified against the decoded array.
    pub async fn find_by_previous_slug(
        pool: &SqlitePool,
        group_id: DbId,
        slug: &str,
    ) -> Result<Option<ContentRow>, sqlx::Error> {
        let query = format!(
            "SELECT {QUALIFIED_COLUMNS} FROM contents c \
             JOIN versions v ON v.id = c.version_id \
             JOIN posts p ON p.id = v.post_id \
             WHERE p.group_id = ? AND c.metadata LIKE ? \
             ORDER BY c.id"
        );
        let pattern = format!("%\"{slug}\"%");
        let candidates: Vec<ContentRow> = sqlx::query_as(&query)
            .bind(group_id)
            .bind(pattern)
            .fetch_all(pool)
            .await?;
        Ok(candidates
            .into_iter()
            .find(|row| row.previous_slugs().iter().any(|s| s == slug)))
    }
}
