//! Repository for the `versions` table.
//!
//! Version cloning is all-or-nothing: the version row and every content row
//! clone commit in one transaction or not at all. The cross-version publish
//! walk is deliberately a plain per-row loop with no transaction, mirroring
//! the file backend's sequential per-file rewrite; re-running it recomputes
//! the correct end state from each row's current status.

use chrono::Utc;
use corpus_core::types::DbId;
use corpus_core::ContentStatus;
use sqlx::SqlitePool;

use crate::models::version::{CreateVersion, VersionRow};

/// Column list for versions queries.
const COLUMNS: &str =
    "id, post_id, version_number, status, created_from_version, created_at, updated_at";

/// Column list for contents queries (used by the clone transaction).
const CONTENT_COLUMNS: &str =
    "id, version_id, language, title, body, status, custom_slug, metadata, created_at, updated_at";

/// Provides CRUD, cloning, and the publish walk for version rows.
pub struct VersionRepo;

impl VersionRepo {
    /// Create a version row. Fails on a `(post_id, version_number)` collision.
    pub async fn create(
        pool: &SqlitePool,
        input: &CreateVersion,
    ) -> Result<VersionRow, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO versions (post_id, version_number, status, created_from_version, \
                                   created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(input.post_id)
            .bind(input.version_number)
            .bind(&input.status)
            .bind(input.created_from_version)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Insert or update on the deterministic `(post_id, version_number)` key.
    pub async fn upsert(
        pool: &SqlitePool,
        input: &CreateVersion,
    ) -> Result<VersionRow, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO versions (post_id, version_number, status, created_from_version, \
                                   created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(post_id, version_number) DO UPDATE SET \
                status = excluded.status, \
                created_from_version = excluded.created_from_version, \
                updated_at = excluded.updated_at \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(input.post_id)
            .bind(input.version_number)
            .bind(&input.status)
            .bind(input.created_from_version)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a specific version of a post.
    pub async fn find_by_id(
        pool: &SqlitePool,
        id: DbId,
    ) -> Result<Option<VersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM versions WHERE id = ?");
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_post_and_number(
        pool: &SqlitePool,
        post_id: DbId,
        version_number: i64,
    ) -> Result<Option<VersionRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM versions WHERE post_id = ? AND version_number = ?");
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(post_id)
            .bind(version_number)
            .fetch_optional(pool)
            .await
    }

    /// List all versions of a post, ascending.
    pub async fn list_by_post(
        pool: &SqlitePool,
        post_id: DbId,
    ) -> Result<Vec<VersionRow>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM versions WHERE post_id = ? ORDER BY version_number");
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(post_id)
            .fetch_all(pool)
            .await
    }

    /// The highest version number of a post (0 if none exist).
    pub async fn max_version_number(
        pool: &SqlitePool,
        post_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT COALESCE(MAX(version_number), 0) FROM versions WHERE post_id = ?")
                .bind(post_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(v,)| v).unwrap_or(0))
    }

    /// Set a version's status.
    pub async fn update_status(
        pool: &SqlitePool,
        id: DbId,
        status: &str,
    ) -> Result<Option<VersionRow>, sqlx::Error> {
        let query = format!(
            "UPDATE versions SET status = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Hard delete a version row. Returns the number of rows removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM versions WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Branch a new version from `source_number` in a single transaction.
    ///
    /// Clones the version row (status reset to draft, provenance recorded)
    /// and every content row of the source. Either everything commits or
    /// nothing does.
    pub async fn clone_from(
        pool: &SqlitePool,
        post_id: DbId,
        source_number: i64,
    ) -> Result<VersionRow, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        let find_query =
            format!("SELECT {COLUMNS} FROM versions WHERE post_id = ? AND version_number = ?");
        let source: VersionRow = sqlx::query_as(&find_query)
            .bind(post_id)
            .bind(source_number)
            .fetch_one(&mut *tx)
            .await?;

        let next: (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(version_number), 0) + 1 FROM versions WHERE post_id = ?")
                .bind(post_id)
                .fetch_one(&mut *tx)
                .await?;

        let insert_query = format!(
            "INSERT INTO versions (post_id, version_number, status, created_from_version, \
                                   created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        let created: VersionRow = sqlx::query_as(&insert_query)
            .bind(post_id)
            .bind(next.0)
            .bind(ContentStatus::Draft.as_str())
            .bind(source_number)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        let contents_query =
            format!("SELECT {CONTENT_COLUMNS} FROM contents WHERE version_id = ? ORDER BY id");
        let contents: Vec<crate::models::content::ContentRow> = sqlx::query_as(&contents_query)
            .bind(source.id)
            .fetch_all(&mut *tx)
            .await?;

        for content in &contents {
            sqlx::query(
                "INSERT INTO contents (version_id, language, title, body, status, custom_slug, \
                                       metadata, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(created.id)
            .bind(&content.language)
            .bind(&content.title)
            .bind(&content.body)
            .bind(ContentStatus::Draft.as_str())
            .bind(&content.custom_slug)
            .bind(&content.metadata)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    /// Cross-version publish walk over a post's rows.
    ///
    /// For every version: the target becomes `published` (all its contents
    /// too); any other version currently `published` becomes `archived`
    /// (likewise its published contents); the rest are untouched.
    pub async fn publish(
        pool: &SqlitePool,
        post_id: DbId,
        target_number: i64,
    ) -> Result<(), sqlx::Error> {
        let versions = Self::list_by_post(pool, post_id).await?;
        let now = Utc::now();
        for version in versions {
            if version.version_number == target_number {
                sqlx::query("UPDATE versions SET status = 'published', updated_at = ? WHERE id = ?")
                    .bind(now)
                    .bind(version.id)
                    .execute(pool)
                    .await?;
                sqlx::query("UPDATE contents SET status = 'published', updated_at = ? WHERE version_id = ?")
                    .bind(now)
                    .bind(version.id)
                    .execute(pool)
                    .await?;
            } else if version.status == ContentStatus::Published.as_str() {
                sqlx::query("UPDATE versions SET status = 'archived', updated_at = ? WHERE id = ?")
                    .bind(now)
                    .bind(version.id)
                    .execute(pool)
                    .await?;
                sqlx::query(
                    "UPDATE contents SET status = 'archived', updated_at = ? \
                     WHERE version_id = ? AND status = 'published'",
                )
                .bind(now)
                .bind(version.id)
                .execute(pool)
                .await?;
            }
        }
        Ok(())
    }
}
