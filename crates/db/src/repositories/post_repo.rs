//! Repository for the `posts` table.

use chrono::Utc;
use corpus_core::types::DbId;
use sqlx::SqlitePool;

use crate::models::post::{CreatePost, PostRow};

/// Column list for posts queries.
const COLUMNS: &str =
    "id, group_id, slug, post_date, post_time, status, primary_language, created_by, updated_by, \
     created_at, updated_at";

/// Provides CRUD for post rows.
pub struct PostRepo;

impl PostRepo {
    /// Create a post row. Fails on a `(group_id, slug)` collision.
    pub async fn create(pool: &SqlitePool, input: &CreatePost) -> Result<PostRow, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO posts \
                (group_id, slug, post_date, post_time, status, primary_language, created_by, \
                 created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PostRow>(&query)
            .bind(input.group_id)
            .bind(&input.slug)
            .bind(&input.post_date)
            .bind(&input.post_time)
            .bind(&input.status)
            .bind(&input.primary_language)
            .bind(&input.created_by)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Insert or update on the deterministic `(group_id, slug)` key.
    pub async fn upsert(pool: &SqlitePool, input: &CreatePost) -> Result<PostRow, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO posts \
                (group_id, slug, post_date, post_time, status, primary_language, created_by, \
                 created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(group_id, slug) DO UPDATE SET \
                post_date = excluded.post_date, \
                post_time = excluded.post_time, \
                status = excluded.status, \
                primary_language = excluded.primary_language, \
                updated_at = excluded.updated_at \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PostRow>(&query)
            .bind(input.group_id)
            .bind(&input.slug)
            .bind(&input.post_date)
            .bind(&input.post_time)
            .bind(&input.status)
            .bind(&input.primary_language)
            .bind(&input.created_by)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a post by its group and canonical slug.
    pub async fn find_by_group_and_slug(
        pool: &SqlitePool,
        group_id: DbId,
        slug: &str,
    ) -> Result<Option<PostRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE group_id = ? AND slug = ?");
        sqlx::query_as::<_, PostRow>(&query)
            .bind(group_id)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List all posts of a group, newest first.
    pub async fn list_by_group(
        pool: &SqlitePool,
        group_id: DbId,
    ) -> Result<Vec<PostRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM posts WHERE group_id = ? ORDER BY created_at DESC, slug"
        );
        sqlx::query_as::<_, PostRow>(&query)
            .bind(group_id)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: DbId) -> Result<Option<PostRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM posts WHERE id = ?");
        sqlx::query_as::<_, PostRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update the post-level status, returning the updated row.
    pub async fn update_status(
        pool: &SqlitePool,
        id: DbId,
        status: &str,
        updated_by: Option<&str>,
    ) -> Result<Option<PostRow>, sqlx::Error> {
        let query = format!(
            "UPDATE posts SET status = ?, updated_by = COALESCE(?, updated_by), updated_at = ? \
             WHERE id = ? RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PostRow>(&query)
            .bind(status)
            .bind(updated_by)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Rename a post's slug (the relational side of a tree relocation).
    pub async fn update_slug(
        pool: &SqlitePool,
        id: DbId,
        new_slug: &str,
    ) -> Result<Option<PostRow>, sqlx::Error> {
        let query = format!(
            "UPDATE posts SET slug = ?, updated_at = ? WHERE id = ? RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PostRow>(&query)
            .bind(new_slug)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Change the primary language of a post.
    pub async fn set_primary_language(
        pool: &SqlitePool,
        id: DbId,
        language: &str,
    ) -> Result<Option<PostRow>, sqlx::Error> {
        let query = format!(
            "UPDATE posts SET primary_language = ?, updated_at = ? WHERE id = ? \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PostRow>(&query)
            .bind(language)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Hard delete. Returns the number of rows removed.
    pub async fn delete(pool: &SqlitePool, id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
