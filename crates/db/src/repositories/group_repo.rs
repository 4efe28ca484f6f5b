//! Repository for the `groups` mirror table.
//!
//! Groups are authoritative in the settings blob; these rows are upserted by
//! the synchronizer and importer to anchor post foreign keys.

use chrono::Utc;
use corpus_core::groups::Group;
use sqlx::SqlitePool;

use crate::models::group::GroupRow;

/// Column list for groups queries.
const COLUMNS: &str =
    "id, slug, name, mode, content_type, item_name, item_name_plural, language, position, \
     created_at, updated_at";

/// Provides CRUD for mirrored group rows.
pub struct GroupRepo;

impl GroupRepo {
    /// Insert or update the mirror row for a configuration-list group.
    ///
    /// The group slug is the deterministic upsert key, so repeated calls
    /// never create duplicates.
    pub async fn upsert(pool: &SqlitePool, group: &Group) -> Result<GroupRow, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO groups \
                (slug, name, mode, content_type, item_name, item_name_plural, language, position, \
                 created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(slug) DO UPDATE SET \
                name = excluded.name, \
                mode = excluded.mode, \
                content_type = excluded.content_type, \
                item_name = excluded.item_name, \
                item_name_plural = excluded.item_name_plural, \
                language = excluded.language, \
                position = excluded.position, \
                updated_at = excluded.updated_at \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GroupRow>(&query)
            .bind(&group.slug)
            .bind(&group.name)
            .bind(group.mode.as_str())
            .bind(&group.content_type)
            .bind(&group.item_name)
            .bind(&group.item_name_plural)
            .bind(&group.language)
            .bind(group.position)
            .bind(now)
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Find a group row by slug.
    pub async fn find_by_slug(
        pool: &SqlitePool,
        slug: &str,
    ) -> Result<Option<GroupRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups WHERE slug = ?");
        sqlx::query_as::<_, GroupRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// List all group rows ordered by position.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<GroupRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM groups ORDER BY position, slug");
        sqlx::query_as::<_, GroupRow>(&query).fetch_all(pool).await
    }

    /// Delete a group row (cascades through posts, versions, contents).
    /// Returns the number of rows removed.
    pub async fn delete(pool: &SqlitePool, slug: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE slug = ?")
            .bind(slug)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
