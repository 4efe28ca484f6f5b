//! Schema bootstrap.
//!
//! Four tables mirror the store's entity hierarchy with the unique keys
//! callers rely on for idempotent upserts:
//!
//! - `groups(slug)`: mirrored FK anchor for the configuration-list groups
//! - `posts(group_id, slug)`
//! - `versions(post_id, version_number)`
//! - `contents(version_id, language)`

use sqlx::SqlitePool;
use tracing::debug;

const DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS groups (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        slug TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        mode TEXT NOT NULL,
        content_type TEXT NOT NULL,
        item_name TEXT NOT NULL,
        item_name_plural TEXT NOT NULL,
        language TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        slug TEXT NOT NULL,
        post_date TEXT,
        post_time TEXT,
        status TEXT NOT NULL DEFAULT 'draft',
        primary_language TEXT NOT NULL,
        created_by TEXT,
        updated_by TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (group_id, slug)
    )",
    "CREATE TABLE IF NOT EXISTS versions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        version_number INTEGER NOT NULL,
        status TEXT NOT NULL DEFAULT 'draft',
        created_from_version INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (post_id, version_number)
    )",
    "CREATE TABLE IF NOT EXISTS contents (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        version_id INTEGER NOT NULL REFERENCES versions(id) ON DELETE CASCADE,
        language TEXT NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        body TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'draft',
        custom_slug TEXT,
        metadata TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (version_id, language)
    )",
    "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id)",
    "CREATE INDEX IF NOT EXISTS idx_versions_post ON versions(post_id)",
    "CREATE INDEX IF NOT EXISTS idx_contents_version ON contents(version_id)",
];

/// Create all tables and indexes if absent. Idempotent.
pub async fn init(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!(statements = DDL.len(), "schema bootstrapped");
    Ok(())
}
