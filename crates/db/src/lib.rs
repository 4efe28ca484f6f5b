//! Relational mirror of the content store.
//!
//! Backed by SQLite through sqlx so the store is embeddable; the schema is
//! bootstrapped on connect. Repositories are zero-sized structs providing
//! async CRUD methods that accept `&SqlitePool` as the first argument.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

pub mod models;
pub mod repositories;
pub mod schema;

/// Open a pool against `url` (e.g. `sqlite://corpus.db`) and bootstrap the
/// schema.
///
/// All access goes through a single pooled connection: SQLite serialises
/// writers anyway, and a single connection also makes `sqlite::memory:`
/// behave as one database.
pub async fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    schema::init(&pool).await?;
    Ok(pool)
}

/// Open an in-memory database, mainly for tests and dry runs.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    connect("sqlite::memory:").await
}
