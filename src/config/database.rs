//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables are
//! generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::Benefit;
use crate::errors::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info};

/// Default database location when neither config.toml nor `DATABASE_URL` set one.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/benefits.sqlite?mode=rwc";

/// Establishes a connection pool to the given database URL with the driver's
/// default pool size.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    create_pool(database_url, None).await
}

/// Establishes a connection pool of at most `max_connections` connections.
///
/// An in-memory database lives only as long as its connection, so for
/// `:memory:` URLs the pool is pinned to exactly one connection and
/// `max_connections` is ignored.
pub async fn create_pool(
    database_url: &str,
    max_connections: Option<u32>,
) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {database_url}");
    let mut options = ConnectOptions::new(database_url);
    options.sqlx_logging(false);
    if database_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    } else if let Some(max) = max_connections {
        options.max_connections(max);
    }

    Database::connect(options).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Safe to run on every start: existing tables and their rows are left alone.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut benefit_table = schema.create_table_from_entity(Benefit);
    benefit_table.if_not_exists();

    db.execute(builder.build(&benefit_table)).await?;
    info!("Database tables ensured");

    Ok(())
}

/// Creates the parent directory of a file-backed `SQLite` URL, if any.
///
/// `mode=rwc` lets `SQLite` create the file but not missing directories.
pub fn ensure_sqlite_parent_dir(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_file_path(database_url) else {
        return Ok(());
    };
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("Created database directory {}", parent.display());
        }
    }
    Ok(())
}

/// File path part of a `sqlite:` URL, without the query string.
fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    (!path.is_empty() && !path.contains(":memory:")).then_some(path)
}
