//! Shared test utilities for the benefit service.
//!
//! Provides an in-memory database with the schema in place and helpers that
//! insert rows directly, bypassing validation, so tests can set up any state.

use crate::{
    config::database::{create_connection, create_pool, create_tables},
    db::{self, NewBenefit},
    entities::benefit,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::{path::Path, str::FromStr};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output to the test harness. Safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
///
/// The pool holds a single connection, so every query in a test sees the same
/// in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = create_connection("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Creates a file-backed `SQLite` database under `dir` with a pool of up to
/// `max_connections`, so concurrent transactions really interleave.
pub async fn setup_file_db(dir: &Path, max_connections: u32) -> Result<DatabaseConnection> {
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.join("benefits.sqlite").display()
    );
    let db = create_pool(&url, Some(max_connections)).await?;
    create_tables(&db).await?;
    Ok(db)
}

/// Inserts an active benefit with the given name and value.
pub async fn create_test_benefit(
    db: &DatabaseConnection,
    name: &str,
    value: &str,
) -> Result<benefit::Model> {
    db::insert(
        db,
        NewBenefit {
            name: name.to_string(),
            description: None,
            value: dec(value),
            active: true,
        },
    )
    .await
}

/// Parses a decimal literal.
///
/// # Panics
/// Panics if `value` is not a valid decimal.
#[allow(clippy::unwrap_used)]
#[must_use]
pub fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}
