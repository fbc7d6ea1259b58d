//! Persistence access for the `benefits` table.
//!
//! Every read that callers see goes through [`active`], so soft-deleted rows
//! are filtered in one place. Writes never trust a bare id: they are
//! compare-and-swap updates keyed on the `version` captured by the read that
//! preceded them.

use crate::{
    entities::{Benefit, benefit},
    errors::Result,
};
use sea_orm::{QueryOrder, Select, Set, prelude::*, sea_query::Expr};
use tracing::{debug, warn};

/// Fields of a benefit that is about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBenefit {
    /// Validated name
    pub name: String,
    /// Validated description
    pub description: Option<String>,
    /// Validated value
    pub value: Decimal,
    /// Initial active flag
    pub active: bool,
}

/// Base query over active benefits only.
#[must_use]
pub fn active() -> Select<Benefit> {
    Benefit::find().filter(benefit::Column::Active.eq(true))
}

/// Retrieves all active benefits, ordered by id.
pub async fn find_all_active<C>(db: &C) -> Result<Vec<benefit::Model>>
where
    C: ConnectionTrait,
{
    active()
        .order_by_asc(benefit::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active benefit by id. Soft-deleted rows are reported as `None`.
pub async fn find_active_by_id<C>(db: &C, id: i64) -> Result<Option<benefit::Model>>
where
    C: ConnectionTrait,
{
    active()
        .filter(benefit::Column::Id.eq(id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a benefit by id whether or not it is active.
///
/// Only used internally, to tell a soft-deleted row apart from a missing one.
pub async fn find_by_id<C>(db: &C, id: i64) -> Result<Option<benefit::Model>>
where
    C: ConnectionTrait,
{
    Benefit::find_by_id(id).one(db).await.map_err(Into::into)
}

/// Active benefits whose name contains `fragment`, case-sensitively.
///
/// `LIKE` only narrows the candidate rows: `SQLite` folds ASCII case and treats
/// `%`/`_` as wildcards, so the final decision is an exact substring check.
pub async fn search_active_by_name<C>(db: &C, fragment: &str) -> Result<Vec<benefit::Model>>
where
    C: ConnectionTrait,
{
    let candidates = active()
        .filter(benefit::Column::Name.contains(fragment))
        .order_by_asc(benefit::Column::Id)
        .all(db)
        .await?;

    Ok(candidates
        .into_iter()
        .filter(|benefit| benefit.name.contains(fragment))
        .collect())
}

/// Counts every row, active or not.
pub async fn count_all<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    Benefit::find().count(db).await.map_err(Into::into)
}

/// Inserts a new benefit at version 0.
pub async fn insert<C>(db: &C, new: NewBenefit) -> Result<benefit::Model>
where
    C: ConnectionTrait,
{
    let model = benefit::ActiveModel {
        name: Set(new.name),
        description: Set(new.description),
        value: Set(new.value),
        active: Set(new.active),
        version: Set(0),
        ..Default::default()
    };

    let inserted = model.insert(db).await?;
    debug!(id = inserted.id, "Inserted benefit");
    Ok(inserted)
}

/// Writes `model`'s fields back if, and only if, the stored row still has
/// `model.version`. The stored version becomes `model.version + 1`.
///
/// Performs a single statement:
/// `UPDATE benefits SET ..., version = version + 1 WHERE id = ? AND version = ?`
///
/// # Returns
/// `true` when the row was written, `false` when the version check rejected it
pub async fn save_versioned<C>(db: &C, model: &benefit::Model) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = Benefit::update_many()
        .col_expr(benefit::Column::Name, Expr::value(model.name.clone()))
        .col_expr(
            benefit::Column::Description,
            Expr::value(model.description.clone()),
        )
        .col_expr(benefit::Column::Value, Expr::value(model.value))
        .col_expr(benefit::Column::Active, Expr::value(model.active))
        .col_expr(
            benefit::Column::Version,
            Expr::col(benefit::Column::Version).add(1),
        )
        .filter(benefit::Column::Id.eq(model.id))
        .filter(benefit::Column::Version.eq(model.version))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        warn!(
            id = model.id,
            expected_version = model.version,
            "Version check rejected write"
        );
        return Ok(false);
    }

    Ok(true)
}
