//! Benefit entity - A named monetary allotment.
//!
//! Rows are never physically removed: `active = false` marks a soft-deleted
//! benefit. `version` is bumped by every successful write and is the marker
//! the optimistic-lock checks compare against.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Benefit database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "benefits")]
pub struct Model {
    /// Surrogate identifier, assigned on insert
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, at most 100 characters
    pub name: String,
    /// Optional free text, at most 255 characters
    pub description: Option<String>,
    /// Monetary value, 13 integer digits and 2 fractional digits
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub value: Decimal,
    /// Soft delete flag - false means the benefit is logically deleted
    pub active: bool,
    /// Optimistic-lock counter
    pub version: i64,
}

/// Benefits have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
