//! External representation of benefits and transfer requests.
//!
//! These are the shapes that cross the API boundary. Stored rows are converted
//! into [`Benefit`] on the way out; monetary values always leave with exactly two
//! fractional digits and serialize as JSON strings.

use crate::{
    core::validation::MAX_FRACTION_DIGITS,
    entities::benefit,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A benefit as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Benefit {
    /// Server-assigned identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Monetary value, fixed-point with two decimals
    #[schema(value_type = String, example = "1000.00")]
    pub value: Decimal,
    /// False once the benefit has been soft-deleted
    pub active: bool,
    /// Optimistic-lock version
    pub version: i64,
}

impl From<benefit::Model> for Benefit {
    fn from(model: benefit::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            value: to_money(model.value),
            active: model.active,
            version: model.version,
        }
    }
}

/// Rounds to cents and pins the scale so `800` renders as `800.00`.
#[must_use]
pub fn to_money(value: Decimal) -> Decimal {
    let mut money = value.round_dp(MAX_FRACTION_DIGITS);
    money.rescale(MAX_FRACTION_DIGITS);
    money
}

/// Request body for create and update.
///
/// Everything is optional at the serde layer so that missing fields turn into
/// validation messages instead of generic deserialization failures. `id` is
/// never read from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BenefitInput {
    /// Required, 1..=100 characters after trimming
    #[serde(default)]
    pub name: String,
    /// Optional, at most 255 characters
    #[serde(default)]
    pub description: Option<String>,
    /// Required, strictly positive
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1000.00")]
    pub value: Option<Decimal>,
    /// Defaults to true on create, unchanged on update
    #[serde(default)]
    pub active: Option<bool>,
    /// When present on update, must match the stored version
    #[serde(default)]
    pub version: Option<i64>,
}

/// Request body for `POST /benefits/transfer`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    /// Benefit to debit
    #[serde(default)]
    pub from_id: Option<i64>,
    /// Benefit to credit
    #[serde(default)]
    pub to_id: Option<i64>,
    /// Amount to move
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "200.00")]
    pub amount: Option<Decimal>,
}

impl TransferRequest {
    /// Checks that both ids are present and hands back `(from_id, to_id, amount)`.
    ///
    /// The amount stays optional: its presence is part of the transfer's own
    /// validation sequence, which runs after the same-benefit check.
    pub fn into_parts(self) -> Result<(i64, i64, Option<Decimal>)> {
        let from_id = self
            .from_id
            .ok_or_else(|| Error::validation("Source benefit id is required"))?;
        let to_id = self
            .to_id
            .ok_or_else(|| Error::validation("Target benefit id is required"))?;
        Ok((from_id, to_id, self.amount))
    }
}

/// Result of a successful transfer: both benefits after the move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    /// The debited benefit
    pub from: Benefit,
    /// The credited benefit
    pub to: Benefit,
}
