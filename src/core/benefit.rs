//! Benefit business logic - list, get, create, update, soft delete and search.
//!
//! Reads only ever see active benefits. Every write is a version-checked
//! compare-and-swap against the row version read just before it, so an update
//! racing another writer fails instead of silently overwriting it.

use crate::{
    config::SeedBenefit,
    core::validation,
    db::{self, NewBenefit},
    entities::benefit,
    errors::{Error, Result},
    models::{Benefit, BenefitInput},
};
use sea_orm::DatabaseConnection;
use tracing::{info, instrument, warn};

/// Retrieves all active benefits.
pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<Benefit>> {
    let benefits = db::find_all_active(db).await?;
    Ok(benefits.into_iter().map(Benefit::from).collect())
}

/// Finds an active benefit by id. Missing and soft-deleted benefits are both `None`.
pub async fn get(db: &DatabaseConnection, id: i64) -> Result<Option<Benefit>> {
    Ok(db::find_active_by_id(db, id).await?.map(Benefit::from))
}

/// Active benefits whose name contains `fragment` (case-sensitive).
pub async fn search_by_name(db: &DatabaseConnection, fragment: &str) -> Result<Vec<Benefit>> {
    let benefits = db::search_active_by_name(db, fragment).await?;
    Ok(benefits.into_iter().map(Benefit::from).collect())
}

/// Validates the input and stores a new benefit.
///
/// `active` defaults to true. Any `version` in the input is ignored; new
/// benefits always start at version 0.
///
/// # Errors
/// Returns a validation error if:
/// - The name is blank or longer than 100 characters
/// - The description is longer than 255 characters
/// - The value is missing, not positive, or exceeds 13.2 digits
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create(db: &DatabaseConnection, input: BenefitInput) -> Result<Benefit> {
    let new = NewBenefit {
        name: validation::validate_name(&input.name)?,
        description: validation::validate_description(input.description)?,
        value: validation::validate_value(input.value)?,
        active: input.active.unwrap_or(true),
    };

    let created = db::insert(db, new).await?;
    info!(id = created.id, "Created benefit");
    Ok(created.into())
}

/// Replaces name, description and value (and `active`, when supplied) of an
/// active benefit.
///
/// # Returns
/// * `Ok(Some(benefit))` - the updated benefit
/// * `Ok(None)` - no active benefit with this id; nothing was changed
///
/// # Errors
/// Returns an error if:
/// - The input fails validation
/// - The input carries a `version` that differs from the stored one
/// - Another write landed between the read and the write
#[instrument(skip(db, input))]
pub async fn update(
    db: &DatabaseConnection,
    id: i64,
    input: BenefitInput,
) -> Result<Option<Benefit>> {
    let name = validation::validate_name(&input.name)?;
    let description = validation::validate_description(input.description)?;
    let value = validation::validate_value(input.value)?;

    let Some(current) = db::find_active_by_id(db, id).await? else {
        return Ok(None);
    };

    if let Some(expected) = input.version {
        if expected != current.version {
            warn!(
                id,
                expected,
                stored = current.version,
                "Update carried a stale version"
            );
            return Err(Error::ConcurrencyConflict { id });
        }
    }

    let replacement = benefit::Model {
        name,
        description,
        value,
        active: input.active.unwrap_or(current.active),
        ..current
    };

    if !write_or_classify(db, &replacement).await? {
        return Ok(None);
    }

    info!(id, version = replacement.version + 1, "Updated benefit");
    Ok(Some(Benefit::from(benefit::Model {
        version: replacement.version + 1,
        ..replacement
    })))
}

/// Soft deletes a benefit by setting `active = false`. All other fields are kept.
///
/// # Returns
/// `true` if an active benefit was found and deactivated, `false` otherwise
/// (including a second delete of the same benefit).
#[instrument(skip(db))]
pub async fn delete(db: &DatabaseConnection, id: i64) -> Result<bool> {
    let Some(current) = db::find_active_by_id(db, id).await? else {
        return Ok(false);
    };

    let deactivated = benefit::Model {
        active: false,
        ..current
    };

    let deleted = write_or_classify(db, &deactivated).await?;
    if deleted {
        info!(id, "Soft deleted benefit");
    }
    Ok(deleted)
}

/// Version-checked write. A rejected write is re-read to tell a benefit that
/// disappeared from view (`Ok(false)`) apart from a concurrent modification.
async fn write_or_classify(db: &DatabaseConnection, model: &benefit::Model) -> Result<bool> {
    if db::save_versioned(db, model).await? {
        return Ok(true);
    }

    match db::find_active_by_id(db, model.id).await? {
        None => Ok(false),
        Some(_) => Err(Error::ConcurrencyConflict { id: model.id }),
    }
}

/// Creates the configured seed benefits when the table has no rows at all.
///
/// # Returns
/// The number of benefits created
pub async fn seed_if_empty(db: &DatabaseConnection, seeds: &[SeedBenefit]) -> Result<usize> {
    if seeds.is_empty() || db::count_all(db).await? > 0 {
        return Ok(0);
    }

    for seed in seeds {
        create(
            db,
            BenefitInput {
                name: seed.name.clone(),
                description: seed.description.clone(),
                value: Some(seed.value),
                active: Some(true),
                version: None,
            },
        )
        .await?;
    }

    info!(count = seeds.len(), "Seeded initial benefits");
    Ok(seeds.len())
}
