//! Moving value between two benefits.
//!
//! A transfer is one database transaction: both participants are read inside
//! it, the new values are checked, and both rows are written back with a
//! version check each. If either write is rejected the transaction is dropped
//! uncommitted, so neither side keeps its change.

use crate::{
    core::validation,
    db,
    entities::benefit,
    errors::{Error, Result, TransferSide},
    models::{Benefit, TransferOutcome},
};
use rust_decimal::Decimal;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use tracing::{info, instrument, warn};

/// Transfers `amount` from benefit `from_id` to benefit `to_id`.
///
/// Checks run in this order, and the first failure wins:
/// 1. `from_id != to_id`
/// 2. `amount` is present, positive and within 13.2 digits
/// 3. both benefits exist and are active
/// 4. the source holds at least `amount`
/// 5. the credited target value still fits 13.2 digits
///
/// Steps 1 and 2 touch no storage. Everything after runs inside one transaction.
///
/// # Errors
/// Returns an error if:
/// - Any check above fails (nothing is written)
/// - A participant was modified or soft deleted between read and write, or
///   another transfer held a conflicting lock
/// - The database fails
#[instrument(skip(db))]
pub async fn transfer(
    db: &DatabaseConnection,
    from_id: i64,
    to_id: i64,
    amount: Option<Decimal>,
) -> Result<TransferOutcome> {
    if from_id == to_id {
        return Err(Error::validation("Cannot transfer to the same benefit"));
    }
    let amount = validation::validate_amount(amount)?;

    let outcome = run_transfer(db, from_id, to_id, amount)
        .await
        .map_err(|err| {
            if err.is_lock_contention() {
                warn!(from_id, to_id, error = %err, "Transfer lost a lock race");
                Error::ConcurrencyConflict { id: from_id }
            } else {
                err
            }
        })?;

    info!(
        from_id,
        to_id,
        %amount,
        from_value = %outcome.from.value,
        to_value = %outcome.to.value,
        "Transfer completed"
    );
    Ok(outcome)
}

/// The unit of work: reads, checks and writes inside one transaction.
///
/// Another connection holding a conflicting lock surfaces as a lock-contention
/// database error, which the caller reports as a conflict.
async fn run_transfer(
    db: &DatabaseConnection,
    from_id: i64,
    to_id: i64,
    amount: Decimal,
) -> Result<TransferOutcome> {
    let txn = db.begin().await?;

    let from = load_participant(&txn, TransferSide::Source, from_id).await?;
    let to = load_participant(&txn, TransferSide::Target, to_id).await?;

    let outcome = apply_transfer(&txn, from, to, amount).await?;

    txn.commit().await?;
    Ok(outcome)
}

async fn load_participant<C>(db: &C, side: TransferSide, id: i64) -> Result<benefit::Model>
where
    C: ConnectionTrait,
{
    db::find_active_by_id(db, id)
        .await?
        .ok_or(Error::ParticipantNotFound { side, id })
}

/// Debits `from` and credits `to`, writing both with a version check.
///
/// `from` and `to` must be the rows as read inside the same unit of work as
/// `db`; the caller commits or drops it.
pub(crate) async fn apply_transfer<C>(
    db: &C,
    from: benefit::Model,
    to: benefit::Model,
    amount: Decimal,
) -> Result<TransferOutcome>
where
    C: ConnectionTrait,
{
    ensure_active(&from, TransferSide::Source)?;
    ensure_active(&to, TransferSide::Target)?;

    if from.value < amount {
        return Err(Error::InsufficientBalance {
            current: from.value,
            requested: amount,
        });
    }

    let credited = validation::validate_value(Some(to.value + amount))?;

    let debited = benefit::Model {
        value: from.value - amount,
        ..from
    };
    let credited = benefit::Model {
        value: credited,
        ..to
    };

    write_participant(db, &debited, TransferSide::Source).await?;
    write_participant(db, &credited, TransferSide::Target).await?;

    Ok(TransferOutcome {
        from: written(debited),
        to: written(credited),
    })
}

fn ensure_active(model: &benefit::Model, side: TransferSide) -> Result<()> {
    if model.active {
        Ok(())
    } else {
        Err(Error::InactiveBenefit { side, id: model.id })
    }
}

/// Version-checked write of one participant. A rejected write is re-read so a
/// soft delete in between is reported as such rather than as a conflict.
async fn write_participant<C>(db: &C, model: &benefit::Model, side: TransferSide) -> Result<()>
where
    C: ConnectionTrait,
{
    if db::save_versioned(db, model).await? {
        return Ok(());
    }

    match db::find_by_id(db, model.id).await? {
        Some(current) if !current.active => Err(Error::InactiveBenefit { side, id: model.id }),
        _ => {
            warn!(id = model.id, %side, "Transfer lost a version race");
            Err(Error::ConcurrencyConflict { id: model.id })
        }
    }
}

fn written(model: benefit::Model) -> Benefit {
    Benefit::from(benefit::Model {
        version: model.version + 1,
        ..model
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    async fn value_of(db: &DatabaseConnection, id: i64) -> Result<Decimal> {
        Ok(db::find_by_id(db, id).await?.unwrap().value)
    }

    #[tokio::test]
    async fn test_transfer_moves_value() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "1000.00").await?;
        let b = create_test_benefit(&db, "Transport", "500.00").await?;

        let outcome = transfer(&db, a.id, b.id, Some(dec("200.00"))).await?;

        assert_eq!(outcome.from.value, dec("800.00"));
        assert_eq!(outcome.to.value, dec("700.00"));
        assert_eq!(outcome.from.version, 1);
        assert_eq!(outcome.to.version, 1);
        assert_eq!(outcome.from.value.to_string(), "800.00");

        assert_eq!(value_of(&db, a.id).await?, dec("800.00"));
        assert_eq!(value_of(&db, b.id).await?, dec("700.00"));

        // Back the other way, more than the target now holds
        let result = transfer(&db, b.id, a.id, Some(dec("1000.00"))).await;
        match result {
            Err(err @ Error::InsufficientBalance { .. }) => assert_eq!(
                err.to_string(),
                "Insufficient balance. Current balance: 700.00, requested amount: 1000.00"
            ),
            other => panic!("expected insufficient balance, got {other:?}"),
        }

        assert_eq!(value_of(&db, a.id).await?, dec("800.00"));
        assert_eq!(value_of(&db, b.id).await?, dec("700.00"));

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_conserves_total() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "123.45").await?;
        let b = create_test_benefit(&db, "Transport", "67.89").await?;
        let before = a.value + b.value;

        for amount in ["0.01", "10.10", "50.00", "63.34"] {
            transfer(&db, a.id, b.id, Some(dec(amount))).await?;
        }

        let after = value_of(&db, a.id).await? + value_of(&db, b.id).await?;
        assert_eq!(after, before);
        assert_eq!(value_of(&db, a.id).await?, Decimal::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_whole_balance_is_allowed() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "50.00").await?;
        let b = create_test_benefit(&db, "Transport", "0.01").await?;

        let outcome = transfer(&db, a.id, b.id, Some(dec("50.00"))).await?;
        assert_eq!(outcome.from.value.to_string(), "0.00");
        assert_eq!(outcome.to.value, dec("50.01"));

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_validation_runs_before_storage() -> Result<()> {
        // No results are queued, so any storage access would fail the call
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = transfer(&db, 1, 1, Some(dec("10.00"))).await;
        match result {
            Err(err @ Error::Validation { .. }) => {
                assert_eq!(err.to_string(), "Cannot transfer to the same benefit");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        // Same id wins over a bad amount
        let result = transfer(&db, 1, 1, None).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Cannot transfer to the same benefit"
        );

        let result = transfer(&db, 1, 2, None).await;
        assert_eq!(result.unwrap_err().to_string(), "Amount is required");

        let result = transfer(&db, 1, 2, Some(Decimal::ZERO)).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Amount must be greater than zero"
        );

        let result = transfer(&db, 1, 2, Some(dec("-5.00"))).await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Amount must be greater than zero"
        );

        let result = transfer(&db, 1, 2, Some(dec("0.001"))).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_same_id_leaves_value() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "100.00").await?;

        let result = transfer(&db, a.id, a.id, Some(dec("10.00"))).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let stored = db::find_by_id(&db, a.id).await?.unwrap();
        assert_eq!(stored.value, dec("100.00"));
        assert_eq!(stored.version, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_missing_participants() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "100.00").await?;

        let result = transfer(&db, 999, a.id, Some(dec("10.00"))).await;
        match result {
            Err(
                err @ Error::ParticipantNotFound {
                    side: TransferSide::Source,
                    id: 999,
                },
            ) => assert_eq!(err.to_string(), "Source benefit not found: 999"),
            other => panic!("expected missing source, got {other:?}"),
        }

        let result = transfer(&db, a.id, 999, Some(dec("10.00"))).await;
        assert!(matches!(
            result,
            Err(Error::ParticipantNotFound {
                side: TransferSide::Target,
                id: 999
            })
        ));

        assert_eq!(value_of(&db, a.id).await?, dec("100.00"));

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_soft_deleted_participant_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "100.00").await?;
        let b = create_test_benefit(&db, "Transport", "100.00").await?;

        let deleted = benefit::Model {
            active: false,
            ..b.clone()
        };
        assert!(db::save_versioned(&db, &deleted).await?);

        let result = transfer(&db, a.id, b.id, Some(dec("10.00"))).await;
        assert!(matches!(
            result,
            Err(Error::ParticipantNotFound {
                side: TransferSide::Target,
                ..
            })
        ));

        let result = transfer(&db, b.id, a.id, Some(dec("10.00"))).await;
        assert!(matches!(
            result,
            Err(Error::ParticipantNotFound {
                side: TransferSide::Source,
                ..
            })
        ));

        assert_eq!(value_of(&db, a.id).await?, dec("100.00"));
        assert_eq!(value_of(&db, b.id).await?, dec("100.00"));

        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_credit_overflow_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "100.00").await?;
        let b = create_test_benefit(&db, "Big", "9999999999999.00").await?;

        let result = transfer(&db, a.id, b.id, Some(dec("1.00"))).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        assert_eq!(value_of(&db, a.id).await?, dec("100.00"));
        assert_eq!(db::find_by_id(&db, b.id).await?.unwrap().version, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_transfer_rejects_inactive_models() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let from = benefit::Model {
            id: 1,
            name: "Meal".to_string(),
            description: None,
            value: dec("100.00"),
            active: true,
            version: 0,
        };
        let to = benefit::Model {
            id: 2,
            active: false,
            ..from.clone()
        };

        let result = apply_transfer(&db, from, to, dec("10.00")).await;
        match result {
            Err(err @ Error::InactiveBenefit { .. }) => {
                assert_eq!(err.to_string(), "Target benefit is inactive: 2");
            }
            other => panic!("expected inactive target, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_write_on_deleted_row_is_inactive() -> Result<()> {
        let from = benefit::Model {
            id: 7,
            name: "Meal".to_string(),
            description: None,
            value: dec("100.00"),
            active: true,
            version: 3,
        };
        let to = benefit::Model {
            id: 8,
            name: "Transport".to_string(),
            ..from.clone()
        };
        let deleted_meanwhile = benefit::Model {
            active: false,
            version: 4,
            ..from.clone()
        };

        // The debit is rejected, and the re-read finds the source soft deleted
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([vec![deleted_meanwhile]])
            .into_connection();

        let result = apply_transfer(&db, from, to, dec("10.00")).await;
        assert!(matches!(
            result,
            Err(Error::InactiveBenefit {
                side: TransferSide::Source,
                id: 7
            })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_conflict_rolls_back_the_debit() -> Result<()> {
        let db = setup_test_db().await?;
        let a = create_test_benefit(&db, "Meal", "1000.00").await?;
        let b = create_test_benefit(&db, "Transport", "500.00").await?;

        // Another writer touches the target after we read it
        let bumped = benefit::Model {
            value: dec("550.00"),
            ..b.clone()
        };
        assert!(db::save_versioned(&db, &bumped).await?);

        let txn = db.begin().await?;
        let result = apply_transfer(&txn, a.clone(), b.clone(), dec("200.00")).await;
        match result {
            Err(err @ Error::ConcurrencyConflict { .. }) => assert_eq!(
                err.to_string(),
                format!(
                    "Transfer failed due to a concurrent modification of benefit {}. Please retry the transfer",
                    b.id
                )
            ),
            other => panic!("expected conflict, got {other:?}"),
        }
        txn.rollback().await?;

        let source = db::find_by_id(&db, a.id).await?.unwrap();
        assert_eq!(source.value, dec("1000.00"));
        assert_eq!(source.version, 0);
        assert_eq!(value_of(&db, b.id).await?, dec("550.00"));

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_double_spend_applies_once() -> Result<()> {
        // One pooled connection: the second transfer waits for the first to commit
        let db = setup_test_db().await?;
        let source = create_test_benefit(&db, "Meal", "1000.00").await?;
        let first = create_test_benefit(&db, "Transport", "0.01").await?;
        let second = create_test_benefit(&db, "Health", "0.01").await?;

        let (left, right) = tokio::join!(
            transfer(&db, source.id, first.id, Some(dec("700.00"))),
            transfer(&db, source.id, second.id, Some(dec("700.00"))),
        );

        let succeeded = [&left, &right].iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        let failure = if left.is_err() { left } else { right };
        assert!(matches!(
            failure,
            Err(Error::InsufficientBalance { .. } | Error::ConcurrencyConflict { .. })
        ));

        assert_eq!(value_of(&db, source.id).await?, dec("300.00"));
        let credited = value_of(&db, first.id).await? + value_of(&db, second.id).await?;
        assert_eq!(credited, dec("700.02"));

        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_transfers_on_multi_connection_pool_apply_once() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = Arc::new(setup_file_db(dir.path(), 8).await?);
        let source = create_test_benefit(&db, "Meal", "1000.00").await?;

        let mut targets = Vec::new();
        for i in 0..8 {
            targets.push(create_test_benefit(&db, &format!("Target {i}"), "0.01").await?);
        }

        let handles: Vec<_> = targets
            .iter()
            .map(|target| {
                let db = Arc::clone(&db);
                let (from_id, to_id) = (source.id, target.id);
                tokio::spawn(async move {
                    transfer(&db, from_id, to_id, Some(dec("700.00"))).await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);
        for failure in results.iter().filter(|r| r.is_err()) {
            assert!(
                matches!(
                    failure,
                    Err(Error::InsufficientBalance { .. } | Error::ConcurrencyConflict { .. })
                ),
                "unexpected failure {failure:?}"
            );
        }

        assert_eq!(value_of(&db, source.id).await?, dec("300.00"));
        let mut credited = Decimal::ZERO;
        for target in &targets {
            credited += value_of(&db, target.id).await?;
        }
        assert_eq!(credited, dec("700.08"));

        Ok(())
    }
}
