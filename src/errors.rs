//! Unified error type for the benefit service.
//!
//! Every domain failure is classified here, once, so the API layer only has to
//! look at [`Error::kind`] to pick a response status.

use rust_decimal::Decimal;
use sea_orm::{DbErr, RuntimeErr, SqlxError};
use std::fmt;
use thiserror::Error;

/// Which side of a transfer an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferSide {
    /// The benefit the amount is taken from
    Source,
    /// The benefit the amount is credited to
    Target,
}

impl fmt::Display for TransferSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("Source"),
            Self::Target => f.write_str("Target"),
        }
    }
}

/// Broad error classes, used to map failures onto response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input
    Validation,
    /// The id does not resolve to an active benefit
    NotFound,
    /// The request is well formed but the current state forbids it
    State,
    /// An optimistic-lock version check rejected a write
    Conflict,
    /// Storage, I/O or configuration failure
    Infrastructure,
}

/// Errors produced by the benefit service.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Benefit not found: {id}")]
    BenefitNotFound { id: i64 },

    #[error("{side} benefit not found: {id}")]
    ParticipantNotFound { side: TransferSide, id: i64 },

    #[error("{side} benefit is inactive: {id}")]
    InactiveBenefit { side: TransferSide, id: i64 },

    #[error("Insufficient balance. Current balance: {current:.2}, requested amount: {requested:.2}")]
    InsufficientBalance { current: Decimal, requested: Decimal },

    #[error("Transfer failed due to a concurrent modification of benefit {id}. Please retry the transfer")]
    ConcurrencyConflict { id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {message}")]
    Server { message: String },
}

impl Error {
    /// Shorthand for a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Classifies the error for response mapping.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::BenefitNotFound { .. } | Self::ParticipantNotFound { .. } => ErrorKind::NotFound,
            Self::InactiveBenefit { .. } | Self::InsufficientBalance { .. } => ErrorKind::State,
            Self::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) | Self::Server { .. } => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// True when the database refused a statement because another connection
    /// holds a conflicting lock (`SQLITE_BUSY` or `SQLITE_LOCKED`, any
    /// extended code).
    #[must_use]
    pub fn is_lock_contention(&self) -> bool {
        let Self::Database(
            DbErr::Conn(RuntimeErr::SqlxError(SqlxError::Database(db_err)))
            | DbErr::Exec(RuntimeErr::SqlxError(SqlxError::Database(db_err)))
            | DbErr::Query(RuntimeErr::SqlxError(SqlxError::Database(db_err))),
        ) = self
        else {
            return false;
        };

        db_err
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
