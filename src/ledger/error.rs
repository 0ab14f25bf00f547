//! Balance Error Types
//!
//! Business outcomes (`InvalidAmount`, `InvalidProfile`, `InsufficientFunds`)
//! are kept structurally apart from storage failures so the gateway can map
//! them to domain responses without logging them as operational errors.

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Failure reported by a [`LedgerStore`](super::store::LedgerStore) backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Balance out of decimal range: {0}")]
    Overflow(String),
}

/// Step of a ledger call that a storage failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the profile-scoped unit of work
    Begin,
    /// Balance read inside the unit of work
    Sum,
    Append,
    Commit,
    /// Plain balance query
    Balance,
    Health,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Begin => "begin",
            Stage::Sum => "sum",
            Stage::Append => "append",
            Stage::Commit => "commit",
            Stage::Balance => "balance",
            Stage::Health => "health",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`BalanceService`](super::service::BalanceService)
#[derive(Error, Debug)]
pub enum BalanceError {
    // === Caller input errors ===
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid profile id: {0}")]
    InvalidProfile(String),

    // === Business outcome ===
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    // === Storage failures ===
    #[error("Storage failure during {stage}: {source}")]
    Storage {
        stage: Stage,
        #[source]
        source: StoreError,
    },

    #[error("Storage timed out during {stage}")]
    Timeout { stage: Stage },
}

impl BalanceError {
    pub fn storage(stage: Stage, source: StoreError) -> Self {
        BalanceError::Storage { stage, source }
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            BalanceError::InvalidAmount(_) => "INVALID_AMOUNT",
            BalanceError::InvalidProfile(_) => "INVALID_PROFILE",
            BalanceError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            BalanceError::Storage { .. } => "STORAGE_FAILURE",
            BalanceError::Timeout { .. } => "STORAGE_TIMEOUT",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            BalanceError::InvalidAmount(_) | BalanceError::InvalidProfile(_) => 400,
            BalanceError::InsufficientFunds { .. } => 422,
            BalanceError::Storage { .. } => 500,
            BalanceError::Timeout { .. } => 504,
        }
    }

    /// Caller input errors and business outcomes, as opposed to system failures
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            BalanceError::InvalidAmount(_)
                | BalanceError::InvalidProfile(_)
                | BalanceError::InsufficientFunds { .. }
        )
    }

    /// Storage failure on the read path; repeating the call is harmless.
    ///
    /// A failed mutation is never reported as retryable: whether its append
    /// committed has to be confirmed by the caller first.
    pub fn is_retryable_read(&self) -> bool {
        match self {
            BalanceError::Storage { stage, .. } | BalanceError::Timeout { stage } => {
                *stage == Stage::Balance
            }
            _ => false,
        }
    }

    /// Stage of a storage failure, `None` for business errors
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BalanceError::Storage { stage, .. } | BalanceError::Timeout { stage } => Some(*stage),
            _ => None,
        }
    }
}
