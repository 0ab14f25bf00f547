//! Balance policy: admission rules for ledger operations
//!
//! Every mutation runs inside one profile-scoped unit of work:
//!
//! ```text
//! begin(profile) ──▶ [debit: sum ─▶ compare] ──▶ append ──▶ commit
//!      │                        │
//!      └── profile lock held ───┴── dropped on any error => nothing written
//! ```
//!
//! All store calls of one request share a single deadline.

use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::error::{BalanceError, Stage, StoreError};
use super::store::{LedgerStore, ProfileUnit};
use super::types::{Direction, Operation, ProfileId};
use super::validation::{validate_amount, validate_profile};

/// Deadline used when the caller does not pass one
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a store call against the request deadline
async fn bounded<T, F>(deadline: Instant, stage: Stage, fut: F) -> Result<T, BalanceError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(BalanceError::storage(stage, e)),
        Err(_) => Err(BalanceError::Timeout { stage }),
    }
}

pub struct BalanceService<S: LedgerStore> {
    store: Arc<S>,
    timeout: Duration,
}

impl<S: LedgerStore> Clone for BalanceService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S: LedgerStore> BalanceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_timeout(store, DEFAULT_OPERATION_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<S>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record a signed operation for a profile, using the default deadline.
    ///
    /// Returns the amount actually recorded.
    pub async fn apply(
        &self,
        profile_id: ProfileId,
        amount: Decimal,
    ) -> Result<Decimal, BalanceError> {
        self.apply_within(profile_id, amount, self.timeout).await
    }

    /// Record a signed operation, failing with `Timeout` once `timeout` elapses.
    ///
    /// Positive amounts are credited unless the balance would leave the
    /// decimal range. Negative amounts are only recorded when the balance
    /// under the profile lock covers them.
    /// On every error path no row is written.
    pub async fn apply_within(
        &self,
        profile_id: ProfileId,
        amount: Decimal,
        timeout: Duration,
    ) -> Result<Decimal, BalanceError> {
        let result = self.apply_locked(profile_id, amount, timeout).await;

        match &result {
            Ok(recorded) => {
                tracing::info!(
                    profile_id = %profile_id,
                    amount = %recorded,
                    store = self.store.name(),
                    "Balance operation recorded"
                );
            }
            Err(BalanceError::InsufficientFunds { balance, requested }) => {
                tracing::info!(
                    profile_id = %profile_id,
                    balance = %balance,
                    requested = %requested,
                    "Debit rejected: insufficient funds"
                );
            }
            Err(e) if e.is_business() => {
                tracing::warn!(profile_id = %profile_id, code = e.code(), "Operation rejected: {}", e);
            }
            Err(e) => {
                tracing::error!(
                    profile_id = %profile_id,
                    stage = ?e.stage(),
                    store = self.store.name(),
                    "Balance operation failed: {}",
                    e
                );
            }
        }

        result
    }

    async fn apply_locked(
        &self,
        profile_id: ProfileId,
        amount: Decimal,
        timeout: Duration,
    ) -> Result<Decimal, BalanceError> {
        validate_profile(profile_id)?;
        let amount = validate_amount(amount)?;
        let operation = Operation::new(profile_id, amount);
        let deadline = Instant::now() + timeout;

        let mut unit = bounded(deadline, Stage::Begin, self.store.begin(profile_id)).await?;

        let balance = bounded(deadline, Stage::Sum, unit.sum()).await?;
        match operation.direction() {
            Direction::Debit => {
                let requested = amount.abs();
                if balance < requested {
                    // unit dropped here: lock released, nothing staged
                    return Err(BalanceError::InsufficientFunds { balance, requested });
                }
            }
            Direction::Credit => {
                if balance.checked_add(amount).is_none() {
                    return Err(BalanceError::InvalidAmount(format!(
                        "credit of {} would overflow balance {}",
                        amount, balance
                    )));
                }
            }
        }

        bounded(deadline, Stage::Append, unit.append(&operation)).await?;
        bounded(deadline, Stage::Commit, unit.commit()).await?;

        tracing::debug!(operation_id = %operation.operation_id, "Operation committed");
        Ok(amount)
    }

    /// Current balance of a profile, using the default deadline
    pub async fn current_balance(&self, profile_id: ProfileId) -> Result<Decimal, BalanceError> {
        self.current_balance_within(profile_id, self.timeout).await
    }

    /// Sum of all committed operations; zero for a profile with none.
    ///
    /// Takes no profile lock.
    pub async fn current_balance_within(
        &self,
        profile_id: ProfileId,
        timeout: Duration,
    ) -> Result<Decimal, BalanceError> {
        validate_profile(profile_id)?;
        let deadline = Instant::now() + timeout;

        bounded(deadline, Stage::Balance, self.store.sum_by_profile(profile_id))
            .await
            .map(|balance| balance.normalize())
            .inspect_err(|e| {
                tracing::error!(profile_id = %profile_id, "Balance query failed: {}", e);
            })
    }

    pub async fn health_check(&self) -> Result<(), BalanceError> {
        let deadline = Instant::now() + self.timeout;
        bounded(deadline, Stage::Health, self.store.health_check()).await
    }
}
