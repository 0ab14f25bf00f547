//! Ledger store contract
//!
//! The service never writes outside a [`ProfileUnit`]. A unit holds the
//! profile's mutation lock from `begin` until it is committed or dropped, so
//! a debit's read-compare-append sequence cannot interleave with another
//! mutation of the same profile.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::error::StoreError;
use super::types::{Operation, ProfileId};

/// Profile-scoped unit of work.
///
/// Dropping a unit without calling [`commit`](ProfileUnit::commit) discards
/// anything appended through it.
#[async_trait]
pub trait ProfileUnit: Send {
    /// Balance of the profile as seen under the lock
    async fn sum(&mut self) -> Result<Decimal, StoreError>;

    /// Stage one operation; durable only after `commit`
    async fn append(&mut self, operation: &Operation) -> Result<(), StoreError>;

    /// Make staged operations durable and release the profile lock
    async fn commit(self) -> Result<(), StoreError>;
}

/// Durable, append-only storage of ledger operations
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Unit: ProfileUnit + 'static;

    /// Get backend name for logging
    fn name(&self) -> &'static str;

    /// Open a unit of work holding the mutation lock for `profile_id`.
    ///
    /// Waits while another unit for the same profile is open. Units for
    /// different profiles never wait on each other.
    async fn begin(&self, profile_id: ProfileId) -> Result<Self::Unit, StoreError>;

    /// Sum of all committed operations for `profile_id`; zero if none
    async fn sum_by_profile(&self, profile_id: ProfileId) -> Result<Decimal, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}
