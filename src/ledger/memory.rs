//! In-process ledger store
//!
//! Each profile has its own slot: an async mutex that plays the role of the
//! profile lock, and the committed rows behind a short-lived `RwLock`.
//! Balance reads only touch the rows, so they never wait on an open unit.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::error::StoreError;
use super::store::{LedgerStore, ProfileUnit};
use super::types::{Operation, ProfileId};

#[derive(Default)]
struct ProfileSlot {
    lock: Arc<Mutex<()>>,
    rows: RwLock<Vec<Operation>>,
}

impl ProfileSlot {
    fn committed_sum(&self) -> Result<Decimal, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::Unavailable("profile rows lock poisoned".to_string()))?;
        rows.iter()
            .try_fold(Decimal::ZERO, |acc, op| acc.checked_add(op.amount))
            .ok_or_else(|| StoreError::Overflow(format!("sum of {} rows", rows.len())))
    }
}

type Profiles = Arc<DashMap<ProfileId, Arc<ProfileSlot>>>;

/// Ledger kept in memory; lost on restart
#[derive(Default)]
pub struct MemoryLedger {
    profiles: Profiles,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, profile_id: ProfileId) -> Arc<ProfileSlot> {
        // Clone out so no shard guard is held across an await
        self.profiles.entry(profile_id).or_default().clone()
    }

    /// Committed operations of a profile, oldest first
    pub fn operations(&self, profile_id: ProfileId) -> Vec<Operation> {
        match self.profiles.get(&profile_id) {
            Some(slot) => slot.rows.read().map(|r| r.clone()).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    pub fn operation_count(&self, profile_id: ProfileId) -> usize {
        self.operations(profile_id).len()
    }

    /// Profiles with a slot: committed rows or a unit open or waiting
    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }
}

/// Unit of work over one profile slot
pub struct MemoryUnit {
    profiles: Profiles,
    profile_id: ProfileId,
    slot: Arc<ProfileSlot>,
    staged: Vec<Operation>,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for MemoryUnit {
    /// Release the slot of a profile that never committed a row, unless
    /// another unit is already waiting on it. Slot clones are only taken
    /// under the shard lock that `remove_if` holds, so the count is stable.
    fn drop(&mut self) {
        self.profiles.remove_if(&self.profile_id, |_, slot| {
            Arc::strong_count(slot) == 2
                && slot.rows.read().map(|rows| rows.is_empty()).unwrap_or(false)
        });
    }
}

#[async_trait]
impl ProfileUnit for MemoryUnit {
    async fn sum(&mut self) -> Result<Decimal, StoreError> {
        self.slot.committed_sum()
    }

    async fn append(&mut self, operation: &Operation) -> Result<(), StoreError> {
        self.staged.push(operation.clone());
        Ok(())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        let mut rows = self
            .slot
            .rows
            .write()
            .map_err(|_| StoreError::Unavailable("profile rows lock poisoned".to_string()))?;

        let now = Utc::now();
        rows.extend(std::mem::take(&mut self.staged).into_iter().map(|mut op| {
            op.created_at = Some(now);
            op
        }));
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    type Unit = MemoryUnit;

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self, profile_id: ProfileId) -> Result<MemoryUnit, StoreError> {
        let slot = self.slot(profile_id);
        let guard = slot.lock.clone().lock_owned().await;
        Ok(MemoryUnit {
            profiles: Arc::clone(&self.profiles),
            profile_id,
            slot,
            staged: Vec::new(),
            _guard: guard,
        })
    }

    async fn sum_by_profile(&self, profile_id: ProfileId) -> Result<Decimal, StoreError> {
        match self.profiles.get(&profile_id) {
            Some(slot) => slot.committed_sum(),
            None => Ok(Decimal::ZERO),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use uuid::Uuid;

    fn profile() -> ProfileId {
        ProfileId::new(Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_unknown_profile_sums_to_zero() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.sum_by_profile(profile()).await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_commit_makes_rows_visible() {
        let ledger = MemoryLedger::new();
        let id = profile();

        let mut unit = ledger.begin(id).await.unwrap();
        unit.append(&Operation::new(id, dec!(100.9))).await.unwrap();
        assert_eq!(ledger.sum_by_profile(id).await.unwrap(), Decimal::ZERO);
        unit.commit().await.unwrap();

        assert_eq!(ledger.sum_by_profile(id).await.unwrap(), dec!(100.9));
        let ops = ledger.operations(id);
        assert_eq!(ops.len(), 1);
        assert!(ops[0].created_at.is_some());
    }

    #[tokio::test]
    async fn test_dropped_unit_discards_append() {
        let ledger = MemoryLedger::new();
        let id = profile();

        {
            let mut unit = ledger.begin(id).await.unwrap();
            unit.append(&Operation::new(id, dec!(5))).await.unwrap();
        }

        assert_eq!(ledger.operation_count(id), 0);
        // Lock was released by the drop
        let unit = ledger.begin(id).await.unwrap();
        unit.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_same_profile_units_serialize() {
        let ledger = MemoryLedger::new();
        let id = profile();

        let first = ledger.begin(id).await.unwrap();
        let second = tokio::time::timeout(Duration::from_millis(50), ledger.begin(id)).await;
        assert!(second.is_err(), "second unit must wait for the first");

        drop(first);
        let second = tokio::time::timeout(Duration::from_millis(50), ledger.begin(id)).await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_other_profiles_do_not_block() {
        let ledger = MemoryLedger::new();
        let _held = ledger.begin(profile()).await.unwrap();

        let other = tokio::time::timeout(Duration::from_millis(50), ledger.begin(profile())).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_on_open_unit() {
        let ledger = MemoryLedger::new();
        let id = profile();
        let _held = ledger.begin(id).await.unwrap();

        let read = tokio::time::timeout(Duration::from_millis(50), ledger.sum_by_profile(id)).await;
        assert_eq!(read.unwrap().unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_sum_beyond_decimal_range_is_an_error() {
        let ledger = MemoryLedger::new();
        let id = profile();

        let mut unit = ledger.begin(id).await.unwrap();
        unit.append(&Operation::new(id, Decimal::MAX)).await.unwrap();
        unit.append(&Operation::new(id, Decimal::MAX)).await.unwrap();
        unit.commit().await.unwrap();

        let err = ledger.sum_by_profile(id).await.unwrap_err();
        assert!(matches!(err, StoreError::Overflow(_)));

        let mut unit = ledger.begin(id).await.unwrap();
        assert!(matches!(unit.sum().await, Err(StoreError::Overflow(_))));
    }

    #[tokio::test]
    async fn test_uncommitted_units_leave_no_slot() {
        let ledger = MemoryLedger::new();

        for _ in 0..100 {
            let id = profile();
            let mut unit = ledger.begin(id).await.unwrap();
            unit.sum().await.unwrap();
        }
        assert_eq!(ledger.profile_count(), 0);

        let id = profile();
        let mut unit = ledger.begin(id).await.unwrap();
        unit.append(&Operation::new(id, dec!(1))).await.unwrap();
        unit.commit().await.unwrap();
        assert_eq!(ledger.profile_count(), 1);
    }

    #[tokio::test]
    async fn test_waiting_unit_keeps_slot() {
        let ledger = Arc::new(MemoryLedger::new());
        let id = profile();

        let first = ledger.begin(id).await.unwrap();
        let waiter = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                let mut unit = ledger.begin(id).await.unwrap();
                unit.append(&Operation::new(id, dec!(7))).await.unwrap();
                unit.commit().await.unwrap();
            })
        };
        // Let the waiter queue on the profile lock
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(first);

        waiter.await.unwrap();
        assert_eq!(ledger.sum_by_profile(id).await.unwrap(), dec!(7));
        assert_eq!(ledger.profile_count(), 1);
    }
}
