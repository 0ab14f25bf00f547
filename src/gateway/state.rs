use crate::ledger::{BalanceService, LedgerStore};

/// Gateway application state (shared)
pub struct AppState<S: LedgerStore> {
    /// Balance policy over the configured ledger store
    pub balance: BalanceService<S>,
    /// Build version reported by the health endpoint
    pub version: &'static str,
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(balance: BalanceService<S>) -> Self {
        Self {
            balance,
            version: env!("GIT_HASH"),
        }
    }
}
