//! Balance Service - append-only ledger of signed operations per profile
//!
//! A profile's balance is never stored; it is the sum of the profile's
//! ledger rows, recomputed on every read. Withdrawals are admitted only when
//! the balance, read under a profile-scoped lock, covers them.
//!
//! # Modules
//!
//! - [`ledger`] - Operation types, validation, policy service, stores
//! - [`db`] - PostgreSQL pool and schema
//! - [`gateway`] - HTTP API (axum)
//! - [`config`] - YAML configuration with env overrides
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use ledger::{
    BalanceError, BalanceService, LedgerStore, MemoryLedger, Operation, OperationId, PgLedger,
    ProfileId,
};
