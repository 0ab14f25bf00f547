//! Balance ledger
//!
//! Append-only storage of signed operations per profile, and the policy
//! that decides which operations are admitted.
//!
//! - [`types`] - `Operation`, `ProfileId`, `OperationId`
//! - [`validation`] - Input checks shared by gateway and service
//! - [`service`] - `BalanceService`: apply / current_balance
//! - [`store`] - `LedgerStore` / `ProfileUnit` contract
//! - [`postgres`] - PostgreSQL store
//! - [`memory`] - In-process store

pub mod error;
pub mod memory;
pub mod postgres;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

pub use error::{BalanceError, Stage, StoreError};
pub use memory::MemoryLedger;
pub use postgres::PgLedger;
pub use service::{BalanceService, DEFAULT_OPERATION_TIMEOUT};
pub use store::{LedgerStore, ProfileUnit};
pub use types::{Direction, Operation, OperationId, ProfileId};
pub use validation::{parse_amount, parse_profile_id, validate_amount, validate_profile};
