//! Core business logic for the balances service.
//!
//! This crate contains the ledger engine and its collaborators, with ZERO web
//! or database dependencies. Storage and exchange rates are reached through
//! the ports defined here and implemented by adapter crates.
//!
//! # Modules
//!
//! - `ledger` - Validated, retrying credit/debit/transfer operations
//! - `currency` - Exchange rate cache and the rate source port
//! - `storage` - Balance storage port and an in-memory implementation

pub mod currency;
pub mod ledger;
pub mod storage;

pub use currency::{CurrencyCache, RatePolicy, RateSource, RateSourceError, RateTable};
pub use ledger::{AccountRole, LedgerError, LedgerService, Operation};
pub use storage::{BalanceStorage, MemoryStorage, StorageError};
