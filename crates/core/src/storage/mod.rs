//! Balance storage port.
//!
//! The ledger engine never talks to a database directly. It goes through
//! [`BalanceStorage`], which adapters implement for a concrete backend:
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────────┐
//! │ LedgerService│ ──▶ │ BalanceStorage │ ◀── │ MemoryStorage        │
//! │ (retry loop) │     │ (port)         │ ◀── │ BalanceRepository    │
//! └──────────────┘     └────────────────┘     └──────────────────────┘
//! ```

mod error;
mod memory;
mod port;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use port::BalanceStorage;
