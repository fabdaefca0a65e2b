//! Balance ledger.
//!
//! This module implements the ledger engine:
//! - Amount validation
//! - Check-then-act mutations with bounded retries
//! - Balance reads converted through the currency cache
//! - The closed error taxonomy returned to callers

pub mod error;
mod retry;
pub mod service;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use error::{AccountRole, LedgerError, Operation};
pub use service::LedgerService;
pub use validation::validate_amount;
