//! Amount validation shared by every mutating operation.

use std::cmp::Ordering;

use super::error::{LedgerError, Operation};

/// Validates that an amount of minor units is strictly positive.
///
/// # Errors
///
/// Returns `NegativeAmount` for `amount < 0` and `ZeroAmount` for `amount == 0`.
pub fn validate_amount(operation: Operation, amount: i64) -> Result<(), LedgerError> {
    match amount.cmp(&0) {
        Ordering::Less => Err(LedgerError::NegativeAmount { operation }),
        Ordering::Equal => Err(LedgerError::ZeroAmount { operation }),
        Ordering::Greater => Ok(()),
    }
}
