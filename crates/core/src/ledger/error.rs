//! Ledger error types.
//!
//! The taxonomy is closed: callers only ever see these variants, never raw
//! storage or network errors. The underlying causes are logged where they occur.

use std::fmt;

use balances_shared::AccountId;
use thiserror::Error;

/// Ledger operation, carried by errors for context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Balance read.
    Balance,
    /// Credit.
    Add,
    /// Debit.
    Withdraw,
    /// Transfer between two accounts.
    Transfer,
}

impl Operation {
    /// Returns the lower-case operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Add => "add",
            Self::Withdraw => "withdraw",
            Self::Transfer => "transfer",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of an operation an account was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountRole {
    /// Single-account operation.
    Account,
    /// Debited side of a transfer.
    Sender,
    /// Credited side of a transfer.
    Recipient,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Account => "account",
            Self::Sender => "sender account",
            Self::Recipient => "recipient account",
        })
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount cannot be negative.
    #[error("Amount cannot be negative ({operation})")]
    NegativeAmount {
        /// Rejected operation.
        operation: Operation,
    },

    /// Amount cannot be zero.
    #[error("Amount cannot be zero ({operation})")]
    ZeroAmount {
        /// Rejected operation.
        operation: Operation,
    },

    // ========== Account Errors ==========
    /// Account does not exist and the operation does not open one.
    #[error("No such {role}: {account_id}")]
    NoSuchAccount {
        /// The missing account.
        account_id: AccountId,
        /// Side of the operation the account was on.
        role: AccountRole,
    },

    /// Balance is lower than the requested debit.
    #[error("Insufficient funds on account {account_id}")]
    InsufficientFunds {
        /// Debited account.
        account_id: AccountId,
    },

    // ========== Currency Errors ==========
    /// No exchange rate could be resolved for the currency.
    #[error("No exchange rate available for {currency}")]
    RateUnavailable {
        /// Requested currency code.
        currency: String,
    },

    // ========== Storage Errors ==========
    /// Storage did not complete the operation within its retry budget.
    #[error("Operation failed: {operation}")]
    OperationFailed {
        /// Failed operation.
        operation: Operation,
    },
}

impl LedgerError {
    /// Create a no such account error.
    #[must_use]
    pub const fn no_such_account(account_id: AccountId, role: AccountRole) -> Self {
        Self::NoSuchAccount { account_id, role }
    }

    /// Create an operation failed error.
    #[must_use]
    pub const fn operation_failed(operation: Operation) -> Self {
        Self::OperationFailed { operation }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::ZeroAmount { .. } => "ZERO_AMOUNT",
            Self::NoSuchAccount { .. } => "NO_SUCH_ACCOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::RateUnavailable { .. } => "RATE_UNAVAILABLE",
            Self::OperationFailed { .. } => "OPERATION_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::NegativeAmount { .. } | Self::ZeroAmount { .. } => 400,

            // 404 Not Found
            Self::NoSuchAccount { .. } => 404,

            // 422 Unprocessable - business rule
            Self::InsufficientFunds { .. } => 422,

            // 502 Bad Gateway - rate provider
            Self::RateUnavailable { .. } => 502,

            // 503 Service Unavailable - storage budget exhausted
            Self::OperationFailed { .. } => 503,
        }
    }

    /// Returns true if the caller may retry the same request later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OperationFailed { .. } | Self::RateUnavailable { .. }
        )
    }
}
