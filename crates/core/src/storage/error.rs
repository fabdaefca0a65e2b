//! Storage error types.

use balances_shared::AccountId;
use thiserror::Error;

/// Storage operation errors.
///
/// A failed call is assumed to have applied nothing. Only [`StorageError::Backend`]
/// is transient; every other variant is a definite answer from the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No row for the account.
    #[error("account not found: {account_id}")]
    NotFound {
        /// Account that was not found.
        account_id: AccountId,
    },

    /// Row already exists.
    #[error("account already exists: {account_id}")]
    AlreadyExists {
        /// Account that already exists.
        account_id: AccountId,
    },

    /// Guarded update refused to drive the balance negative.
    #[error("insufficient funds on account {account_id}")]
    InsufficientFunds {
        /// Account that would have gone negative.
        account_id: AccountId,
    },

    /// Store rejected the change for a reason a retry cannot fix.
    #[error("storage rejected operation: {0}")]
    Rejected(String),

    /// Connection, lock or statement failure.
    #[error("storage operation failed: {0}")]
    Backend(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub const fn not_found(account_id: AccountId) -> Self {
        Self::NotFound { account_id }
    }

    /// Create an already exists error.
    #[must_use]
    pub const fn already_exists(account_id: AccountId) -> Self {
        Self::AlreadyExists { account_id }
    }

    /// Create an insufficient funds error.
    #[must_use]
    pub const fn insufficient_funds(account_id: AccountId) -> Self {
        Self::InsufficientFunds { account_id }
    }

    /// Create a backend error.
    #[must_use]
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_backend_is_transient() {
        let id = AccountId(1);
        assert!(StorageError::backend("deadlock detected").is_transient());
        assert!(!StorageError::not_found(id).is_transient());
        assert!(!StorageError::already_exists(id).is_transient());
        assert!(!StorageError::insufficient_funds(id).is_transient());
        assert!(!StorageError::Rejected("overflow".into()).is_transient());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StorageError::not_found(AccountId(9)).to_string(),
            "account not found: 9"
        );
        assert_eq!(
            StorageError::backend("connection reset").to_string(),
            "storage operation failed: connection reset"
        );
    }
}
