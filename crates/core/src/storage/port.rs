//! The storage port consumed by the ledger engine.

use async_trait::async_trait;
use balances_shared::AccountId;

use super::error::StorageError;

/// Transactional store of `account → balance` in base-currency minor units.
///
/// Every method is a single atomic statement or transaction. Implementations
/// must guarantee:
/// - a failed call leaves no partial effect;
/// - [`decrement`](Self::decrement) and [`transfer`](Self::transfer) never leave
///   a balance negative, answering [`StorageError::InsufficientFunds`] instead;
/// - [`transfer`](Self::transfer) applies both sides or neither.
#[async_trait]
pub trait BalanceStorage: Send + Sync {
    /// Returns whether the account has a row.
    async fn exists(&self, account_id: AccountId) -> Result<bool, StorageError>;

    /// Opens an account with a zero balance.
    async fn create_account(&self, account_id: AccountId) -> Result<(), StorageError>;

    /// Reads the raw balance.
    async fn balance(&self, account_id: AccountId) -> Result<i64, StorageError>;

    /// Adds `amount` to the balance.
    async fn increment(&self, account_id: AccountId, amount: i64) -> Result<(), StorageError>;

    /// Subtracts `amount` from the balance.
    async fn decrement(&self, account_id: AccountId, amount: i64) -> Result<(), StorageError>;

    /// Moves `amount` from `sender` to `recipient` atomically.
    async fn transfer(
        &self,
        sender: AccountId,
        recipient: AccountId,
        amount: i64,
    ) -> Result<(), StorageError>;

    /// Releases the backend's resources.
    async fn close(&self) -> Result<(), StorageError>;
}
