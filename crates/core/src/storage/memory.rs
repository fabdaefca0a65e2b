//! In-memory balance storage.
//!
//! A single mutex serialises every call, which makes each call trivially
//! atomic. Used by tests and by the server's `memory` storage mode.

use std::collections::HashMap;

use async_trait::async_trait;
use balances_shared::AccountId;
use tokio::sync::Mutex;

use super::error::StorageError;
use super::port::BalanceStorage;

#[derive(Debug, Default)]
struct State {
    balances: HashMap<AccountId, i64>,
    closed: bool,
}

impl State {
    fn ensure_open(&self) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::backend("storage is closed"));
        }
        Ok(())
    }

    fn get(&self, account_id: AccountId) -> Result<i64, StorageError> {
        self.balances
            .get(&account_id)
            .copied()
            .ok_or(StorageError::not_found(account_id))
    }
}

/// Process-local [`BalanceStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: Mutex<State>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with the given balances.
    #[must_use]
    pub fn with_balances(balances: impl IntoIterator<Item = (AccountId, i64)>) -> Self {
        Self {
            state: Mutex::new(State {
                balances: balances.into_iter().collect(),
                closed: false,
            }),
        }
    }

    /// Overwrites a balance, creating the account if needed.
    pub async fn set_balance(&self, account_id: AccountId, balance: i64) {
        self.state.lock().await.balances.insert(account_id, balance);
    }

    /// Returns a copy of every balance.
    pub async fn snapshot(&self) -> HashMap<AccountId, i64> {
        self.state.lock().await.balances.clone()
    }
}

#[async_trait]
impl BalanceStorage for MemoryStorage {
    async fn exists(&self, account_id: AccountId) -> Result<bool, StorageError> {
        let state = self.state.lock().await;
        state.ensure_open()?;
        Ok(state.balances.contains_key(&account_id))
    }

    async fn create_account(&self, account_id: AccountId) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        if state.balances.contains_key(&account_id) {
            return Err(StorageError::already_exists(account_id));
        }
        state.balances.insert(account_id, 0);
        Ok(())
    }

    async fn balance(&self, account_id: AccountId) -> Result<i64, StorageError> {
        let state = self.state.lock().await;
        state.ensure_open()?;
        state.get(account_id)
    }

    async fn increment(&self, account_id: AccountId, amount: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let updated = state
            .get(account_id)?
            .checked_add(amount)
            .ok_or_else(|| StorageError::Rejected(format!("balance overflow on {account_id}")))?;
        state.balances.insert(account_id, updated);
        Ok(())
    }

    async fn decrement(&self, account_id: AccountId, amount: i64) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let current = state.get(account_id)?;
        if current < amount {
            return Err(StorageError::insufficient_funds(account_id));
        }
        state.balances.insert(account_id, current - amount);
        Ok(())
    }

    async fn transfer(
        &self,
        sender: AccountId,
        recipient: AccountId,
        amount: i64,
    ) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.ensure_open()?;
        let sender_balance = state.get(sender)?;
        let recipient_balance = state.get(recipient)?;
        if sender_balance < amount {
            return Err(StorageError::insufficient_funds(sender));
        }
        if sender == recipient {
            return Ok(());
        }
        let credited = recipient_balance
            .checked_add(amount)
            .ok_or_else(|| StorageError::Rejected(format!("balance overflow on {recipient}")))?;
        state.balances.insert(sender, sender_balance - amount);
        state.balances.insert(recipient, credited);
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.state.lock().await.closed = true;
        Ok(())
    }
}
