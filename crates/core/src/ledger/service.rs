//! Ledger service: validated, retrying balance operations.
//!
//! Mutations follow a check-then-act sequence against the storage port:
//!
//! 1. Validate the amount
//! 2. Check the accounts exist (Add opens a missing account instead)
//! 3. Check the debited account can cover the amount (Withdraw, Transfer)
//! 4. Attempt the mutation up to the configured number of tries
//!
//! The sufficiency check is not held across the mutation. Storage guards
//! every debit itself, and after a failed debit attempt the balance is
//! checked again so a drained account fails fast with `InsufficientFunds`
//! instead of spending the rest of the budget.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use balances_shared::{AccountId, AppResult, LedgerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::{AccountRole, LedgerError, Operation};
use super::retry::{AttemptError, guarded};
use super::validation::validate_amount;
use crate::currency::CurrencyCache;
use crate::storage::{BalanceStorage, StorageError};

/// Attempt budget per mutating operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tries {
    add: u32,
    withdraw: u32,
    transfer: u32,
}

/// The debited side of a mutation, rechecked between attempts.
#[derive(Debug, Clone, Copy)]
struct Debit {
    account_id: AccountId,
    role: AccountRole,
    amount: i64,
}

/// One mutation handed to the retry loop.
#[derive(Debug, Clone, Copy)]
struct Mutation<'a> {
    operation: Operation,
    tries: u32,
    debit: Option<Debit>,
    accounts: &'a [(AccountId, AccountRole)],
}

impl Mutation<'_> {
    fn role_of(&self, account_id: AccountId) -> AccountRole {
        self.accounts
            .iter()
            .find(|(id, _)| *id == account_id)
            .map_or(AccountRole::Account, |(_, role)| *role)
    }
}

/// Ledger service.
///
/// Owns one storage handle and one currency cache. Safe to share between
/// request handlers behind an `Arc`; operations on the same account are not
/// serialised here.
pub struct LedgerService {
    storage: Arc<dyn BalanceStorage>,
    cache: CurrencyCache,
    tries: Tries,
    retry_delay: Duration,
    call_timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl LedgerService {
    /// Creates a ledger service.
    ///
    /// # Arguments
    ///
    /// * `storage` - Balance store
    /// * `cache` - Converts balances for reads
    /// * `config` - Retry budgets and per-call deadline
    /// * `cancel` - Stops in-flight storage calls and retry loops on shutdown
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if any retry budget is zero.
    pub fn new(
        storage: Arc<dyn BalanceStorage>,
        cache: CurrencyCache,
        config: &LedgerConfig,
        cancel: CancellationToken,
    ) -> AppResult<Self> {
        config.validate()?;

        Ok(Self {
            storage,
            cache,
            tries: Tries {
                add: config.add_tries,
                withdraw: config.withdraw_tries,
                transfer: config.transfer_tries,
            },
            retry_delay: config.retry_delay(),
            call_timeout: config.call_timeout(),
            cancel,
        })
    }

    /// Returns the currency cache used for balance reads.
    #[must_use]
    pub fn cache(&self) -> &CurrencyCache {
        &self.cache
    }

    /// Returns an account's balance converted to `currency`.
    ///
    /// An empty `currency` or the base currency returns the stored amount.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchAccount` for an unknown account, `RateUnavailable` if
    /// the conversion cannot be resolved, and `OperationFailed` on storage
    /// failure.
    pub async fn balance(&self, account_id: AccountId, currency: &str) -> Result<i64, LedgerError> {
        let operation = Operation::Balance;
        self.require(operation, account_id, AccountRole::Account).await?;

        let raw = self
            .call(self.storage.balance(account_id))
            .await
            .map_err(|e| self.read_failure(operation, AccountRole::Account, e))?;

        self.cache.convert(raw, currency).await
    }

    /// Credits an account, opening it at zero first if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount and
    /// `OperationFailed` once the retry budget is exhausted.
    pub async fn add(&self, account_id: AccountId, amount: i64) -> Result<(), LedgerError> {
        let operation = Operation::Add;
        validate_amount(operation, amount)?;

        if !self.exists(operation, account_id).await? {
            self.open(operation, account_id).await?;
        }

        let accounts = [(account_id, AccountRole::Account)];
        let plan = Mutation {
            operation,
            tries: self.tries.add,
            debit: None,
            accounts: &accounts,
        };
        self.mutate(plan, || self.storage.increment(account_id, amount)).await?;

        debug!(%account_id, amount, "Account credited");
        Ok(())
    }

    /// Debits an account.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount, `NoSuchAccount`
    /// for an unknown account, `InsufficientFunds` if the balance cannot
    /// cover the amount (before or between attempts), and `OperationFailed`
    /// once the retry budget is exhausted.
    pub async fn withdraw(&self, account_id: AccountId, amount: i64) -> Result<(), LedgerError> {
        let operation = Operation::Withdraw;
        validate_amount(operation, amount)?;

        let debit = Debit {
            account_id,
            role: AccountRole::Account,
            amount,
        };
        self.require(operation, account_id, AccountRole::Account).await?;
        self.ensure_sufficient(operation, debit).await?;

        let accounts = [(account_id, AccountRole::Account)];
        let plan = Mutation {
            operation,
            tries: self.tries.withdraw,
            debit: Some(debit),
            accounts: &accounts,
        };
        self.mutate(plan, || self.storage.decrement(account_id, amount)).await?;

        debug!(%account_id, amount, "Account debited");
        Ok(())
    }

    /// Moves `amount` from `sender` to `recipient` atomically.
    ///
    /// `sender == recipient` is passed through to storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive amount, `NoSuchAccount`
    /// tagged with the missing side, `InsufficientFunds` if the sender cannot
    /// cover the amount (before or between attempts), and `OperationFailed`
    /// once the retry budget is exhausted.
    pub async fn transfer(
        &self,
        sender: AccountId,
        recipient: AccountId,
        amount: i64,
    ) -> Result<(), LedgerError> {
        let operation = Operation::Transfer;
        validate_amount(operation, amount)?;

        self.require(operation, sender, AccountRole::Sender).await?;
        self.require(operation, recipient, AccountRole::Recipient).await?;

        let debit = Debit {
            account_id: sender,
            role: AccountRole::Sender,
            amount,
        };
        self.ensure_sufficient(operation, debit).await?;

        let accounts = [
            (sender, AccountRole::Sender),
            (recipient, AccountRole::Recipient),
        ];
        let plan = Mutation {
            operation,
            tries: self.tries.transfer,
            debit: Some(debit),
            accounts: &accounts,
        };
        self.mutate(plan, || self.storage.transfer(sender, recipient, amount)).await?;

        debug!(%sender, %recipient, amount, "Transfer applied");
        Ok(())
    }

    /// Cancels in-flight work and closes the storage handle.
    ///
    /// # Errors
    ///
    /// Returns the storage error if closing fails.
    pub async fn close(&self) -> Result<(), StorageError> {
        self.cancel.cancel();
        self.storage.close().await
    }

    // ---------------------------------------------------------------------
    // Storage helpers
    // ---------------------------------------------------------------------

    async fn call<T, F>(&self, call: F) -> Result<T, AttemptError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        guarded(&self.cancel, self.call_timeout, call).await
    }

    async fn exists(
        &self,
        operation: Operation,
        account_id: AccountId,
    ) -> Result<bool, LedgerError> {
        self.call(self.storage.exists(account_id))
            .await
            .map_err(|e| self.failure(operation, &e))
    }

    async fn require(
        &self,
        operation: Operation,
        account_id: AccountId,
        role: AccountRole,
    ) -> Result<(), LedgerError> {
        if self.exists(operation, account_id).await? {
            Ok(())
        } else {
            Err(LedgerError::no_such_account(account_id, role))
        }
    }

    async fn open(&self, operation: Operation, account_id: AccountId) -> Result<(), LedgerError> {
        match self.call(self.storage.create_account(account_id)).await {
            Ok(()) => {
                info!(%account_id, "Account opened");
                Ok(())
            }
            // A concurrent credit opened it first.
            Err(AttemptError::Storage(StorageError::AlreadyExists { .. })) => Ok(()),
            Err(e) => Err(self.failure(operation, &e)),
        }
    }

    async fn ensure_sufficient(
        &self,
        operation: Operation,
        debit: Debit,
    ) -> Result<(), LedgerError> {
        let balance = self
            .call(self.storage.balance(debit.account_id))
            .await
            .map_err(|e| self.read_failure(operation, debit.role, e))?;

        if balance < debit.amount {
            debug!(
                account_id = %debit.account_id,
                balance,
                amount = debit.amount,
                "Insufficient funds"
            );
            return Err(LedgerError::InsufficientFunds {
                account_id: debit.account_id,
            });
        }
        Ok(())
    }

    /// Runs `attempt` until it succeeds, a permanent error occurs, the
    /// debited balance no longer covers the amount, or the budget runs out.
    async fn mutate<F, Fut>(&self, plan: Mutation<'_>, attempt: F) -> Result<(), LedgerError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<(), StorageError>>,
    {
        for n in 1..=plan.tries {
            if self.cancel.is_cancelled() {
                warn!(operation = %plan.operation, attempt = n, "Retry loop cancelled");
                return Err(LedgerError::operation_failed(plan.operation));
            }

            let err = match self.call(attempt()).await {
                Ok(()) => {
                    if n > 1 {
                        info!(
                            operation = %plan.operation,
                            attempt = n,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Err(e) => e,
            };

            // A guarded debit refused by storage: the balance moved under us.
            let refused = plan.debit.is_some()
                && matches!(err, AttemptError::Storage(StorageError::InsufficientFunds { .. }));
            if !err.is_retryable() && !refused {
                return Err(self.permanent_failure(&plan, err));
            }

            warn!(
                operation = %plan.operation,
                attempt = n,
                tries = plan.tries,
                error = %err,
                "Storage attempt failed"
            );

            if let Some(debit) = plan.debit
                && (n < plan.tries || refused)
            {
                self.ensure_sufficient(plan.operation, debit).await?;
            }

            if n < plan.tries && !self.pause().await {
                warn!(operation = %plan.operation, attempt = n, "Retry loop cancelled");
                return Err(LedgerError::operation_failed(plan.operation));
            }
        }

        error!(operation = %plan.operation, tries = plan.tries, "Retry budget exhausted");
        Err(LedgerError::operation_failed(plan.operation))
    }

    /// Waits out the retry delay. Returns false if cancelled meanwhile.
    async fn pause(&self) -> bool {
        if self.retry_delay.is_zero() {
            return !self.cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(self.retry_delay) => true,
        }
    }

    // ---------------------------------------------------------------------
    // Error mapping
    // ---------------------------------------------------------------------

    fn failure(&self, operation: Operation, cause: &AttemptError) -> LedgerError {
        error!(
            %operation,
            error = %cause,
            cancelled = self.cancel.is_cancelled(),
            "Storage call failed"
        );
        LedgerError::operation_failed(operation)
    }

    fn read_failure(
        &self,
        operation: Operation,
        role: AccountRole,
        cause: AttemptError,
    ) -> LedgerError {
        match cause {
            AttemptError::Storage(StorageError::NotFound { account_id }) => {
                LedgerError::no_such_account(account_id, role)
            }
            other => self.failure(operation, &other),
        }
    }

    fn permanent_failure(&self, plan: &Mutation<'_>, cause: AttemptError) -> LedgerError {
        match cause {
            AttemptError::Storage(StorageError::NotFound { account_id }) => {
                LedgerError::no_such_account(account_id, plan.role_of(account_id))
            }
            other => self.failure(plan.operation, &other),
        }
    }
}
