//! Property-based tests for LedgerService.
//!
//! - Credit then read returns the credited amount
//! - Covered transfers conserve the pair total; uncovered ones change nothing
//! - Non-positive amounts never reach storage
//! - Transient failures are absorbed exactly while within the retry budget

use std::sync::Arc;

use balances_shared::AccountId;
use proptest::prelude::*;

use super::LedgerError;
use super::tests::{FlakyStorage, service_with};
use crate::storage::{BalanceStorage, MemoryStorage};

const A: AccountId = AccountId(1);
const B: AccountId = AccountId(2);

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Strategy to generate starting balances (0 to 10,000.00 in minor units).
fn starting_balance() -> impl Strategy<Value = i64> {
    0i64..1_000_000
}

/// Strategy to generate positive amounts (0.01 to 10,000.00 in minor units).
fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..1_000_000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A fresh account credited with `amount` reads back `amount`.
    #[test]
    fn prop_add_to_fresh_account_reads_back(amount in positive_amount()) {
        let (balance, created) = runtime().block_on(async {
            let store = Arc::new(MemoryStorage::new());
            let ledger = service_with(store.clone(), 3);
            ledger.add(A, amount).await.unwrap();
            (ledger.balance(A, "").await.unwrap(), store.exists(A).await.unwrap())
        });

        prop_assert!(created);
        prop_assert_eq!(balance, amount);
    }

    /// Transfers never create or destroy money.
    #[test]
    fn prop_transfer_conserves_total(
        from in starting_balance(),
        to in starting_balance(),
        amount in positive_amount(),
    ) {
        let (result, after_a, after_b) = runtime().block_on(async {
            let store = Arc::new(MemoryStorage::with_balances([(A, from), (B, to)]));
            let ledger = service_with(store.clone(), 3);
            let result = ledger.transfer(A, B, amount).await;
            (
                result,
                store.balance(A).await.unwrap(),
                store.balance(B).await.unwrap(),
            )
        });

        prop_assert_eq!(after_a + after_b, from + to);
        if amount <= from {
            prop_assert!(result.is_ok());
            prop_assert_eq!(after_a, from - amount);
            prop_assert_eq!(after_b, to + amount);
        } else {
            let is_insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
            prop_assert!(is_insufficient);
            prop_assert_eq!(after_a, from);
        }
    }

    /// Non-positive amounts are rejected before any storage mutation.
    #[test]
    fn prop_non_positive_amounts_are_rejected(amount in i64::MIN..=0) {
        let (errors, mutations) = runtime().block_on(async {
            let store = Arc::new(FlakyStorage::failing(
                MemoryStorage::with_balances([(A, 100), (B, 100)]),
                0,
            ));
            let ledger = service_with(store.clone(), 3);
            let errors = [
                ledger.add(A, amount).await.unwrap_err(),
                ledger.withdraw(A, amount).await.unwrap_err(),
                ledger.transfer(A, B, amount).await.unwrap_err(),
            ];
            (errors, store.mutations())
        });

        let expected = if amount == 0 { "ZERO_AMOUNT" } else { "NEGATIVE_AMOUNT" };
        for err in &errors {
            prop_assert_eq!(err.error_code(), expected);
        }
        prop_assert_eq!(mutations, 0);
    }

    /// `k` transient failures succeed iff `k < tries`.
    #[test]
    fn prop_failures_within_budget_are_absorbed(tries in 1u32..6, failures in 0u32..8) {
        let (result, mutations, balance) = runtime().block_on(async {
            let store = Arc::new(FlakyStorage::failing(
                MemoryStorage::with_balances([(A, 50)]),
                failures,
            ));
            let ledger = service_with(store.clone(), tries);
            let result = ledger.withdraw(A, 20).await;
            (result, store.mutations(), store.inner.balance(A).await.unwrap())
        });

        if failures < tries {
            prop_assert!(result.is_ok());
            prop_assert_eq!(mutations, failures + 1);
            prop_assert_eq!(balance, 30);
        } else {
            let is_failed = matches!(result, Err(LedgerError::OperationFailed { .. }));
            prop_assert!(is_failed);
            prop_assert_eq!(mutations, tries);
            prop_assert_eq!(balance, 50);
        }
    }
}
