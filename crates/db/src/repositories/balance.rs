//! Balance repository: the PostgreSQL balance store.
//!
//! Every debit is a guarded `UPDATE ... WHERE balance >= amount`, so the
//! database refuses an overdraft instead of applying it. Transfers run both
//! updates in one database transaction.

use std::borrow::Cow;

use async_trait::async_trait;
use balances_core::{BalanceStorage, StorageError};
use balances_shared::AccountId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    RuntimeErr, Set, SqlErr, TransactionTrait, sqlx,
};
use tracing::debug;

use crate::entities::accounts_balances;

/// PostgreSQL-backed [`BalanceStorage`].
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Adds `amount` to a row.
    async fn credit<C: ConnectionTrait>(
        db: &C,
        account_id: AccountId,
        amount: i64,
    ) -> Result<(), StorageError> {
        let result = accounts_balances::Entity::update_many()
            .col_expr(
                accounts_balances::Column::Balance,
                Expr::col(accounts_balances::Column::Balance).add(amount),
            )
            .filter(accounts_balances::Column::Id.eq(account_id.into_inner()))
            .exec(db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(StorageError::not_found(account_id));
        }
        Ok(())
    }

    /// Subtracts `amount` from a row if the balance covers it.
    async fn debit<C: ConnectionTrait>(
        db: &C,
        account_id: AccountId,
        amount: i64,
    ) -> Result<(), StorageError> {
        let result = accounts_balances::Entity::update_many()
            .col_expr(
                accounts_balances::Column::Balance,
                Expr::col(accounts_balances::Column::Balance).sub(amount),
            )
            .filter(accounts_balances::Column::Id.eq(account_id.into_inner()))
            .filter(accounts_balances::Column::Balance.gte(amount))
            .exec(db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected > 0 {
            return Ok(());
        }

        // Missing row or refused by the guard.
        let exists = accounts_balances::Entity::find_by_id(account_id.into_inner())
            .one(db)
            .await
            .map_err(map_db_err)?
            .is_some();
        if exists {
            debug!(%account_id, amount, "Guarded debit refused");
            Err(StorageError::insufficient_funds(account_id))
        } else {
            Err(StorageError::not_found(account_id))
        }
    }
}

#[async_trait]
impl BalanceStorage for BalanceRepository {
    async fn exists(&self, account_id: AccountId) -> Result<bool, StorageError> {
        let row = accounts_balances::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        Ok(row.is_some())
    }

    async fn create_account(&self, account_id: AccountId) -> Result<(), StorageError> {
        let row = accounts_balances::ActiveModel {
            id: Set(account_id.into_inner()),
            balance: Set(0),
        };

        match accounts_balances::Entity::insert(row)
            .exec_without_returning(&self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(StorageError::already_exists(account_id))
            }
            Err(err) => Err(map_db_err(err)),
        }
    }

    async fn balance(&self, account_id: AccountId) -> Result<i64, StorageError> {
        accounts_balances::Entity::find_by_id(account_id.into_inner())
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(|row| row.balance)
            .ok_or(StorageError::not_found(account_id))
    }

    async fn increment(&self, account_id: AccountId, amount: i64) -> Result<(), StorageError> {
        Self::credit(&self.db, account_id, amount).await
    }

    async fn decrement(&self, account_id: AccountId, amount: i64) -> Result<(), StorageError> {
        Self::debit(&self.db, account_id, amount).await
    }

    async fn transfer(
        &self,
        sender: AccountId,
        recipient: AccountId,
        amount: i64,
    ) -> Result<(), StorageError> {
        // Dropping the transaction without commit rolls it back.
        let txn = self.db.begin().await.map_err(map_db_err)?;

        // Rows are locked in id order so opposite transfers cannot deadlock.
        if sender <= recipient {
            Self::debit(&txn, sender, amount).await?;
            Self::credit(&txn, recipient, amount).await?;
        } else {
            Self::credit(&txn, recipient, amount).await?;
            Self::debit(&txn, sender, amount).await?;
        }

        txn.commit().await.map_err(map_db_err)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.db.clone().close().await.map_err(map_db_err)
    }
}

/// SQLSTATE for `numeric_value_out_of_range` (a balance past `i64::MAX`).
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// SQLSTATE for `check_violation` (`chk_balance_non_negative`).
const CHECK_VIOLATION: &str = "23514";

/// Maps a database error onto the storage taxonomy.
///
/// Constraint violations and overflow are definite answers; everything else
/// (connection loss, lock timeouts, serialization failures) is worth retrying.
fn map_db_err(err: DbErr) -> StorageError {
    if let Some(SqlErr::UniqueConstraintViolation(msg) | SqlErr::ForeignKeyConstraintViolation(msg)) =
        err.sql_err()
    {
        return StorageError::Rejected(msg);
    }

    match sqlstate(&err).as_deref() {
        Some(NUMERIC_VALUE_OUT_OF_RANGE | CHECK_VIOLATION) => StorageError::Rejected(err.to_string()),
        _ => StorageError::backend(err.to_string()),
    }
}

fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => {
            e.code().map(Cow::into_owned)
        }
        _ => None,
    }
}
