//! Balances table.
//!
//! One row per account. The CHECK constraint is the last line of defence
//! against a negative balance; guarded updates normally refuse first.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(ACCOUNTS_BALANCES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS accounts_balances CASCADE;")
            .await?;
        Ok(())
    }
}

const ACCOUNTS_BALANCES_SQL: &str = r"
-- Balances in base-currency minor units
CREATE TABLE IF NOT EXISTS accounts_balances (
    id BIGINT PRIMARY KEY,
    balance BIGINT NOT NULL DEFAULT 0,
    CONSTRAINT chk_balance_non_negative CHECK (balance >= 0)
);
";
