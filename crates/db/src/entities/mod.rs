//! `SeaORM` entities.

pub mod accounts_balances;
