//! `SeaORM` Entity for accounts_balances table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts_balances")]
/// One account and its balance in base-currency minor units.
pub struct Model {
    /// Account ID, chosen by the caller.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Never negative; enforced by a table constraint.
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
/// No relations.
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
