//! Schema tool for the balances store.
//!
//! Manages the single `accounts_balances` table (`id`, `balance`, with the
//! non-negative balance CHECK). The server applies pending migrations on
//! start when `storage.kind = "postgres"`; this binary is for running them
//! ahead of a deploy or resetting a test database.
//!
//! Connects to `DATABASE_URL` (or `-u <url>`):
//!
//! ```text
//! migrator status   # applied / pending
//! migrator up       # create accounts_balances
//! migrator down     # drop it
//! migrator fresh    # drop everything, then up
//! ```

use balances_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    cli::run_cli(Migrator).await;
}
