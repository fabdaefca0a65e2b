//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The PostgreSQL implementation of the balance storage port
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::BalanceRepository;

use std::time::Duration;

use balances_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

/// Establishes a connection pool to the database.
///
/// The first connection is pinged, and the whole attempt is repeated up to
/// `connect_attempts` times with `connect_retry_delay_secs` in between.
///
/// # Errors
///
/// Returns the last error if no attempt succeeds.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    let attempts = config.connect_attempts.max(1);
    let delay = Duration::from_secs(config.connect_retry_delay_secs);

    let mut attempt = 1;
    loop {
        match try_connect(options.clone()).await {
            Ok(db) => {
                info!(attempt, "Connected to database");
                return Ok(db);
            }
            Err(err) if attempt < attempts => {
                warn!(attempt, attempts, error = %err, "Database not reachable, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn try_connect(options: ConnectOptions) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(options).await?;
    db.ping().await?;
    Ok(db)
}
