//! Balances API Server
//!
//! Main entry point for the balances service.

use std::sync::Arc;

use anyhow::Context;
use balances_api::{AppState, create_router};
use balances_core::{BalanceStorage, CurrencyCache, LedgerService, MemoryStorage, RatePolicy};
use balances_db::migration::{Migrator, MigratorTrait};
use balances_db::{BalanceRepository, connect};
use balances_rates::ExchangeRatesApiClient;
use balances_shared::{AppConfig, DatabaseConfig, StorageKind};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balances=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate()?;

    // Process-wide cancellation for in-flight storage calls and rate fetches
    let cancel = CancellationToken::new();

    let storage = open_storage(config.storage.kind, &config.database).await?;

    // Exchange rates
    let rates = ExchangeRatesApiClient::new(&config.rates)?;
    info!(
        url = %rates.latest_url(),
        base = %config.rates.base_currency,
        ttl_secs = config.rates.ttl_secs,
        "Rate provider configured"
    );
    let cache = CurrencyCache::new(
        &config.rates.base_currency,
        Arc::new(rates),
        RatePolicy {
            ttl: config.rates.ttl(),
            fetch_timeout: config.rates.timeout(),
        },
        cancel.clone(),
    );

    // Ledger engine
    let ledger = Arc::new(LedgerService::new(
        storage,
        cache,
        &config.ledger,
        cancel.clone(),
    )?);

    // Create router
    let app = create_router(AppState {
        ledger: Arc::clone(&ledger),
    });

    // Start server
    let addr = config.server.address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    if let Err(e) = ledger.close().await {
        warn!(error = %e, "Failed to close storage");
    }
    info!("Server stopped");

    Ok(())
}

/// Opens the configured balance store, migrating the schema for PostgreSQL.
async fn open_storage(
    kind: StorageKind,
    database: &DatabaseConfig,
) -> anyhow::Result<Arc<dyn BalanceStorage>> {
    match kind {
        StorageKind::Memory => {
            warn!("Using in-memory storage; balances are lost on exit");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageKind::Postgres => {
            let db = connect(database)
                .await
                .context("failed to connect to database")?;
            Migrator::up(&db, None)
                .await
                .context("failed to run migrations")?;
            info!("Database migrations applied");
            Ok(Arc::new(BalanceRepository::new(db)))
        }
    }
}

/// Resolves on SIGINT or SIGTERM, then cancels in-flight ledger work.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }

    info!("Shutting down");
    cancel.cancel();
}
