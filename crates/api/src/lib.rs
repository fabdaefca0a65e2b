//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for balance reads and mutations
//! - A JSON body extractor with uniform error responses
//! - Mapping of ledger errors onto HTTP responses

pub mod error;
pub mod extractors;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use balances_core::LedgerService;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Ledger engine.
    pub ledger: Arc<LedgerService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
