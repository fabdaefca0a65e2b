//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Liveness report.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the process answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Currency balances are stored in.
    pub base_currency: String,
    /// Exchange rates currently cached (approximate).
    pub cached_rates: u64,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.ledger.cache();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        base_currency: cache.base_currency().to_string(),
        cached_rates: cache.entry_count(),
    })
}

/// Creates health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
