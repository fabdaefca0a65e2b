//! Balance routes.
//!
//! - `GET /balance?currency=XXX` with body `{"id": n}` or `?id=n`
//! - `POST /add` `{"id", "cents_sum"}`
//! - `POST /withdraw` `{"id", "cents_sum"}`
//! - `POST /transfer` `{"sender_id", "recipient_id", "cents_sum"}`

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    routing::{get, post},
};
use balances_shared::AccountId;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

use crate::AppState;
use crate::error::ApiError;
use crate::extractors::{JsonBody, parse_json};

/// Creates the balance routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/balance", get(get_balance))
        .route("/add", post(add))
        .route("/withdraw", post(withdraw))
        .route("/transfer", post(transfer))
}

/// Query parameters for a balance read.
#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    /// Account ID; the JSON body is used when absent.
    pub id: Option<AccountId>,
    /// Currency to convert to; base currency when absent.
    pub currency: Option<String>,
}

/// Body naming one account.
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    /// Account ID.
    pub id: AccountId,
}

/// Body of a credit or debit.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Account ID.
    pub id: AccountId,
    /// Amount in base-currency minor units.
    pub cents_sum: i64,
}

/// Body of a transfer.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Debited account.
    pub sender_id: AccountId,
    /// Credited account.
    pub recipient_id: AccountId,
    /// Amount in base-currency minor units.
    pub cents_sum: i64,
}

/// Balance read result.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Balance in minor units of the requested currency.
    pub cents_sum: i64,
}

/// GET `/balance` - Read a balance, optionally converted.
async fn get_balance(
    State(state): State<AppState>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Json<BalanceResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let account_id = match query.id {
        Some(id) => id,
        None if body.is_empty() => {
            return Err(ApiError::bad_request("missing account id"));
        }
        None => parse_json::<AccountRequest>(&body)?.id,
    };
    let currency = query.currency.unwrap_or_default();

    let cents_sum = state.ledger.balance(account_id, &currency).await?;
    Ok(Json(BalanceResponse { cents_sum }))
}

/// POST `/add` - Credit an account, opening it if needed.
async fn add(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AmountRequest>,
) -> Result<Json<Value>, ApiError> {
    state.ledger.add(request.id, request.cents_sum).await?;
    info!(account_id = %request.id, cents_sum = request.cents_sum, "Funds added");
    Ok(Json(json!({})))
}

/// POST `/withdraw` - Debit an account.
async fn withdraw(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AmountRequest>,
) -> Result<Json<Value>, ApiError> {
    state.ledger.withdraw(request.id, request.cents_sum).await?;
    info!(account_id = %request.id, cents_sum = request.cents_sum, "Funds withdrawn");
    Ok(Json(json!({})))
}

/// POST `/transfer` - Move funds between two accounts.
async fn transfer(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TransferRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .ledger
        .transfer(request.sender_id, request.recipient_id, request.cents_sum)
        .await?;
    info!(
        sender_id = %request.sender_id,
        recipient_id = %request.recipient_id,
        cents_sum = request.cents_sum,
        "Funds transferred"
    );
    Ok(Json(json!({})))
}
