//! Exchange rate provider client.
//!
//! Implements the core [`RateSource`](balances_core::RateSource) port over
//! HTTP against an exchangeratesapi.io compatible `/latest` endpoint.

pub mod client;
pub mod response;

pub use client::ExchangeRatesApiClient;
pub use response::{ApiErrorBody, LatestRatesResponse, parse_response};
