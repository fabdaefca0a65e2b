//! Exchange rate source port.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Quotes keyed by currency code.
///
/// Each value is the price of one unit of that currency in base-currency
/// units, so an amount of base minor units converts as `amount / rate`.
pub type RateTable = HashMap<String, f64>;

/// Errors from fetching exchange rates.
#[derive(Debug, Error)]
pub enum RateSourceError {
    /// Request could not be sent or the connection failed.
    #[error("rate request failed: {0}")]
    Network(String),

    /// Response was not a usable rate table.
    #[error("bad rate response: {0}")]
    BadResponse(String),

    /// Provider rejected the credentials.
    #[error("rate provider rejected credentials: {0}")]
    Auth(String),

    /// Request exceeded its deadline.
    #[error("rate request timed out")]
    Timeout,

    /// Request was abandoned because the service is shutting down.
    #[error("rate request cancelled")]
    Cancelled,
}

/// Port for exchange rate providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches every quote the provider has for `base_currency`.
    async fn fetch_rates(&self, base_currency: &str) -> Result<RateTable, RateSourceError>;
}
