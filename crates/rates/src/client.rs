//! HTTP client for the exchange rate provider.

use async_trait::async_trait;
use balances_core::{RateSource, RateSourceError, RateTable};
use balances_shared::{AppError, AppResult, RatesConfig};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use crate::response::{LatestRatesResponse, parse_response};

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 256;

/// [`RateSource`] backed by an exchangeratesapi.io compatible API.
#[derive(Debug, Clone)]
pub struct ExchangeRatesApiClient {
    client: Client,
    latest_url: Url,
    token: String,
}

impl ExchangeRatesApiClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Configuration` if the token is empty or the base
    /// URL is invalid, and `AppError::Internal` if the HTTP client cannot be
    /// built.
    pub fn new(config: &RatesConfig) -> AppResult<Self> {
        let token = config.token.trim();
        if token.is_empty() {
            return Err(AppError::configuration("rates API token is empty"));
        }

        let latest_url = Url::parse(&format!(
            "{}/latest",
            config.base_url.trim_end_matches('/')
        ))
        .map_err(|e| AppError::configuration(format!("invalid rates base URL: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            latest_url,
            token: token.to_string(),
        })
    }

    /// Returns the endpoint quotes are fetched from, without credentials.
    #[must_use]
    pub fn latest_url(&self) -> &Url {
        &self.latest_url
    }
}

#[async_trait]
impl RateSource for ExchangeRatesApiClient {
    async fn fetch_rates(&self, base_currency: &str) -> Result<RateTable, RateSourceError> {
        let response = self
            .client
            .get(self.latest_url.clone())
            .query(&[("access_key", self.token.as_str()), ("base", base_currency)])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RateSourceError::Auth(format!("provider answered {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            return Err(RateSourceError::BadResponse(format!(
                "provider answered {status}: {body}"
            )));
        }

        let body: LatestRatesResponse = response
            .json()
            .await
            .map_err(|e| RateSourceError::BadResponse(format!("cannot decode response: {e}")))?;

        let table = parse_response(body, base_currency)?;
        debug!(base = %base_currency, quotes = table.len(), "Fetched exchange rates");
        Ok(table)
    }
}

fn request_error(err: reqwest::Error) -> RateSourceError {
    if err.is_timeout() {
        RateSourceError::Timeout
    } else {
        // Drop the URL: it carries the access key.
        RateSourceError::Network(err.without_url().to_string())
    }
}
