//! Exchange rate caching using Moka.
//!
//! Conversions are served from memory. A miss triggers one fetch of the whole
//! rate table for the base currency, after which the lookup is retried once.
//! Lookups of cached currencies never wait on a fetch in progress, and two
//! concurrent misses may both fetch (the later insert wins).

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::source::{RateSource, RateSourceError};
use crate::ledger::LedgerError;

/// Upper bound on distinct cached currencies.
const MAX_CACHED_CURRENCIES: u64 = 1_024;

/// Default deadline for one rate fetch (10 seconds).
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// How long rates are kept and how long a fetch may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    /// Lifetime of a cached rate. `None` keeps it for the life of the process.
    pub ttl: Option<Duration>,
    /// Deadline for one fetch from the rate source.
    pub fetch_timeout: Duration,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            ttl: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Cache of exchange rates for one base currency.
///
/// Cheap to clone; clones share the same rate map.
#[derive(Clone)]
pub struct CurrencyCache {
    base_currency: String,
    source: Arc<dyn RateSource>,
    rates: Cache<String, f64>,
    fetch_timeout: Duration,
    cancel: CancellationToken,
}

impl CurrencyCache {
    /// Creates an empty cache in front of `source`.
    ///
    /// # Arguments
    ///
    /// * `base_currency` - Currency every stored balance is denominated in
    /// * `source` - Where rates are fetched from on a miss
    /// * `policy` - Expiry and fetch deadline
    /// * `cancel` - Aborts in-flight fetches on shutdown
    #[must_use]
    pub fn new(
        base_currency: &str,
        source: Arc<dyn RateSource>,
        policy: RatePolicy,
        cancel: CancellationToken,
    ) -> Self {
        let mut builder = Cache::builder().max_capacity(MAX_CACHED_CURRENCIES);
        if let Some(ttl) = policy.ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            base_currency: normalize(base_currency),
            source,
            rates: builder.build(),
            fetch_timeout: policy.fetch_timeout,
            cancel,
        }
    }

    /// Returns the base currency code (upper case).
    #[must_use]
    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Converts `amount` base minor units into `target_currency`.
    ///
    /// An empty target or the base currency returns `amount` unchanged without
    /// touching the cache. The result is truncated toward zero.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::RateUnavailable` if the fetch fails or the
    /// provider has no quote for `target_currency`.
    pub async fn convert(&self, amount: i64, target_currency: &str) -> Result<i64, LedgerError> {
        let code = normalize(target_currency);
        if code.is_empty() || code == self.base_currency {
            return Ok(amount);
        }

        if let Some(rate) = self.rates.get(&code) {
            return Ok(apply_rate(amount, rate));
        }

        debug!(currency = %code, "Rate cache miss");
        if let Err(e) = self.refresh().await {
            warn!(currency = %code, error = %e, "Failed to fetch exchange rates");
            return Err(LedgerError::RateUnavailable { currency: code });
        }

        match self.rates.get(&code) {
            Some(rate) => Ok(apply_rate(amount, rate)),
            None => {
                warn!(currency = %code, base = %self.base_currency, "No exchange rate for currency");
                Err(LedgerError::RateUnavailable { currency: code })
            }
        }
    }

    /// Fetches the full rate table and stores every usable quote.
    ///
    /// Returns the number of quotes stored. Non-finite and non-positive
    /// quotes are skipped.
    ///
    /// # Errors
    ///
    /// Returns the source error, `Timeout` past the fetch deadline, or
    /// `Cancelled` once the service is shutting down.
    pub async fn refresh(&self) -> Result<usize, RateSourceError> {
        let fetch = tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch_rates(&self.base_currency),
        );

        let table = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(RateSourceError::Cancelled),
            result = fetch => result.map_err(|_| RateSourceError::Timeout)??,
        };

        let mut stored = 0;
        for (code, rate) in table {
            if !rate.is_finite() || rate <= 0.0 {
                debug!(currency = %code, rate, "Skipping unusable quote");
                continue;
            }
            self.rates.insert(normalize(&code), rate);
            stored += 1;
        }

        debug!(base = %self.base_currency, stored, "Exchange rates refreshed");
        Ok(stored)
    }

    /// Returns the cached quote for a currency, if any.
    #[must_use]
    pub fn cached_rate(&self, currency: &str) -> Option<f64> {
        self.rates.get(&normalize(currency))
    }

    /// Drops every cached quote; the next conversion refetches.
    pub fn invalidate_all(&self) {
        self.rates.invalidate_all();
    }

    /// Returns the number of cached quotes.
    ///
    /// Moka updates this lazily; call [`run_pending_tasks`](Self::run_pending_tasks)
    /// first for an exact count.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.rates.entry_count()
    }

    /// Runs cache maintenance tasks.
    pub fn run_pending_tasks(&self) {
        self.rates.run_pending_tasks();
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[allow(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
fn apply_rate(amount: i64, rate: f64) -> i64 {
    (amount as f64 / rate) as i64
}
