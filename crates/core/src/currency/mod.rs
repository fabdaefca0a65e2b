//! Exchange rates and balance conversion.
//!
//! Balances are stored in one base currency. Reads in another currency go
//! through [`CurrencyCache`], which fetches quotes from a [`RateSource`] on
//! the first miss and serves them from memory afterwards.

pub mod cache;
pub mod source;

pub use cache::{CurrencyCache, RatePolicy};
pub use source::{RateSource, RateSourceError, RateTable};
