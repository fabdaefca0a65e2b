//! Provider response body and its conversion into a rate table.

use std::collections::HashMap;

use balances_core::{RateSourceError, RateTable};
use serde::Deserialize;

/// Provider error codes that mean the access key is missing or rejected.
const AUTH_ERROR_CODES: [i64; 3] = [101, 102, 104];

/// Body of a `/latest` response.
///
/// `rates` maps each currency to how many of its units one unit of `base`
/// buys.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRatesResponse {
    /// False when the provider refused the request.
    pub success: bool,
    /// Quote time, Unix seconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Base currency of the quotes.
    #[serde(default)]
    pub base: Option<String>,
    /// Quote date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    /// Quotes keyed by currency code.
    #[serde(default)]
    pub rates: HashMap<String, f64>,
    /// Present when `success` is false.
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// Error object of a refused request.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Numeric error code.
    #[serde(default)]
    pub code: Option<i64>,
    /// Machine-readable error type, e.g. `invalid_access_key`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Human-readable explanation.
    #[serde(default)]
    pub info: Option<String>,
}

impl ApiErrorBody {
    fn is_auth(&self) -> bool {
        self.code.is_some_and(|code| AUTH_ERROR_CODES.contains(&code))
            || self
                .kind
                .as_deref()
                .is_some_and(|kind| kind.ends_with("access_key") || kind == "inactive_user")
    }

    fn describe(&self) -> String {
        let kind = self.kind.as_deref().unwrap_or("unknown_error");
        match (&self.code, &self.info) {
            (Some(code), Some(info)) => format!("{kind} ({code}): {info}"),
            (Some(code), None) => format!("{kind} ({code})"),
            (None, Some(info)) => format!("{kind}: {info}"),
            (None, None) => kind.to_string(),
        }
    }
}

/// Turns a provider response into a rate table for `base_currency`.
///
/// Each returned value is the price of one unit of that currency in
/// base-currency units (the reciprocal of the provider's quote). Unusable
/// quotes (zero, negative, non-finite) are dropped.
///
/// # Errors
///
/// Returns `Auth` for a rejected access key, and `BadResponse` for any
/// other refusal, a mismatched base, or an empty table.
pub fn parse_response(
    response: LatestRatesResponse,
    base_currency: &str,
) -> Result<RateTable, RateSourceError> {
    if !response.success {
        return Err(match response.error {
            Some(err) if err.is_auth() => RateSourceError::Auth(err.describe()),
            Some(err) => RateSourceError::BadResponse(err.describe()),
            None => RateSourceError::BadResponse("request was not successful".to_string()),
        });
    }

    if let Some(base) = response.base.as_deref()
        && !base.eq_ignore_ascii_case(base_currency)
    {
        return Err(RateSourceError::BadResponse(format!(
            "quotes are for base {base}, requested {base_currency}"
        )));
    }

    let table: RateTable = response
        .rates
        .into_iter()
        .filter(|(_, quote)| quote.is_finite() && *quote > 0.0)
        .map(|(code, quote)| (code.to_ascii_uppercase(), reciprocal(quote)))
        .collect();

    if table.is_empty() {
        return Err(RateSourceError::BadResponse("no usable quotes".to_string()));
    }
    Ok(table)
}

#[allow(clippy::float_arithmetic)]
fn reciprocal(quote: f64) -> f64 {
    1.0 / quote
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(json: &str) -> LatestRatesResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_quotes_are_inverted() {
        let response = parse(
            r#"{
                "success": true,
                "timestamp": 1700000000,
                "base": "RUB",
                "date": "2023-11-14",
                "rates": {"USD": 0.5, "eur": 0.25, "RUB": 1.0}
            }"#,
        );

        let table = parse_response(response, "RUB").unwrap();

        assert_eq!(table["USD"], 2.0);
        assert_eq!(table["EUR"], 4.0);
        assert_eq!(table["RUB"], 1.0);
    }

    #[test]
    fn test_unusable_quotes_are_dropped() {
        let response = parse(r#"{"success": true, "base": "RUB", "rates": {"USD": 0.5, "ZZZ": 0, "NEG": -2}}"#);

        let table = parse_response(response, "RUB").unwrap();

        assert_eq!(table.len(), 1);
        assert!(table.contains_key("USD"));
    }

    #[rstest]
    #[case(r#"{"success": false, "error": {"code": 101, "type": "invalid_access_key", "info": "bad key"}}"#)]
    #[case(r#"{"success": false, "error": {"type": "missing_access_key"}}"#)]
    #[case(r#"{"success": false, "error": {"code": 104}}"#)]
    fn test_rejected_key_is_auth_error(#[case] json: &str) {
        let err = parse_response(parse(json), "RUB").unwrap_err();
        assert!(matches!(err, RateSourceError::Auth(_)), "got {err:?}");
    }

    #[rstest]
    #[case(r#"{"success": false, "error": {"code": 105, "type": "base_currency_access_restricted"}}"#)]
    #[case(r#"{"success": false}"#)]
    #[case(r#"{"success": true, "base": "EUR", "rates": {"USD": 1.1}}"#)]
    #[case(r#"{"success": true, "base": "RUB", "rates": {}}"#)]
    fn test_unusable_response_is_bad_response(#[case] json: &str) {
        let err = parse_response(parse(json), "RUB").unwrap_err();
        assert!(matches!(err, RateSourceError::BadResponse(_)), "got {err:?}");
    }

    #[test]
    fn test_error_description_includes_details() {
        let body = ApiErrorBody {
            code: Some(105),
            kind: Some("base_currency_access_restricted".to_string()),
            info: Some("upgrade your plan".to_string()),
        };
        assert_eq!(
            body.describe(),
            "base_currency_access_restricted (105): upgrade your plan"
        );
    }
}
