//! HTTP client for a freecurrencyapi-compatible rate service.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use xrate_common::{CurrencyCatalog, CurrencyCode, CurrencyInfo, RateTable};

use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;

/// Default public endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.freecurrencyapi.com/v1";

const PROVIDER_NAME: &str = "freecurrencyapi";

/// Every response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Rate provider backed by the remote HTTP API.
pub struct HttpRateProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for HttpRateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRateProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpRateProvider {
    /// Create a provider for the given endpoint. An empty API key is rejected.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> FxResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FxError::upstream(PROVIDER_NAME, "missing API key"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FxError::upstream(PROVIDER_NAME, e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> FxResult<T> {
        let response = self
            .client
            .get(self.endpoint(path))
            .query(&[("apikey", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(|e| {
                warn!(path, error = %e.without_url(), "Rate provider request failed");
                FxError::upstream(PROVIDER_NAME, "request failed")
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(path, status = %status, "Rate provider returned error status");
            return Err(FxError::upstream(
                PROVIDER_NAME,
                format!("unexpected status {}", status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FxError::upstream(PROVIDER_NAME, e.without_url().to_string()))?;

        parse_data(&body)
    }
}

/// Decode a `{ "data": ... }` body.
fn parse_data<T: DeserializeOwned>(body: &str) -> FxResult<T> {
    serde_json::from_str::<DataEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| FxError::upstream(PROVIDER_NAME, format!("undecodable response: {}", e)))
}

/// Keep only finite, positive rates.
fn sanitize_rates(raw: BTreeMap<CurrencyCode, f64>) -> RateTable {
    raw.into_iter()
        .filter(|(code, rate)| {
            let usable = rate.is_finite() && *rate > 0.0;
            if !usable {
                debug!(currency = %code, rate, "Dropping unusable rate");
            }
            usable
        })
        .collect()
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(skip(self))]
    async fn fetch_currencies(&self) -> FxResult<CurrencyCatalog> {
        let catalog: BTreeMap<CurrencyCode, CurrencyInfo> =
            self.get_data("currencies", &[]).await?;
        debug!(count = catalog.len(), "Fetched currency list");
        Ok(catalog)
    }

    #[instrument(skip(self), fields(base = %base))]
    async fn fetch_rates(&self, base: &CurrencyCode) -> FxResult<RateTable> {
        let raw: BTreeMap<CurrencyCode, f64> = self
            .get_data("latest", &[("base_currency", base.code())])
            .await?;
        let rates = sanitize_rates(raw);
        debug!(count = rates.len(), "Fetched rate table");
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_key() {
        let result = HttpRateProvider::new(DEFAULT_BASE_URL, "  ", Duration::from_secs(1));
        assert!(matches!(result, Err(FxError::Upstream { .. })));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider =
            HttpRateProvider::new("http://localhost:9000/v1/", "key", Duration::from_secs(1))
                .unwrap();
        assert_eq!(provider.endpoint("latest"), "http://localhost:9000/v1/latest");
        assert!(!format!("{:?}", provider).contains("key\""));
    }

    #[test]
    fn test_parse_currencies_body() {
        let body = r#"{"data": {
            "EUR": {"symbol": "€", "name": "Euro", "symbol_native": "€",
                    "decimal_digits": 2, "rounding": 0, "code": "EUR", "name_plural": "Euros"},
            "JPY": {"symbol": "¥", "name": "Japanese Yen", "symbol_native": "￥",
                    "decimal_digits": 0, "rounding": 0, "code": "JPY", "name_plural": "Japanese yen"}
        }}"#;
        let catalog: CurrencyCatalog = parse_data(body).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[&CurrencyCode::eur()].name, "Euro");
        assert_eq!(catalog[&CurrencyCode::jpy()].decimal_digits, 0);
    }

    #[test]
    fn test_parse_rates_body() {
        let body = r#"{"data": {"EUR": 0.92, "GBP": 0.79, "XXX": 0, "USD": 1}}"#;
        let raw: BTreeMap<CurrencyCode, f64> = parse_data(body).unwrap();
        let rates = sanitize_rates(raw);

        assert_eq!(rates.len(), 3);
        assert_eq!(rates[&CurrencyCode::usd()], 1.0);
        assert!(!rates.contains_key(&CurrencyCode::new("XXX")));
    }

    #[test]
    fn test_parse_error_body() {
        let body = r#"{"message": "Invalid authentication credentials"}"#;
        let result: FxResult<RateTable> = parse_data(body);
        assert!(matches!(result, Err(FxError::Upstream { .. })));
    }
}
