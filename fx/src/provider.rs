//! Rate provider trait and test double.

use async_trait::async_trait;
use xrate_common::{CurrencyCatalog, CurrencyCode, RateTable};

use crate::error::FxResult;

/// Source of the supported currency list and base-relative rates.
///
/// Implementations are pure I/O: they keep no state between calls and report
/// every failure as [`FxError::Upstream`](crate::FxError::Upstream).
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the supported currencies and their metadata.
    async fn fetch_currencies(&self) -> FxResult<CurrencyCatalog>;

    /// Fetch rates expressed as units of each currency per one unit of `base`.
    async fn fetch_rates(&self, base: &CurrencyCode) -> FxResult<RateTable>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockRateProvider;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::RwLock;
    use xrate_common::{CurrencyCatalog, CurrencyCode, CurrencyInfo, RateTable};

    use super::RateProvider;
    use crate::error::{FxError, FxResult};

    /// In-memory provider with invocation counters, injectable failures and latency.
    pub struct MockRateProvider {
        name: String,
        catalog: RwLock<CurrencyCatalog>,
        /// Rates relative to USD; other bases are derived from these.
        usd_rates: RwLock<RateTable>,
        latency: RwLock<Option<Duration>>,
        failing: AtomicBool,
        currency_calls: AtomicUsize,
        rate_calls: AtomicUsize,
    }

    impl MockRateProvider {
        /// Create a new mock provider with no currencies.
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                catalog: RwLock::new(CurrencyCatalog::new()),
                usd_rates: RwLock::new(RateTable::new()),
                latency: RwLock::new(None),
                failing: AtomicBool::new(false),
                currency_calls: AtomicUsize::new(0),
                rate_calls: AtomicUsize::new(0),
            }
        }

        /// Mock preloaded with USD, EUR, GBP and JPY.
        pub fn with_defaults() -> Self {
            let provider = Self::new("mock");
            provider.set_currency("USD", CurrencyInfo::new("US Dollar", "$", 2), 1.0);
            provider.set_currency("EUR", CurrencyInfo::new("Euro", "€", 2), 0.92);
            provider.set_currency("GBP", CurrencyInfo::new("British Pound", "£", 2), 0.79);
            provider.set_currency("JPY", CurrencyInfo::new("Japanese Yen", "¥", 0), 149.5);
            provider
        }

        /// Add or replace a currency with its rate per one USD.
        pub fn set_currency(&self, code: &str, info: CurrencyInfo, usd_rate: f64) {
            let code = CurrencyCode::new(code);
            self.catalog.write().insert(code.clone(), info);
            self.usd_rates.write().insert(code, usd_rate);
        }

        /// Change the rate of a currency per one USD.
        pub fn set_usd_rate(&self, code: &str, usd_rate: f64) {
            self.usd_rates.write().insert(CurrencyCode::new(code), usd_rate);
        }

        /// Make every subsequent call fail (or succeed again).
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Delay every call by the given duration.
        pub fn set_latency(&self, latency: Duration) {
            *self.latency.write() = Some(latency);
        }

        /// Number of currency list fetches so far.
        pub fn currency_calls(&self) -> usize {
            self.currency_calls.load(Ordering::SeqCst)
        }

        /// Number of rate table fetches so far.
        pub fn rate_calls(&self) -> usize {
            self.rate_calls.load(Ordering::SeqCst)
        }

        async fn simulate_io(&self) -> FxResult<()> {
            let latency = *self.latency.read();
            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(FxError::upstream(&self.name, "simulated outage"));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RateProvider for MockRateProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_currencies(&self) -> FxResult<CurrencyCatalog> {
            self.currency_calls.fetch_add(1, Ordering::SeqCst);
            self.simulate_io().await?;
            Ok(self.catalog.read().clone())
        }

        async fn fetch_rates(&self, base: &CurrencyCode) -> FxResult<RateTable> {
            self.rate_calls.fetch_add(1, Ordering::SeqCst);
            self.simulate_io().await?;

            let usd_rates = self.usd_rates.read();
            let base_rate = usd_rates
                .get(base)
                .copied()
                .ok_or_else(|| FxError::upstream(&self.name, format!("unknown base {}", base)))?;

            Ok(usd_rates
                .iter()
                .map(|(code, rate)| (code.clone(), rate / base_rate))
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_rates_relative_to_base() {
        let provider = MockRateProvider::with_defaults();

        let usd = provider.fetch_rates(&CurrencyCode::usd()).await.unwrap();
        assert_eq!(usd[&CurrencyCode::eur()], 0.92);

        let eur = provider.fetch_rates(&CurrencyCode::eur()).await.unwrap();
        assert_eq!(eur[&CurrencyCode::eur()], 1.0);
        assert!((eur[&CurrencyCode::usd()] - 1.0 / 0.92).abs() < 1e-12);

        assert_eq!(provider.rate_calls(), 2);
        assert_eq!(provider.currency_calls(), 0);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let provider = MockRateProvider::with_defaults();
        provider.set_failing(true);

        assert!(provider.fetch_currencies().await.is_err());
        assert!(provider.fetch_rates(&CurrencyCode::usd()).await.is_err());

        provider.set_failing(false);
        let catalog = provider.fetch_currencies().await.unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(provider.currency_calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_unknown_base() {
        let provider = MockRateProvider::with_defaults();
        let result = provider.fetch_rates(&CurrencyCode::new("ZZZ")).await;
        assert!(matches!(result, Err(crate::FxError::Upstream { .. })));
    }
}
