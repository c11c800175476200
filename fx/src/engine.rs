//! Main FX engine implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};
use xrate_common::{time::constants, CurrencyCatalog, CurrencyCode, RawAmount};

use crate::cache::{CacheStats, RateCache, RateCacheConfig};
use crate::conversion::{self, BulkConversion, Conversion};
use crate::error::FxResult;
use crate::provider::RateProvider;
use crate::snapshot::CurrencySnapshot;

/// Configuration for the FX engine.
#[derive(Debug, Clone)]
pub struct FxEngineConfig {
    /// Cache configuration.
    pub cache: RateCacheConfig,
    /// Base that conversions pivot through and the default for rate listings.
    pub pivot_currency: CurrencyCode,
}

impl Default for FxEngineConfig {
    fn default() -> Self {
        Self {
            cache: RateCacheConfig::default(),
            pivot_currency: CurrencyCode::new(constants::DEFAULT_BASE_CURRENCY),
        }
    }
}

/// The main FX engine: a snapshot cache plus the conversion arithmetic.
pub struct FxEngine {
    cache: RateCache,
    config: FxEngineConfig,
}

impl FxEngine {
    /// Create a new FX engine with the given provider.
    pub fn new(provider: Arc<dyn RateProvider>, config: FxEngineConfig) -> Self {
        Self {
            cache: RateCache::with_config(provider, config.cache.clone()),
            config,
        }
    }

    /// Supported currencies from any fresh snapshot.
    #[instrument(skip(self))]
    pub async fn currencies(&self) -> FxResult<Arc<CurrencyCatalog>> {
        let snapshot = self
            .cache
            .ensure_any_fresh(&self.config.pivot_currency)
            .await?;
        Ok(snapshot.catalog())
    }

    /// Fresh snapshot expressed against `base`, or the pivot currency when none is given.
    ///
    /// Callers read base and rates from the returned snapshot so the pair always
    /// comes from one refresh.
    #[instrument(skip(self))]
    pub async fn rates(&self, base: Option<&str>) -> FxResult<Arc<CurrencySnapshot>> {
        let base = base
            .map(CurrencyCode::new)
            .filter(|code| !code.is_empty())
            .unwrap_or_else(|| self.config.pivot_currency.clone());
        self.cache.ensure_fresh(&base).await
    }

    /// Convert an amount between two currencies.
    #[instrument(skip(self), fields(amount = %amount))]
    pub async fn convert(&self, from: &str, to: &str, amount: &RawAmount) -> FxResult<Conversion> {
        let amount = RawAmount::Number(amount.parse()?);
        let snapshot = self.pivot_snapshot().await?;
        let conversion = conversion::convert(&snapshot, from, to, &amount)?;

        info!(
            from = %conversion.from,
            to = %conversion.to,
            rate = conversion.rate,
            "Conversion completed"
        );

        Ok(conversion)
    }

    /// Convert from one currency into many, isolating per-target failures.
    #[instrument(skip(self, amounts), fields(targets = amounts.len()))]
    pub async fn convert_bulk(
        &self,
        from: &str,
        amounts: &BTreeMap<String, RawAmount>,
    ) -> FxResult<BulkConversion> {
        let snapshot = self.pivot_snapshot().await?;
        let bulk = conversion::convert_bulk(&snapshot, from, amounts)?;

        info!(
            from = %bulk.from,
            converted = bulk.results.len() - bulk.failed_count(),
            failed = bulk.failed_count(),
            "Bulk conversion completed"
        );

        Ok(bulk)
    }

    pub fn pivot_currency(&self) -> &CurrencyCode {
        &self.config.pivot_currency
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Get engine statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn pivot_snapshot(&self) -> FxResult<Arc<CurrencySnapshot>> {
        let snapshot = self.cache.ensure_fresh(&self.config.pivot_currency).await?;
        debug!(base = %snapshot.base_currency(), "Using pivot snapshot");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;
    use crate::provider::MockRateProvider;
    use tokio_test::{assert_err, assert_ok};
    use xrate_common::{ErrorKind, ValidationError};

    fn setup_engine() -> (Arc<MockRateProvider>, FxEngine) {
        let provider = Arc::new(MockRateProvider::with_defaults());
        let engine = FxEngine::new(provider.clone(), FxEngineConfig::default());
        (provider, engine)
    }

    #[tokio::test]
    async fn test_convert() {
        let (_, engine) = setup_engine();

        let conversion = engine
            .convert("USD", "EUR", &RawAmount::from("1000"))
            .await
            .unwrap();

        assert_eq!(conversion.rate, 0.92);
        assert_eq!(conversion.result, 1000.0 * 0.92);
    }

    #[tokio::test]
    async fn test_repeated_conversions_fetch_once() {
        let (provider, engine) = setup_engine();

        for to in ["EUR", "GBP", "JPY", "EUR", "USD"] {
            assert_ok!(engine.convert("USD", to, &RawAmount::from(5.0)).await);
        }

        assert_eq!(provider.currency_calls(), 1);
        assert_eq!(provider.rate_calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_amount_skips_upstream() {
        let (provider, engine) = setup_engine();

        let err = assert_err!(engine.convert("USD", "EUR", &RawAmount::from("abc")).await);

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(provider.currency_calls(), 0);
        assert!(engine.cache().snapshot().is_none());
    }

    #[tokio::test]
    async fn test_invalid_currency() {
        let (_, engine) = setup_engine();

        let err = assert_err!(engine.convert("USD", "ZZZ", &RawAmount::from(1.0)).await);

        assert!(matches!(
            err,
            FxError::Validation(ValidationError::InvalidCurrency(code)) if code == "ZZZ"
        ));
    }

    #[tokio::test]
    async fn test_bulk_partial_failure() {
        let (provider, engine) = setup_engine();
        let amounts = BTreeMap::from([
            ("EUR".to_string(), RawAmount::from(10.0)),
            ("ZZZ".to_string(), RawAmount::from(5.0)),
            ("JPY".to_string(), RawAmount::from("abc")),
        ]);

        let bulk = engine.convert_bulk("USD", &amounts).await.unwrap();

        assert!(bulk.results["EUR"].is_converted());
        assert!(!bulk.results["ZZZ"].is_converted());
        assert!(!bulk.results["JPY"].is_converted());
        assert_eq!(provider.rate_calls(), 1);
    }

    #[tokio::test]
    async fn test_rates_for_other_base_then_convert() {
        let (provider, engine) = setup_engine();

        let eur = engine.rates(Some("eur")).await.unwrap();
        assert_eq!(eur.base_currency(), &CurrencyCode::eur());

        // Conversions pivot through USD, which costs one rate-only refresh.
        engine
            .convert("GBP", "JPY", &RawAmount::from(1.0))
            .await
            .unwrap();
        assert_eq!(provider.currency_calls(), 1);
        assert_eq!(provider.rate_calls(), 2);

        let pivot = engine.rates(None).await.unwrap();
        assert_eq!(pivot.base_currency(), &CurrencyCode::usd());
        assert_eq!(provider.rate_calls(), 2);
    }

    #[tokio::test]
    async fn test_currencies_reuse_any_fresh_snapshot() {
        let (provider, engine) = setup_engine();

        engine.rates(Some("GBP")).await.unwrap();
        let currencies = engine.currencies().await.unwrap();

        assert_eq!(currencies.len(), 4);
        assert!(currencies.contains_key(&CurrencyCode::jpy()));
        assert_eq!(provider.rate_calls(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let (provider, engine) = setup_engine();
        provider.set_failing(true);

        let err = engine.currencies().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamFetch);
        assert!(err.is_retryable());
    }
}
