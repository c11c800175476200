//! Exchange service wiring the FX engine and the history store.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, instrument};
use xrate_common::{CurrencyCatalog, RawAmount};
use xrate_fx::{
    BulkConversion, Conversion, CurrencySnapshot, FxEngine, FxEngineConfig, FxResult,
    HttpRateProvider, RateProvider,
};
use xrate_history::{
    ConversionRecord, HistoryResult, HistoryStore, InMemoryHistoryStore, UserId,
};

use crate::config::{ConfigError, ServiceConfig};

/// Operations behind the HTTP surface.
pub struct ExchangeService {
    engine: FxEngine,
    history: Arc<dyn HistoryStore>,
}

impl ExchangeService {
    /// Create a service from explicit parts.
    pub fn new(
        provider: Arc<dyn RateProvider>,
        history: Arc<dyn HistoryStore>,
        config: FxEngineConfig,
    ) -> Self {
        Self {
            engine: FxEngine::new(provider, config),
            history,
        }
    }

    /// Build the production service. Fails when the configuration is unusable,
    /// most importantly when the provider credential is missing.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let provider = HttpRateProvider::new(
            config.provider_url.clone(),
            config.api_key.clone(),
            config.upstream_timeout,
        )
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let history = InMemoryHistoryStore::with_limit(config.history_limit);

        info!(
            provider_url = %config.provider_url,
            pivot = %config.pivot_currency,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            "Exchange service configured"
        );

        Ok(Self::new(
            Arc::new(provider),
            Arc::new(history),
            config.fx_config(),
        ))
    }

    pub fn engine(&self) -> &FxEngine {
        &self.engine
    }

    pub async fn currencies(&self) -> FxResult<Arc<CurrencyCatalog>> {
        self.engine.currencies().await
    }

    pub async fn rates(&self, base: Option<&str>) -> FxResult<Arc<CurrencySnapshot>> {
        self.engine.rates(base).await
    }

    pub async fn convert(&self, from: &str, to: &str, amount: &str) -> FxResult<Conversion> {
        self.engine.convert(from, to, &RawAmount::from(amount)).await
    }

    pub async fn convert_bulk(
        &self,
        from: &str,
        amounts: &BTreeMap<String, RawAmount>,
    ) -> FxResult<BulkConversion> {
        self.engine.convert_bulk(from, amounts).await
    }

    /// Store a conversion the caller already performed.
    #[instrument(skip(self, conversion))]
    pub async fn record(
        &self,
        user_id: Option<&str>,
        conversion: Conversion,
    ) -> HistoryResult<ConversionRecord> {
        let record = ConversionRecord::new(
            UserId::resolve(user_id),
            conversion.from,
            conversion.to,
            conversion.amount,
            conversion.rate,
            conversion.result,
        );
        self.history.append(record.clone()).await?;
        Ok(record)
    }

    pub async fn history(&self, user_id: Option<&str>) -> HistoryResult<Vec<ConversionRecord>> {
        self.history.list(&UserId::resolve(user_id)).await
    }

    pub async fn clear_history(&self, user_id: Option<&str>) -> HistoryResult<()> {
        self.history.clear(&UserId::resolve(user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrate_fx::MockRateProvider;

    fn setup_service() -> (Arc<MockRateProvider>, ExchangeService) {
        let provider = Arc::new(MockRateProvider::with_defaults());
        let service = ExchangeService::new(
            provider.clone(),
            Arc::new(InMemoryHistoryStore::new()),
            FxEngineConfig::default(),
        );
        (provider, service)
    }

    #[test]
    fn test_missing_credential_prevents_service() {
        let result = ExchangeService::from_config(&ServiceConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingApiKey(_))));
    }

    #[test]
    fn test_builds_with_credential() {
        let config = ServiceConfig {
            api_key: "secret".to_string(),
            ..Default::default()
        };
        let service = ExchangeService::from_config(&config).unwrap();
        assert_eq!(service.engine().pivot_currency().code(), "USD");
    }

    #[tokio::test]
    async fn test_convert_then_record() {
        let (_, service) = setup_service();

        let conversion = service.convert("usd", "gbp", "100").await.unwrap();
        let record = service.record(Some("alice"), conversion.clone()).await.unwrap();

        assert_eq!(record.user_id.as_str(), "alice");
        assert_eq!(record.result, conversion.result);

        let history = service.history(Some("alice")).await.unwrap();
        assert_eq!(history, vec![record]);
        assert!(service.history(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_history_lifecycle() {
        let (_, service) = setup_service();
        let conversion = service.convert("EUR", "JPY", "1").await.unwrap();

        for _ in 0..25 {
            service.record(None, conversion.clone()).await.unwrap();
        }
        assert_eq!(service.history(Some("")).await.unwrap().len(), 20);

        tokio_test::assert_ok!(service.clear_history(None).await);
        assert!(service.history(None).await.unwrap().is_empty());
    }
}
