//! Immutable currency snapshot held by the cache.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use xrate_common::{time, CurrencyCatalog, CurrencyCode, CurrencyInfo, RateTable};

/// One refresh generation of currency list, rates and base.
///
/// Snapshots are never mutated; the cache replaces the whole value so rates are
/// always read together with the base they were fetched for.
#[derive(Debug, Clone)]
pub struct CurrencySnapshot {
    /// Shared between generations that only refreshed rates.
    currencies: Arc<CurrencyCatalog>,
    rates: RateTable,
    base_currency: CurrencyCode,
    last_updated: DateTime<Utc>,
}

impl CurrencySnapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(currencies: Arc<CurrencyCatalog>, rates: RateTable, base: CurrencyCode) -> Self {
        Self::at(currencies, rates, base, Utc::now())
    }

    /// Create a snapshot with an explicit timestamp.
    pub fn at(
        currencies: Arc<CurrencyCatalog>,
        rates: RateTable,
        base_currency: CurrencyCode,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            currencies,
            rates,
            base_currency,
            last_updated,
        }
    }

    /// Successor generation with new rates for `base`, keeping the currency list.
    pub fn rebased(&self, rates: RateTable, base: CurrencyCode) -> Self {
        Self::new(self.currencies.clone(), rates, base)
    }

    pub fn currencies(&self) -> &CurrencyCatalog {
        &self.currencies
    }

    /// Shared handle to the currency list.
    pub fn catalog(&self) -> Arc<CurrencyCatalog> {
        self.currencies.clone()
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    pub fn base_currency(&self) -> &CurrencyCode {
        &self.base_currency
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Check if the code is a supported currency.
    pub fn is_supported(&self, code: &CurrencyCode) -> bool {
        self.currencies.contains_key(code)
    }

    pub fn info(&self, code: &CurrencyCode) -> Option<&CurrencyInfo> {
        self.currencies.get(code)
    }

    /// Units of `code` per one unit of the base currency.
    pub fn rate(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn age(&self) -> Duration {
        time::age_of(self.last_updated)
    }

    /// Older than the expiration window.
    pub fn is_expired(&self, window: Duration) -> bool {
        time::is_older_than(self.last_updated, window)
    }

    /// Not expired and expressed against `base`.
    pub fn is_fresh_for(&self, base: &CurrencyCode, window: Duration) -> bool {
        !self.is_expired(window) && &self.base_currency == base
    }
}
