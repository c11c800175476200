//! Service configuration.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use xrate_common::{time::constants, CurrencyCode, ErrorKind};
use xrate_fx::{FxEngineConfig, RateCacheConfig, DEFAULT_BASE_URL};

/// Environment variable holding the provider credential.
pub const API_KEY_VAR: &str = "CURRENCY_API_KEY";

/// Longest accepted expiration window (one day).
const MAX_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Provider credential absent or blank.
    #[error("Missing required provider credential {0}")]
    MissingApiKey(&'static str),

    /// Variable present but unparsable.
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    /// Values parse but are inconsistent.
    #[error("Configuration error: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Main service configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Rate provider credential.
    pub api_key: String,
    /// Rate provider base URL.
    pub provider_url: String,
    /// Upstream HTTP timeout.
    pub upstream_timeout: Duration,
    /// Snapshot expiration window.
    pub cache_ttl: Duration,
    /// Pivot currency for conversions and default rate listings.
    pub pivot_currency: String,
    /// Records kept per user.
    pub history_limit: usize,
    /// Log level used when RUST_LOG is unset.
    pub log_level: String,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("listen_addr", &self.listen_addr)
            .field("listen_port", &self.listen_port)
            .field("api_key", &"<redacted>")
            .field("provider_url", &self.provider_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("cache_ttl", &self.cache_ttl)
            .field("pivot_currency", &self.pivot_currency)
            .field("history_limit", &self.history_limit)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 3000,
            api_key: String::new(),
            provider_url: DEFAULT_BASE_URL.to_string(),
            upstream_timeout: constants::upstream_timeout()
                .to_std()
                .unwrap_or(Duration::from_secs(10)),
            cache_ttl: constants::cache_expiration_window()
                .to_std()
                .unwrap_or(Duration::from_secs(300)),
            pivot_currency: constants::DEFAULT_BASE_CURRENCY.to_string(),
            history_limit: constants::HISTORY_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

impl ServiceConfig {
    /// Load and validate configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load and validate configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup(API_KEY_VAR) {
            config.api_key = key.trim().to_string();
        }

        if let Some(url) = lookup("CURRENCY_API_URL") {
            config.provider_url = url;
        }

        if let Some(addr) = lookup("XRATE_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("PORT") {
            config.listen_port = parse_var("PORT", port)?;
        }

        if let Some(secs) = lookup("XRATE_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(parse_var("XRATE_CACHE_TTL_SECS", secs)?);
        }

        if let Some(secs) = lookup("XRATE_UPSTREAM_TIMEOUT_SECS") {
            config.upstream_timeout =
                Duration::from_secs(parse_var("XRATE_UPSTREAM_TIMEOUT_SECS", secs)?);
        }

        if let Some(code) = lookup("XRATE_PIVOT_CURRENCY") {
            config.pivot_currency = code;
        }

        if let Some(limit) = lookup("XRATE_HISTORY_LIMIT") {
            config.history_limit = parse_var("XRATE_HISTORY_LIMIT", limit)?;
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey(API_KEY_VAR));
        }

        if self.listen_port == 0 {
            return Err(ConfigError::Invalid("Listen port cannot be 0".to_string()));
        }

        if self.provider_url.trim().is_empty() {
            return Err(ConfigError::Invalid("Provider URL cannot be empty".to_string()));
        }

        if self.cache_ttl.is_zero() || self.cache_ttl > MAX_CACHE_TTL {
            return Err(ConfigError::Invalid(
                "Cache TTL must be between 1 second and 1 day".to_string(),
            ));
        }

        if self.upstream_timeout.is_zero() {
            return Err(ConfigError::Invalid("Upstream timeout cannot be 0".to_string()));
        }

        if CurrencyCode::new(&self.pivot_currency).is_empty() {
            return Err(ConfigError::Invalid("Pivot currency cannot be empty".to_string()));
        }

        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("History limit cannot be 0".to_string()));
        }

        Ok(())
    }

    /// Engine settings derived from this configuration.
    pub fn fx_config(&self) -> FxEngineConfig {
        FxEngineConfig {
            cache: RateCacheConfig {
                expiration_window: chrono::Duration::seconds(self.cache_ttl.as_secs() as i64),
            },
            pivot_currency: CurrencyCode::new(&self.pivot_currency),
        }
    }
}
