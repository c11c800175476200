//! Xrate FX Engine
//!
//! Exchange rate cache and currency conversion backed by an external rate provider.
//!
//! # Features
//!
//! - Single-slot snapshot cache with an expiration window
//! - Single-flight refresh shared by concurrent callers
//! - Pivot conversion through the snapshot's base currency
//! - Bulk conversion with per-target failure isolation
//!
//! # Example
//!
//! ```rust,ignore
//! use xrate_fx::{FxEngine, FxEngineConfig, HttpRateProvider};
//! use xrate_common::RawAmount;
//!
//! let provider = HttpRateProvider::new(DEFAULT_BASE_URL, api_key, timeout)?;
//! let engine = FxEngine::new(Arc::new(provider), FxEngineConfig::default());
//!
//! let conversion = engine.convert("USD", "EUR", &RawAmount::from(100.0)).await?;
//! ```

pub mod engine;
pub mod provider;
pub mod http;
pub mod snapshot;
pub mod cache;
pub mod conversion;
pub mod error;

pub use engine::{FxEngine, FxEngineConfig};
pub use provider::RateProvider;
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
pub use http::{HttpRateProvider, DEFAULT_BASE_URL};
pub use snapshot::CurrencySnapshot;
pub use cache::{CacheStats, RateCache, RateCacheConfig};
pub use conversion::{BulkConversion, BulkItem, Conversion};
pub use error::{FxError, FxResult};
