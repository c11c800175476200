//! Xrate Server
//!
//! HTTP surface over the FX engine and the conversion history store.

pub mod api;
pub mod config;
pub mod routes;
pub mod service;

pub use config::{ConfigError, ServiceConfig};
pub use routes::{router, AppState};
pub use service::ExchangeService;
