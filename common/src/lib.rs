//! Xrate Common Types
//!
//! This crate contains shared types used across the xrate service,
//! including currency codes and metadata, raw amount parsing and the
//! validation error taxonomy.

pub mod currency;
pub mod amount;
pub mod error;
pub mod time;

pub use currency::*;
pub use amount::*;
pub use error::*;
pub use time::*;
