//! Xrate Conversion History
//!
//! Per-user, newest-first conversion history capped at a fixed length.

pub mod record;
pub mod store;
pub mod error;

pub use record::{ConversionRecord, UserId};
pub use store::{HistoryStore, InMemoryHistoryStore};
pub use error::{HistoryError, HistoryResult};
