//! Conversion history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use xrate_common::{time::constants, CurrencyCode};

/// Owner of a history list. Absent or blank ids map to the anonymous user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id; blank input yields the anonymous user.
    pub fn new(id: impl AsRef<str>) -> Self {
        let id = id.as_ref().trim();
        if id.is_empty() {
            Self::anonymous()
        } else {
            Self(id.to_string())
        }
    }

    /// Resolve an optional caller-supplied id.
    pub fn resolve(id: Option<&str>) -> Self {
        id.map(Self::new).unwrap_or_else(Self::anonymous)
    }

    pub fn anonymous() -> Self {
        Self(constants::ANONYMOUS_USER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == constants::ANONYMOUS_USER
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A past conversion. Records are never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRecord {
    /// Time-ordered record ID.
    pub id: Uuid,
    pub user_id: UserId,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    pub amount: f64,
    pub result: f64,
    pub rate: f64,
    /// When the record was appended.
    pub timestamp: DateTime<Utc>,
}

impl ConversionRecord {
    /// Create a record stamped with the current time.
    pub fn new(
        user_id: UserId,
        from_currency: CurrencyCode,
        to_currency: CurrencyCode,
        amount: f64,
        rate: f64,
        result: f64,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            from_currency,
            to_currency,
            amount,
            result,
            rate,
            timestamp: Utc::now(),
        }
    }
}
