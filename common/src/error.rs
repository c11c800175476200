//! Error taxonomy shared by the xrate crates.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Closed set of error kinds surfaced to the boundary layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed startup configuration.
    Configuration,
    /// The rate provider could not be reached or answered unusably.
    UpstreamFetch,
    /// Caller supplied an invalid currency code or amount.
    Validation,
}

impl ErrorKind {
    /// Whether the failure was caused by client input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ErrorKind::Validation)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::UpstreamFetch => "upstream_fetch",
            ErrorKind::Validation => "validation",
        };
        f.write_str(name)
    }
}

/// Invalid caller input. Never mutates cache or history.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Currency code is not in the supported currency list.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Amount is not a finite number.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Currency is listed but the rate table has no usable rate for it.
    #[error("Rate unavailable for {0}")]
    RateUnavailable(String),

    /// Rate or result does not fit in a finite number.
    #[error("Conversion out of range: {0}")]
    ResultOutOfRange(String),
}

impl ValidationError {
    /// Get error code for structured responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::InvalidCurrency(_) => "INVALID_CURRENCY",
            ValidationError::InvalidAmount(_) => "INVALID_AMOUNT",
            ValidationError::RateUnavailable(_) => "RATE_UNAVAILABLE",
            ValidationError::ResultOutOfRange(_) => "RESULT_OUT_OF_RANGE",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_codes() {
        assert_eq!(
            ValidationError::InvalidCurrency("ZZZ".into()).error_code(),
            "INVALID_CURRENCY"
        );
        assert_eq!(
            ValidationError::InvalidAmount("abc".into()).to_string(),
            "Invalid amount: abc"
        );
        assert!(ValidationError::RateUnavailable("EUR".into())
            .kind()
            .is_client_error());
        assert_eq!(
            ValidationError::ResultOutOfRange("1e308 USD to JPY".into()).error_code(),
            "RESULT_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::UpstreamFetch).unwrap(),
            "\"upstream_fetch\""
        );
        assert_eq!(ErrorKind::Configuration.to_string(), "configuration");
    }
}
