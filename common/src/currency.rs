//! Currency codes and currency metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// ISO 4217 style currency code, normalised to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Create a new currency code. Surrounding whitespace is dropped.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Check if the code is empty after normalisation.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn gbp() -> Self {
        Self::new("GBP")
    }

    pub fn jpy() -> Self {
        Self::new("JPY")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CurrencyCode {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl FromStr for CurrencyCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Descriptive metadata for a supported currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyInfo {
    /// Display name, e.g. "US Dollar".
    pub name: String,
    /// Display symbol, e.g. "$".
    pub symbol: String,
    /// Symbol used in the currency's own locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol_native: Option<String>,
    /// Number of minor unit digits.
    #[serde(default = "default_decimal_digits")]
    pub decimal_digits: u32,
    /// Plural display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_plural: Option<String>,
}

fn default_decimal_digits() -> u32 {
    2
}

impl CurrencyInfo {
    /// Create metadata with the given name, symbol and precision.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimal_digits: u32) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            symbol_native: None,
            decimal_digits,
            name_plural: None,
        }
    }
}

/// Supported currencies keyed by code. The keys define the set of valid codes.
pub type CurrencyCatalog = BTreeMap<CurrencyCode, CurrencyInfo>;

/// Units of each currency per one unit of some base currency.
pub type RateTable = BTreeMap<CurrencyCode, f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_normalised() {
        assert_eq!(CurrencyCode::new(" eur "), CurrencyCode::eur());
        assert_eq!(CurrencyCode::from("jpy").code(), "JPY");
        assert!(CurrencyCode::new("   ").is_empty());
    }

    #[test]
    fn test_code_serde_as_string() {
        let code: CurrencyCode = serde_json::from_str("\"gbp\"").unwrap();
        assert_eq!(code, CurrencyCode::gbp());
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"GBP\"");
    }

    #[test]
    fn test_catalog_keys_deserialize() {
        let json = r#"{
            "USD": {"name": "US Dollar", "symbol": "$", "symbol_native": "$", "decimal_digits": 2},
            "jpy": {"name": "Japanese Yen", "symbol": "¥", "decimal_digits": 0}
        }"#;
        let catalog: CurrencyCatalog = serde_json::from_str(json).unwrap();

        assert!(catalog.contains_key(&CurrencyCode::usd()));
        assert_eq!(catalog[&CurrencyCode::jpy()].decimal_digits, 0);
        assert_eq!(catalog[&CurrencyCode::jpy()].symbol_native, None);
    }

    #[test]
    fn test_missing_precision_defaults_to_two() {
        let info: CurrencyInfo =
            serde_json::from_str(r#"{"name": "Euro", "symbol": "€"}"#).unwrap();
        assert_eq!(info.decimal_digits, 2);
    }
}
