//! Raw amounts as supplied by callers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ValidationError;

/// An amount before validation: a JSON number or a string such as a path segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl RawAmount {
    /// Parse into a finite amount.
    ///
    /// Text is trimmed and must parse entirely; `NaN` and infinities are rejected
    /// whichever form they arrive in. Negative amounts are allowed.
    pub fn parse(&self) -> Result<f64, ValidationError> {
        let value = match self {
            RawAmount::Number(n) => *n,
            RawAmount::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidAmount(s.clone()))?,
        };

        if !value.is_finite() {
            return Err(ValidationError::InvalidAmount(self.to_string()));
        }

        Ok(value)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAmount::Number(n) => write!(f, "{}", n),
            RawAmount::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for RawAmount {
    fn from(n: f64) -> Self {
        RawAmount::Number(n)
    }
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        RawAmount::Text(s.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(s: String) -> Self {
        RawAmount::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_number_and_text() {
        assert_eq!(RawAmount::from(10.5).parse().unwrap(), 10.5);
        assert_eq!(RawAmount::from(" 42 ").parse().unwrap(), 42.0);
        assert_eq!(RawAmount::from("-3.25").parse().unwrap(), -3.25);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            RawAmount::from("abc").parse(),
            Err(ValidationError::InvalidAmount(raw)) if raw == "abc"
        ));
        assert!(RawAmount::from("").parse().is_err());
        assert!(RawAmount::from("10abc").parse().is_err());
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(RawAmount::from("inf").parse().is_err());
        assert!(RawAmount::from("NaN").parse().is_err());
        assert!(RawAmount::Number(f64::INFINITY).parse().is_err());
    }

    #[test]
    fn test_untagged_json() {
        let values: Vec<RawAmount> = serde_json::from_str(r#"[10, 2.5, "abc"]"#).unwrap();
        assert_eq!(values[0], RawAmount::Number(10.0));
        assert_eq!(values[1], RawAmount::Number(2.5));
        assert_eq!(values[2], RawAmount::Text("abc".to_string()));
    }

    proptest! {
        #[test]
        fn prop_parsed_text_is_always_finite(text in "\\PC{0,12}") {
            if let Ok(value) = RawAmount::Text(text).parse() {
                prop_assert!(value.is_finite());
            }
        }
    }
}
