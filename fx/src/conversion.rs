//! Currency conversion types and pivot arithmetic.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use xrate_common::{CurrencyCode, RawAmount, ValidationError};

use crate::snapshot::CurrencySnapshot;

/// Represents a completed currency conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Input amount.
    pub amount: f64,
    /// Units of `to` per one unit of `from`.
    pub rate: f64,
    /// `amount * rate`.
    pub result: f64,
}

/// Outcome for one target currency of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkItem {
    Converted(Conversion),
    Failed(ValidationError),
}

impl BulkItem {
    pub fn is_converted(&self) -> bool {
        matches!(self, BulkItem::Converted(_))
    }

    pub fn conversion(&self) -> Option<&Conversion> {
        match self {
            BulkItem::Converted(conversion) => Some(conversion),
            BulkItem::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ValidationError> {
        match self {
            BulkItem::Converted(_) => None,
            BulkItem::Failed(error) => Some(error),
        }
    }
}

impl Serialize for BulkItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BulkItem::Converted(c) => {
                let mut item = serializer.serialize_struct("BulkItem", 6)?;
                item.serialize_field("success", &true)?;
                item.serialize_field("from", &c.from)?;
                item.serialize_field("to", &c.to)?;
                item.serialize_field("amount", &c.amount)?;
                item.serialize_field("rate", &c.rate)?;
                item.serialize_field("result", &c.result)?;
                item.end()
            }
            BulkItem::Failed(e) => {
                let mut item = serializer.serialize_struct("BulkItem", 3)?;
                item.serialize_field("success", &false)?;
                item.serialize_field("error", &e.to_string())?;
                item.serialize_field("code", e.error_code())?;
                item.end()
            }
        }
    }
}

/// Result of a bulk conversion, keyed by the caller's target keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkConversion {
    pub from: CurrencyCode,
    pub results: BTreeMap<String, BulkItem>,
}

impl BulkConversion {
    /// Number of targets that failed validation.
    pub fn failed_count(&self) -> usize {
        self.results.values().filter(|item| !item.is_converted()).count()
    }
}

fn require_supported(
    snapshot: &CurrencySnapshot,
    code: &CurrencyCode,
) -> Result<(), ValidationError> {
    if snapshot.is_supported(code) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCurrency(code.to_string()))
    }
}

fn usable_rate(snapshot: &CurrencySnapshot, code: &CurrencyCode) -> Result<f64, ValidationError> {
    match snapshot.rate(code) {
        Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
        _ => Err(ValidationError::RateUnavailable(code.to_string())),
    }
}

/// Units of `to` per one unit of `from`, pivoting through the snapshot's base.
///
/// Both codes must be supported. Identical codes yield exactly `1.0`.
pub fn cross_rate(
    snapshot: &CurrencySnapshot,
    from: &CurrencyCode,
    to: &CurrencyCode,
) -> Result<f64, ValidationError> {
    require_supported(snapshot, from)?;
    require_supported(snapshot, to)?;

    if from == to {
        return Ok(1.0);
    }

    let base = snapshot.base_currency();
    let from_to_base = if from == base {
        1.0
    } else {
        1.0 / usable_rate(snapshot, from)?
    };
    let base_to_to = if to == base {
        1.0
    } else {
        usable_rate(snapshot, to)?
    };

    Ok(from_to_base * base_to_to)
}

fn convert_parsed(
    snapshot: &CurrencySnapshot,
    from: &CurrencyCode,
    to: CurrencyCode,
    amount: &RawAmount,
) -> Result<Conversion, ValidationError> {
    let amount = amount.parse()?;
    let rate = cross_rate(snapshot, from, &to)?;
    let result = amount * rate;
    if !rate.is_finite() || !result.is_finite() {
        return Err(ValidationError::ResultOutOfRange(format!(
            "{} {} to {}",
            amount, from, to
        )));
    }

    Ok(Conversion {
        from: from.clone(),
        to,
        amount,
        rate,
        result,
    })
}

/// Convert a single amount.
pub fn convert(
    snapshot: &CurrencySnapshot,
    from: &str,
    to: &str,
    amount: &RawAmount,
) -> Result<Conversion, ValidationError> {
    convert_parsed(snapshot, &CurrencyCode::new(from), CurrencyCode::new(to), amount)
}

/// Convert one source amount set into many targets.
///
/// Fails as a whole only when `from` is unsupported; every other problem is
/// recorded against its own key.
pub fn convert_bulk(
    snapshot: &CurrencySnapshot,
    from: &str,
    amounts: &BTreeMap<String, RawAmount>,
) -> Result<BulkConversion, ValidationError> {
    let from = CurrencyCode::new(from);
    require_supported(snapshot, &from)?;

    let results = amounts
        .iter()
        .map(|(key, amount)| {
            let item = match convert_parsed(snapshot, &from, CurrencyCode::new(key), amount) {
                Ok(conversion) => BulkItem::Converted(conversion),
                Err(e) => BulkItem::Failed(e),
            };
            (key.clone(), item)
        })
        .collect();

    Ok(BulkConversion { from, results })
}
