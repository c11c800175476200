//! Request and response shapes of the HTTP surface.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use xrate_common::{CurrencyCatalog, CurrencyCode, ErrorKind, RateTable, RawAmount};
use xrate_fx::{Conversion, FxError};
use xrate_history::{ConversionRecord, HistoryError};

/// `{ "success": true, ...body }`.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            body,
        })
    }
}

/// Body with no fields beyond the success flag.
#[derive(Debug, Serialize)]
pub struct Empty {}

#[derive(Debug, Serialize)]
pub struct CurrenciesBody {
    pub currencies: CurrencyCatalog,
}

#[derive(Debug, Serialize)]
pub struct RatesBody {
    pub base: CurrencyCode,
    pub rates: RateTable,
}

#[derive(Debug, Serialize)]
pub struct ConversionBody {
    pub conversion: Conversion,
}

#[derive(Debug, Serialize)]
pub struct HistoryBody {
    pub history: Vec<ConversionRecord>,
}

#[derive(Debug, Deserialize)]
pub struct RatesQuery {
    pub base: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub user_id: Option<String>,
}

/// Bulk conversion body. Amounts stay loosely typed so that one bad value
/// only fails its own key.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    pub from: String,
    #[serde(default)]
    pub amounts: BTreeMap<String, serde_json::Value>,
}

impl BulkRequest {
    pub fn raw_amounts(&self) -> BTreeMap<String, RawAmount> {
        self.amounts
            .iter()
            .map(|(key, value)| {
                let raw = match value {
                    serde_json::Value::Number(n) => match n.as_f64() {
                        Some(n) => RawAmount::Number(n),
                        None => RawAmount::Text(n.to_string()),
                    },
                    serde_json::Value::String(s) => RawAmount::Text(s.clone()),
                    other => RawAmount::Text(other.to_string()),
                };
                (key.clone(), raw)
            })
            .collect()
    }
}

/// History append body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendHistoryRequest {
    pub user_id: Option<String>,
    pub conversion: Conversion,
}

/// Failure envelope `{ "success": false, "error": ..., "code": ... }` with a status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct Failure<'a> {
    success: bool,
    error: &'a str,
    code: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// Malformed request body or query.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    fn status_for(kind: ErrorKind) -> StatusCode {
        match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamFetch | ErrorKind::Configuration => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<FxError> for ApiError {
    fn from(e: FxError) -> Self {
        let status = Self::status_for(e.kind());
        if status.is_server_error() {
            error!(error = %e, "Request failed upstream");
        } else {
            warn!(error = %e, "Rejected invalid request");
        }
        Self::new(status, e.error_code(), e.to_string())
    }
}

impl From<HistoryError> for ApiError {
    fn from(e: HistoryError) -> Self {
        error!(error = %e, "History store failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "HISTORY_ERROR", e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Failure {
            success: false,
            error: &self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrate_common::ValidationError;

    #[test]
    fn test_success_envelope_flattens_body() {
        let Json(envelope) = Success::new(RatesBody {
            base: CurrencyCode::usd(),
            rates: RateTable::from([(CurrencyCode::eur(), 0.92)]),
        });
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["base"], "USD");
        assert_eq!(json["rates"]["EUR"], 0.92);
    }

    #[test]
    fn test_error_status_by_kind() {
        let invalid: ApiError = FxError::from(ValidationError::InvalidAmount("x".into())).into();
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.code, "INVALID_AMOUNT");

        let upstream: ApiError = FxError::upstream("mock", "down").into();
        assert_eq!(upstream.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bulk_amounts_are_loosely_typed() {
        let request: BulkRequest = serde_json::from_str(
            r#"{"from": "USD", "amounts": {"EUR": 10, "JPY": "abc", "GBP": null}}"#,
        )
        .unwrap();
        let amounts = request.raw_amounts();

        assert_eq!(amounts["EUR"], RawAmount::Number(10.0));
        assert_eq!(amounts["JPY"], RawAmount::Text("abc".into()));
        assert!(amounts["GBP"].parse().is_err());
    }

    #[test]
    fn test_append_request_shape() {
        let request: AppendHistoryRequest = serde_json::from_str(
            r#"{"conversion": {"from": "USD", "to": "EUR", "amount": 10, "rate": 0.92, "result": 9.2}}"#,
        )
        .unwrap();

        assert!(request.user_id.is_none());
        assert_eq!(request.conversion.to, CurrencyCode::eur());
    }
}
