//! HTTP routes.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::api::{
    ApiError, AppendHistoryRequest, BulkRequest, ConversionBody, CurrenciesBody, Empty,
    HistoryBody, RatesBody, RatesQuery, Success, UserQuery,
};
use crate::service::ExchangeService;

/// Shared handler state.
pub type AppState = Arc<ExchangeService>;

type ApiResult<T> = Result<Json<Success<T>>, ApiError>;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/currencies", get(list_currencies))
        .route("/api/rates", get(list_rates))
        .route("/api/convert/bulk", post(convert_bulk))
        .route("/api/convert/{from}/{to}/{amount}", get(convert_one))
        .route(
            "/api/history",
            post(append_history).get(get_history).delete(clear_history),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// GET `/api/currencies`
async fn list_currencies(State(service): State<AppState>) -> ApiResult<CurrenciesBody> {
    let currencies = service.currencies().await?;
    Ok(Success::new(CurrenciesBody {
        currencies: currencies.as_ref().clone(),
    }))
}

/// GET `/api/rates?base=EUR`
async fn list_rates(
    State(service): State<AppState>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> ApiResult<RatesBody> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let snapshot = service.rates(query.base.as_deref()).await?;
    Ok(Success::new(RatesBody {
        base: snapshot.base_currency().clone(),
        rates: snapshot.rates().clone(),
    }))
}

/// GET `/api/convert/{from}/{to}/{amount}`
async fn convert_one(
    State(service): State<AppState>,
    Path((from, to, amount)): Path<(String, String, String)>,
) -> ApiResult<ConversionBody> {
    let conversion = service.convert(&from, &to, &amount).await?;
    Ok(Success::new(ConversionBody { conversion }))
}

/// POST `/api/convert/bulk`
async fn convert_bulk(
    State(service): State<AppState>,
    body: Result<Json<BulkRequest>, JsonRejection>,
) -> ApiResult<xrate_fx::BulkConversion> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let bulk = service
        .convert_bulk(&request.from, &request.raw_amounts())
        .await?;
    Ok(Success::new(bulk))
}

/// POST `/api/history`
async fn append_history(
    State(service): State<AppState>,
    body: Result<Json<AppendHistoryRequest>, JsonRejection>,
) -> ApiResult<Empty> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    service
        .record(request.user_id.as_deref(), request.conversion)
        .await?;
    Ok(Success::new(Empty {}))
}

/// GET `/api/history?userId=...`
async fn get_history(
    State(service): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<HistoryBody> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let history = service.history(query.user_id.as_deref()).await?;
    Ok(Success::new(HistoryBody { history }))
}

/// DELETE `/api/history?userId=...`
async fn clear_history(
    State(service): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> ApiResult<Empty> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    service.clear_history(query.user_id.as_deref()).await?;
    Ok(Success::new(Empty {}))
}
