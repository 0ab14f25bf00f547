//! Balance handlers
//!
//! Field syntax is checked here with the ledger's validation helpers before
//! the service is called. Business rejections map to 4xx with their own
//! error code; storage failures map to 5xx with a generic message.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::state::AppState;
use super::types::{
    ApiResponse, BalanceResponseData, HealthResponse, OperationRequest, OperationResponseData,
    error_codes,
};
use crate::ledger::{BalanceError, LedgerStore, parse_amount, parse_profile_id};

type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Map a ledger error to its HTTP response
fn reject(err: BalanceError) -> ApiError {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let (code, msg) = match &err {
        BalanceError::InvalidAmount(_) => (error_codes::INVALID_AMOUNT, err.to_string()),
        BalanceError::InvalidProfile(_) => (error_codes::INVALID_PROFILE, err.to_string()),
        BalanceError::InsufficientFunds { .. } => (
            error_codes::INSUFFICIENT_FUNDS,
            "Insufficient funds".to_string(),
        ),
        // Storage details stay in the logs
        BalanceError::Storage { .. } => {
            (error_codes::INTERNAL_ERROR, "Internal error".to_string())
        }
        BalanceError::Timeout { .. } => (
            error_codes::STORAGE_TIMEOUT,
            "Request timed out".to_string(),
        ),
    };

    (status, Json(ApiResponse::<()>::error(code, msg)))
}

/// Body that did not deserialize into the request type
fn malformed_body(rej: JsonRejection) -> ApiError {
    (
        rej.status(),
        Json(ApiResponse::<()>::error(
            error_codes::INVALID_PARAMETER,
            rej.body_text(),
        )),
    )
}

/// Record a signed balance operation
///
/// POST /api/v1/balance/operations
pub async fn apply_operation<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<OperationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<OperationResponseData>>, ApiError> {
    let Json(req) = payload.map_err(malformed_body)?;
    let profile_id = parse_profile_id(&req.profile_id).map_err(reject)?;
    let amount = parse_amount(req.amount_text().as_deref()).map_err(reject)?;

    let recorded = state
        .balance
        .apply(profile_id, amount)
        .await
        .map_err(reject)?;

    Ok(Json(ApiResponse::success(OperationResponseData {
        profile_id: profile_id.to_string(),
        recorded_amount: recorded.to_string(),
    })))
}

/// Get the current balance of a profile
///
/// GET /api/v1/balance/{profile_id}
pub async fn get_balance<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(profile_id): Path<String>,
) -> Result<Json<ApiResponse<BalanceResponseData>>, ApiError> {
    let profile_id = parse_profile_id(&profile_id).map_err(reject)?;

    let balance = state
        .balance
        .current_balance(profile_id)
        .await
        .map_err(reject)?;

    Ok(Json(ApiResponse::success(BalanceResponseData {
        profile_id: profile_id.to_string(),
        balance: balance.to_string(),
    })))
}

/// Health check endpoint
///
/// GET /api/v1/health
/// - Healthy: 200 OK + {code: 0, data: {store, version, timestamp_ms}}
/// - Unhealthy: 503 Service Unavailable
pub async fn health_check<S: LedgerStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    match state.balance.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(HealthResponse {
                store: state.balance.store().name().to_string(),
                version: state.version.to_string(),
                timestamp_ms: chrono::Utc::now().timestamp_millis(),
            })),
        ),
        Err(e) => {
            tracing::error!("[HEALTH] Ledger store check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    code: error_codes::SERVICE_UNAVAILABLE,
                    msg: "unavailable".to_string(),
                    data: None,
                }),
            )
        }
    }
}
