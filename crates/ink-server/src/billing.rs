use axum::Json;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use ink_billing::BillingError;
use ink_core::ApiResponse;
use serde::Deserialize;

use crate::error::envelope_error_response;
use crate::state::AppState;

fn billing_cache_key(uid: u64) -> String {
    format!("billing:{uid}")
}

/// Handle `GET /api/billing/{uid}`
pub async fn get_billing(State(state): State<AppState>, Path(uid): Path<u64>) -> Response {
    let cache_key = billing_cache_key(uid);
    if let Some(cached) = state.session_cache.get(&cache_key) {
        let body = ApiResponse::ok("ok", (*cached).clone());
        return (StatusCode::OK, Json(body)).into_response();
    }

    match state.ledger.info(uid).await {
        Ok(info) => match serde_json::to_value(&info) {
            Ok(value) => {
                state.session_cache.set(&cache_key, value.clone(), None);
                (StatusCode::OK, Json(ApiResponse::ok("ok", value))).into_response()
            }
            Err(e) => {
                tracing::error!(uid, error = %e, "failed to serialize billing info");
                let body: ApiResponse<serde_json::Value> =
                    ApiResponse::fail("internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        },
        Err(e) => envelope_error_response(&e),
    }
}

/// Handle `POST /api/billing/{uid}/initialize`
pub async fn initialize_billing(State(state): State<AppState>, Path(uid): Path<u64>) -> Response {
    match state.ledger.initialize(uid).await {
        Ok(created) => {
            state.session_cache.remove(&billing_cache_key(uid));
            let message = if created {
                "account initialized"
            } else {
                "account already initialized"
            };
            let body = ApiResponse::ok(message, serde_json::json!({ "created": created }));
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => envelope_error_response(&e),
    }
}

/// Request body for order redemption
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RedeemBody {
    /// Sponsorship platform user id claimed by the caller
    afd_id: String,
    /// Platform order number
    order_no: String,
}

/// Handle `POST /api/billing/{uid}/redeem`
pub async fn redeem_order(
    State(state): State<AppState>,
    Path(uid): Path<u64>,
    Json(body): Json<RedeemBody>,
) -> Response {
    match state.ledger.redeem_order(uid, &body.afd_id, &body.order_no).await {
        Ok(outcome) => {
            state.session_cache.remove(&billing_cache_key(uid));
            (StatusCode::OK, Json(ApiResponse::ok("order redeemed", outcome))).into_response()
        }
        Err(e) => envelope_error_response(&e),
    }
}

/// Handle `GET /api/billing/{uid}/available`
///
/// A missing account reads as no available calls rather than an error.
pub async fn available_calls(State(state): State<AppState>, Path(uid): Path<u64>) -> Response {
    match state.ledger.has_available_calls(uid).await {
        Ok(available) => {
            let body = ApiResponse::ok("ok", serde_json::json!({ "available": available }));
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(BillingError::AccountNotFound) => {
            let body = ApiResponse::ok("ok", serde_json::json!({ "available": false }));
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => envelope_error_response(&e),
    }
}
