use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::gateway::types::{IpnAck, PaymentStatus};
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::error::{app_error_response, get_request_id_from_headers, ErrorResponse};
use crate::services::callback::CallbackService;
use crate::services::checkout::{CheckoutService, PaymentInitiation};

pub struct PaymentState {
    pub checkout: Arc<CheckoutService>,
    pub callbacks: Arc<CallbackService>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGatewayPaymentRequest {
    pub order_id: i64,
    pub amount: i64,
    #[serde(default)]
    pub order_info: String,
}

#[derive(Debug, Serialize)]
pub struct GatewayReturnResponse {
    pub status: PaymentStatus,
    pub message: String,
}

/// POST /api/payments/vnpay/create
pub async fn create_gateway_payment(
    State(state): State<Arc<PaymentState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    headers: HeaderMap,
    Json(payload): Json<CreateGatewayPaymentRequest>,
) -> Result<Json<PaymentInitiation>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);
    info!(user_id, order_id = payload.order_id, "Gateway payment requested");

    let client_ip = client_ip_from_headers(&headers);
    state
        .checkout
        .create_gateway_payment(
            user_id,
            payload.order_id,
            payload.amount,
            &payload.order_info,
            &client_ip,
        )
        .await
        .map(Json)
        .map_err(|e| app_error_response(e, request_id))
}

/// GET /api/payments/vnpay/return
pub async fn gateway_return(
    State(state): State<Arc<PaymentState>>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<GatewayReturnResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);

    let outcome = state
        .callbacks
        .handle_return(&params)
        .await
        .map_err(|e| app_error_response(e, request_id))?;

    Ok(Json(GatewayReturnResponse {
        status: outcome.status,
        message: "Payment processed".to_string(),
    }))
}

/// POST /api/webhooks/vnpay/direct
pub async fn gateway_ipn(
    State(state): State<Arc<PaymentState>>,
    headers: HeaderMap,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<IpnAck>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);

    state
        .callbacks
        .handle_ipn(&params)
        .await
        .map(Json)
        .map_err(|e| app_error_response(e, request_id))
}

/// Client address as reported by the edge proxy.
fn client_ip_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}
