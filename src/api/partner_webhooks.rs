use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::database::partner_repository::PartnerRepository;
use crate::error::{AppError, AppErrorKind, AuthError};
use crate::middleware::auth::PartnerCredentials;
use crate::middleware::error::{app_error_response, get_request_id_from_headers, ErrorResponse};
use crate::services::callback::{CallbackService, PartnerPaymentNotification};

pub struct PartnerWebhookState {
    pub partners: PartnerRepository,
    pub callbacks: Arc<CallbackService>,
}

/// POST /api/webhooks/partner/payment
///
/// Authenticated by the partner's API key pair; the credential check happens
/// before the payload is acted on.
pub async fn partner_payment_webhook(
    State(state): State<Arc<PartnerWebhookState>>,
    headers: HeaderMap,
    Json(payload): Json<PartnerPaymentNotification>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = get_request_id_from_headers(&headers);

    let credentials = PartnerCredentials::from_headers(&headers).ok_or_else(|| {
        warn!("Partner webhook without credentials");
        app_error_response(
            AppError::new(AppErrorKind::Auth(AuthError::MissingPartnerCredentials)),
            request_id.clone(),
        )
    })?;

    let partner = state
        .partners
        .find_by_credentials(&credentials.api_key, &credentials.secret_key)
        .await
        .map_err(|e| app_error_response(AppError::from(e), request_id.clone()))?
        .ok_or_else(|| {
            warn!("Partner webhook with invalid credentials");
            app_error_response(
                AppError::new(AppErrorKind::Auth(AuthError::InvalidPartnerCredentials)),
                request_id.clone(),
            )
        })?;

    state
        .callbacks
        .handle_partner_notification(&partner, &payload)
        .await
        .map_err(|e| app_error_response(e, request_id))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Webhook processed successfully",
    })))
}
