//! Verifies inbound payment callbacks and applies the terminal transition.
//!
//! Three entry points share the logic: the synchronous browser return, the
//! gateway's asynchronous IPN push, and partner-originated notifications.
//! A payment moves out of `pending` exactly once; the pending-guard is a
//! single conditional UPDATE, so the return and IPN paths can race without
//! double-applying the order cascade.

use crate::config::GatewayConfig;
use crate::database::order_repository::OrderRepository;
use crate::database::partner_repository::Partner;
use crate::database::payment_repository::{Payment, PaymentRepository};
use crate::error::{AppError, AppErrorKind, AppResult, AuthError, DomainError, ValidationError};
use crate::gateway::signature;
use crate::gateway::types::{
    terminal_status_for, IpnAck, PaymentStatus, PARAM_AMOUNT, PARAM_RESPONSE_CODE,
    PARAM_SECURE_HASH, PARAM_TXN_REF,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// What a verified callback did to the payment
#[derive(Debug, Clone, Serialize)]
pub struct CallbackOutcome {
    pub status: PaymentStatus,
    /// False when the payment was already terminal and nothing changed
    pub transitioned: bool,
}

/// Partner notification body
#[derive(Debug, Clone, Deserialize)]
pub struct PartnerPaymentNotification {
    pub order_id: String,
    pub payment_id: String,
    pub status: String,
    pub amount: i64,
    #[serde(default)]
    pub currency: Option<String>,
    pub transaction_id: String,
}

pub struct CallbackService {
    payments: PaymentRepository,
    orders: OrderRepository,
    gateway: GatewayConfig,
}

impl CallbackService {
    pub fn new(pool: PgPool, gateway: GatewayConfig) -> Self {
        Self {
            payments: PaymentRepository::new(pool.clone()),
            orders: OrderRepository::new(pool),
            gateway,
        }
    }

    /// Synchronous browser return with signed query parameters.
    pub async fn handle_return(
        &self,
        params: &BTreeMap<String, String>,
    ) -> AppResult<CallbackOutcome> {
        let fields = self.verify_and_extract(params)?;
        let outcome = self
            .apply_gateway_signal(&fields.transaction_id, &fields.response_code, &fields.amount)
            .await?;

        info!(
            transaction_id = %fields.transaction_id,
            status = %outcome.status,
            transitioned = outcome.transitioned,
            "Gateway return processed"
        );
        Ok(outcome)
    }

    /// Asynchronous gateway push. Identical verification and transition; the
    /// acknowledgement is fixed whether or not a mutation occurred.
    pub async fn handle_ipn(&self, params: &BTreeMap<String, String>) -> AppResult<IpnAck> {
        let fields = self.verify_and_extract(params)?;
        let outcome = self
            .apply_gateway_signal(&fields.transaction_id, &fields.response_code, &fields.amount)
            .await?;

        info!(
            transaction_id = %fields.transaction_id,
            status = %outcome.status,
            transitioned = outcome.transitioned,
            "Gateway webhook processed"
        );
        Ok(IpnAck::success())
    }

    /// Partner-originated notification. The caller has already been
    /// authenticated against the partner store; no payload HMAC is involved.
    pub async fn handle_partner_notification(
        &self,
        partner: &Partner,
        notification: &PartnerPaymentNotification,
    ) -> AppResult<CallbackOutcome> {
        let target = if notification.status == "completed" {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };
        let gateway_response = format!("Partner webhook: {}", notification.status);

        let outcome = self
            .apply_terminal_signal(&notification.transaction_id, target, &gateway_response)
            .await?;

        info!(
            partner_id = partner.id,
            partner = %partner.name,
            order_id = %notification.order_id,
            amount = notification.amount,
            transaction_id = %notification.transaction_id,
            status = %outcome.status,
            transitioned = outcome.transitioned,
            "Partner webhook processed"
        );
        Ok(outcome)
    }

    /// Signature check comes before any state read; unverified input never
    /// touches the database.
    fn verify_and_extract(&self, params: &BTreeMap<String, String>) -> AppResult<CallbackFields> {
        let provided = params
            .get(PARAM_SECURE_HASH)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::new(AppErrorKind::Auth(AuthError::MissingSignature)))?;

        if !signature::verify_params(params, provided, &self.gateway.hash_key) {
            warn!("Gateway callback failed signature verification");
            return Err(AppError::new(AppErrorKind::Auth(AuthError::InvalidSignature)));
        }

        let transaction_id = required_param(params, PARAM_TXN_REF)?;
        let response_code = required_param(params, PARAM_RESPONSE_CODE)?;
        let amount = params.get(PARAM_AMOUNT).cloned().unwrap_or_default();

        Ok(CallbackFields {
            transaction_id,
            response_code,
            amount,
        })
    }

    async fn apply_gateway_signal(
        &self,
        transaction_id: &str,
        response_code: &str,
        amount: &str,
    ) -> AppResult<CallbackOutcome> {
        let target = terminal_status_for(response_code);
        let gateway_response = format!("ResponseCode: {}, Amount: {}", response_code, amount);
        self.apply_terminal_signal(transaction_id, target, &gateway_response)
            .await
    }

    /// First verified terminal signal wins; replays observe the stored state.
    async fn apply_terminal_signal(
        &self,
        transaction_id: &str,
        target: PaymentStatus,
        gateway_response: &str,
    ) -> AppResult<CallbackOutcome> {
        let transitioned = match target {
            PaymentStatus::Completed => {
                self.payments
                    .complete_if_pending(transaction_id, gateway_response)
                    .await
            }
            _ => {
                self.payments
                    .fail_if_pending(transaction_id, gateway_response)
                    .await
            }
        }
        .map_err(AppError::from)?;

        match transitioned {
            Some(payment) => {
                if target == PaymentStatus::Completed {
                    self.orders
                        .mark_paid(payment.order_id)
                        .await
                        .map_err(AppError::from)?;
                }
                Ok(CallbackOutcome {
                    status: target,
                    transitioned: true,
                })
            }
            None => {
                // No pending row matched: either the reference is unknown or
                // the payment is already terminal.
                let payment = self.lookup(transaction_id).await?;
                Ok(CallbackOutcome {
                    status: payment.payment_status().map_err(AppError::from)?,
                    transitioned: false,
                })
            }
        }
    }

    async fn lookup(&self, transaction_id: &str) -> AppResult<Payment> {
        self.payments
            .find_by_transaction_id(transaction_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::new(AppErrorKind::Domain(DomainError::PaymentNotFound {
                    transaction_id: transaction_id.to_string(),
                }))
            })
    }
}

struct CallbackFields {
    transaction_id: String,
    response_code: String,
    amount: String,
}

fn required_param(params: &BTreeMap<String, String>, name: &str) -> AppResult<String> {
    params
        .get(name)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| {
            AppError::new(AppErrorKind::Validation(ValidationError::MissingField {
                field: name.to_string(),
            }))
        })
}
