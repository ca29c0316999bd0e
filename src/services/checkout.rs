//! Creates payment attempts and hands the shopper the signed redirect URL.

use crate::config::GatewayConfig;
use crate::database::order_repository::OrderRepository;
use crate::database::payment_repository::PaymentRepository;
use crate::error::{
    AppError, AppErrorKind, AppResult, DomainError, ValidationError,
};
use crate::gateway::redirect::{build_payment_url, RedirectRequest};
use crate::gateway::types::PAYMENT_METHOD_VNPAY;
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Result of a created payment attempt
#[derive(Debug, Clone, Serialize)]
pub struct PaymentInitiation {
    pub payment_url: String,
    pub payment_id: Uuid,
}

pub struct CheckoutService {
    orders: OrderRepository,
    payments: PaymentRepository,
    gateway: GatewayConfig,
}

impl CheckoutService {
    pub fn new(pool: PgPool, gateway: GatewayConfig) -> Self {
        Self {
            orders: OrderRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool),
            gateway,
        }
    }

    /// Create a pending payment for the caller's order and assemble the
    /// signed redirect URL.
    ///
    /// Only an order whose payment_status is still "pending" is payable; a
    /// paid order is rejected with a conflict. A failed attempt never
    /// advances the order's payment_status, so retrying after failure goes
    /// through this same path.
    pub async fn create_gateway_payment(
        &self,
        user_id: i64,
        order_id: i64,
        amount: i64,
        order_info: &str,
        client_ip: &str,
    ) -> AppResult<PaymentInitiation> {
        if amount <= 0 {
            return Err(AppError::new(AppErrorKind::Validation(
                ValidationError::InvalidField {
                    field: "amount".to_string(),
                    reason: "amount must be greater than zero".to_string(),
                },
            )));
        }

        let order = self
            .orders
            .find_for_user(order_id, user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(|| {
                AppError::new(AppErrorKind::Domain(DomainError::OrderNotFound { order_id }))
            })?;

        if order.payment_status != "pending" {
            return Err(AppError::new(AppErrorKind::Domain(
                DomainError::OrderNotPayable {
                    order_id: order.id,
                    payment_status: order.payment_status,
                },
            )));
        }

        // Unix-second suffix keeps references unique across retries of the
        // same order.
        let now = Utc::now();
        let transaction_id = format!("ORDER_{}_{}", order.id, now.timestamp());

        let payment = self
            .payments
            .create_payment(
                order.id,
                PAYMENT_METHOD_VNPAY,
                amount,
                &self.gateway.currency,
                &transaction_id,
            )
            .await
            .map_err(AppError::from)?;

        let payment_url = build_payment_url(
            &self.gateway,
            &RedirectRequest {
                transaction_id: &transaction_id,
                amount,
                order_info,
                client_ip,
            },
            now,
        );

        info!(
            order_id = order.id,
            payment_id = %payment.id,
            transaction_id = %transaction_id,
            "Gateway payment created"
        );

        Ok(PaymentInitiation {
            payment_url,
            payment_id: payment.id,
        })
    }
}
