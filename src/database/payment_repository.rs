use crate::database::error::DatabaseError;
use crate::gateway::error::GatewayResult;
use crate::gateway::types::PaymentStatus;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Payment entity, one row per payment attempt
#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: i64,
    pub payment_method: String,
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub transaction_id: String,
    pub gateway_response: Option<String>,
    pub processed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Payment {
    /// Typed view of the stored status string
    pub fn payment_status(&self) -> GatewayResult<PaymentStatus> {
        self.status.parse()
    }
}

const PAYMENT_COLUMNS: &str = "id, order_id, payment_method, status, amount, currency, \
     transaction_id, gateway_response, processed_at, created_at, updated_at";

/// Repository for payment attempts
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new pending payment attempt
    pub async fn create_payment(
        &self,
        order_id: i64,
        payment_method: &str,
        amount: i64,
        currency: &str,
        transaction_id: &str,
    ) -> Result<Payment, DatabaseError> {
        sqlx::query_as::<_, Payment>(&format!(
            "INSERT INTO payments (order_id, payment_method, status, amount, currency, transaction_id) \
             VALUES ($1, $2, 'pending', $3, $4, $5) \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(order_id)
        .bind(payment_method)
        .bind(amount)
        .bind(currency)
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Find a payment by its gateway transaction reference
    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<Payment>, DatabaseError> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Complete a payment, but only out of the pending state.
    ///
    /// The status guard and the write are one statement; a row already in a
    /// terminal state matches nothing and `None` is returned.
    pub async fn complete_if_pending(
        &self,
        transaction_id: &str,
        gateway_response: &str,
    ) -> Result<Option<Payment>, DatabaseError> {
        sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments \
             SET status = 'completed', gateway_response = $2, processed_at = NOW(), updated_at = NOW() \
             WHERE transaction_id = $1 AND status = 'pending' \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(transaction_id)
        .bind(gateway_response)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Fail a payment, but only out of the pending state.
    pub async fn fail_if_pending(
        &self,
        transaction_id: &str,
        gateway_response: &str,
    ) -> Result<Option<Payment>, DatabaseError> {
        sqlx::query_as::<_, Payment>(&format!(
            "UPDATE payments \
             SET status = 'failed', gateway_response = $2, updated_at = NOW() \
             WHERE transaction_id = $1 AND status = 'pending' \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(transaction_id)
        .bind(gateway_response)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_parses_stored_string() {
        let payment = Payment {
            id: Uuid::new_v4(),
            order_id: 42,
            payment_method: "vnpay".to_string(),
            status: "completed".to_string(),
            amount: 150_000,
            currency: "VND".to_string(),
            transaction_id: "ORDER_42_1000".to_string(),
            gateway_response: None,
            processed_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        assert_eq!(payment.payment_status().ok(), Some(PaymentStatus::Completed));
    }
}
