use crate::database::error::DatabaseError;
use sqlx::{FromRow, PgPool};

/// Partial order view: the two columns this subsystem is allowed to touch,
/// plus the keys needed for lookup and ownership checks.
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub payment_status: String,
    pub status: String,
}

/// Repository for the order columns owned by the payment flow
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an order scoped to its owner
    pub async fn find_for_user(
        &self,
        order_id: i64,
        user_id: i64,
    ) -> Result<Option<Order>, DatabaseError> {
        sqlx::query_as::<_, Order>(
            "SELECT id, user_id, payment_status, status FROM orders \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }

    /// Cascade a completed payment onto the order
    pub async fn mark_paid(&self, order_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = 'paid', status = 'confirmed', updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(order_id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)?;
        Ok(result.rows_affected() > 0)
    }
}
