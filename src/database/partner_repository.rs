use crate::database::error::DatabaseError;
use sqlx::{FromRow, PgPool};

/// Partner entity, the columns relevant to webhook authentication
#[derive(Debug, Clone, FromRow)]
pub struct Partner {
    pub id: i64,
    pub name: String,
    pub api_key: String,
    pub secret_key: String,
    pub webhook_url: Option<String>,
    pub is_active: bool,
}

/// Repository for partner credentials
pub struct PartnerRepository {
    pool: PgPool,
}

impl PartnerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an active partner by its API key pair
    pub async fn find_by_credentials(
        &self,
        api_key: &str,
        secret_key: &str,
    ) -> Result<Option<Partner>, DatabaseError> {
        sqlx::query_as::<_, Partner>(
            "SELECT id, name, api_key, secret_key, webhook_url, is_active FROM partners \
             WHERE api_key = $1 AND secret_key = $2 AND is_active = true",
        )
        .bind(api_key)
        .bind(secret_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from_sqlx)
    }
}
