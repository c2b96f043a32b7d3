use crate::domain::{models::subscription::{PushSubscriptionRecord, Recipient, RecipientType}, ports::SubscriptionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::Utc;

pub struct SqliteSubscriptionRepo {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepo {
    async fn upsert_by_endpoint(&self, s: &PushSubscriptionRecord) -> Result<PushSubscriptionRecord, AppError> {
        sqlx::query_as::<_, PushSubscriptionRecord>(
            "INSERT INTO push_subscriptions (id, customer_id, barber_id, endpoint, p256dh, auth, device_type, device_name, user_agent, consecutive_failures, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(endpoint) DO UPDATE SET
                 customer_id = excluded.customer_id, barber_id = excluded.barber_id,
                 p256dh = excluded.p256dh, auth = excluded.auth,
                 device_type = excluded.device_type, device_name = excluded.device_name, user_agent = excluded.user_agent,
                 consecutive_failures = 0, is_active = 1, updated_at = excluded.updated_at
             RETURNING *"
        )
            .bind(&s.id).bind(&s.customer_id).bind(&s.barber_id).bind(&s.endpoint)
            .bind(&s.p256dh).bind(&s.auth).bind(&s.device_type).bind(&s.device_name)
            .bind(&s.user_agent).bind(s.consecutive_failures).bind(s.is_active)
            .bind(s.created_at).bind(s.updated_at)
            .fetch_one(&self.pool).await.map_err(AppError::from_db)
    }

    async fn find_by_endpoint(&self, endpoint: &str) -> Result<Option<PushSubscriptionRecord>, AppError> {
        sqlx::query_as::<_, PushSubscriptionRecord>("SELECT * FROM push_subscriptions WHERE endpoint = ?")
            .bind(endpoint).fetch_optional(&self.pool).await.map_err(AppError::from_db)
    }

    async fn list_active_for(&self, recipient: &Recipient) -> Result<Vec<PushSubscriptionRecord>, AppError> {
        let sql = match recipient.kind {
            RecipientType::Customer => "SELECT * FROM push_subscriptions WHERE customer_id = ? AND is_active = 1 ORDER BY created_at ASC",
            RecipientType::Barber => "SELECT * FROM push_subscriptions WHERE barber_id = ? AND is_active = 1 ORDER BY created_at ASC",
        };
        sqlx::query_as::<_, PushSubscriptionRecord>(sql).bind(&recipient.id).fetch_all(&self.pool).await.map_err(AppError::from_db)
    }

    async fn record_success(&self, id: &str, delivery_status: &str) -> Result<(), AppError> {
        let now = Utc::now();
        sqlx::query("UPDATE push_subscriptions SET consecutive_failures = 0, last_delivery_status = ?, last_used_at = ?, updated_at = ? WHERE id = ?")
            .bind(delivery_status).bind(now).bind(now).bind(id)
            .execute(&self.pool).await.map_err(AppError::from_db)?;
        Ok(())
    }

    async fn record_transient_failure(&self, id: &str, delivery_status: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE push_subscriptions SET consecutive_failures = consecutive_failures + 1, last_delivery_status = ?, updated_at = ? WHERE id = ?")
            .bind(delivery_status).bind(Utc::now()).bind(id)
            .execute(&self.pool).await.map_err(AppError::from_db)?;
        Ok(())
    }

    async fn deactivate(&self, id: &str, delivery_status: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE push_subscriptions SET is_active = 0, last_delivery_status = ?, updated_at = ? WHERE id = ?")
            .bind(delivery_status).bind(Utc::now()).bind(id)
            .execute(&self.pool).await.map_err(AppError::from_db)?;
        Ok(())
    }

    async fn deactivate_by_endpoint(&self, endpoint: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE push_subscriptions SET is_active = 0, updated_at = ? WHERE endpoint = ? AND is_active = 1")
            .bind(Utc::now()).bind(endpoint)
            .execute(&self.pool).await.map_err(AppError::from_db)?;
        Ok(result.rows_affected() > 0)
    }
}
