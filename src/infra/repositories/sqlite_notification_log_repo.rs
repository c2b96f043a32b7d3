use crate::domain::{models::{notification::{LogCompletion, NotificationLogRecord}, subscription::Recipient}, ports::NotificationLogRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;
use chrono::Utc;

pub struct SqliteNotificationLogRepo {
    pool: SqlitePool,
}

impl SqliteNotificationLogRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationLogRepository for SqliteNotificationLogRepo {
    async fn create(&self, log: &NotificationLogRecord) -> Result<NotificationLogRecord, AppError> {
        sqlx::query_as::<_, NotificationLogRecord>(
            "INSERT INTO notification_logs (id, notification_type, recipient_type, recipient_id, reservation_id, sender_id, title, body, devices_targeted, devices_succeeded, devices_failed, status, error_message, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&log.id).bind(&log.notification_type).bind(&log.recipient_type).bind(&log.recipient_id)
            .bind(&log.reservation_id).bind(&log.sender_id).bind(&log.title).bind(&log.body)
            .bind(log.devices_targeted).bind(log.devices_succeeded).bind(log.devices_failed)
            .bind(&log.status).bind(&log.error_message).bind(log.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::from_db)
    }

    async fn complete(&self, id: &str, c: &LogCompletion) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE notification_logs SET devices_targeted = ?, devices_succeeded = ?, devices_failed = ?, status = ?, error_message = ?, completed_at = ? WHERE id = ?"
        )
            .bind(c.targeted).bind(c.succeeded).bind(c.failed).bind(c.status.as_str())
            .bind(&c.error_message).bind(Utc::now()).bind(id)
            .execute(&self.pool).await.map_err(AppError::from_db)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<NotificationLogRecord>, AppError> {
        sqlx::query_as::<_, NotificationLogRecord>("SELECT * FROM notification_logs WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::from_db)
    }

    async fn list_for_recipient(&self, recipient: &Recipient, limit: i64) -> Result<Vec<NotificationLogRecord>, AppError> {
        sqlx::query_as::<_, NotificationLogRecord>(
            "SELECT * FROM notification_logs WHERE recipient_type = ? AND recipient_id = ? ORDER BY created_at DESC LIMIT ?"
        )
            .bind(recipient.kind.as_str()).bind(&recipient.id).bind(limit)
            .fetch_all(&self.pool).await.map_err(AppError::from_db)
    }
}
