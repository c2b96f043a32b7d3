use crate::domain::{models::{recurring::RecurringAppointment, schedule::DayOfWeek}, ports::RecurringRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteRecurringRepo {
    pool: SqlitePool,
}

impl SqliteRecurringRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecurringRepository for SqliteRecurringRepo {
    async fn create(&self, r: &RecurringAppointment) -> Result<RecurringAppointment, AppError> {
        sqlx::query_as::<_, RecurringAppointment>(
            "INSERT INTO recurring_appointments (id, barber_id, customer_id, service_id, day_of_week, time_slot, is_active, created_by, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&r.id).bind(&r.barber_id).bind(&r.customer_id).bind(&r.service_id)
            .bind(&r.day_of_week).bind(&r.time_slot).bind(r.is_active).bind(&r.created_by).bind(r.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::from_db)
    }

    async fn list_active_for_day(&self, barber_id: &str, day: DayOfWeek) -> Result<Vec<RecurringAppointment>, AppError> {
        sqlx::query_as::<_, RecurringAppointment>(
            "SELECT * FROM recurring_appointments WHERE barber_id = ? AND day_of_week = ? AND is_active = 1 ORDER BY time_slot ASC"
        )
            .bind(barber_id).bind(day.as_str())
            .fetch_all(&self.pool).await.map_err(AppError::from_db)
    }

    async fn deactivate(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE recurring_appointments SET is_active = 0 WHERE id = ? AND is_active = 1")
            .bind(id).execute(&self.pool).await.map_err(AppError::from_db)?;
        Ok(result.rows_affected() > 0)
    }
}
