use crate::domain::{models::{recurring::RecurringAppointment, schedule::DayOfWeek}, ports::RecurringRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresRecurringRepo {
    pool: PgPool,
}

impl PostgresRecurringRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecurringRepository for PostgresRecurringRepo {
    async fn create(&self, r: &RecurringAppointment) -> Result<RecurringAppointment, AppError> {
        sqlx::query_as::<_, RecurringAppointment>(
            r#"INSERT INTO recurring_appointments (id, barber_id, customer_id, service_id, day_of_week, time_slot, is_active, created_by, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING *"#
        )
            .bind(&r.id)
            .bind(&r.barber_id)
            .bind(&r.customer_id)
            .bind(&r.service_id)
            .bind(&r.day_of_week)
            .bind(&r.time_slot)
            .bind(r.is_active)
            .bind(&r.created_by)
            .bind(r.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn list_active_for_day(&self, barber_id: &str, day: DayOfWeek) -> Result<Vec<RecurringAppointment>, AppError> {
        sqlx::query_as::<_, RecurringAppointment>(
            "SELECT * FROM recurring_appointments WHERE barber_id = $1 AND day_of_week = $2 AND is_active ORDER BY time_slot ASC"
        )
            .bind(barber_id)
            .bind(day.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn deactivate(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE recurring_appointments SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_db)?;
        Ok(result.rows_affected() > 0)
    }
}
