use crate::domain::{models::{closure::Closure, schedule::{DayOfWeek, ShopHours, WorkDay}}, ports::ScheduleRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::NaiveDate;

pub struct PostgresScheduleRepo {
    pool: PgPool,
}

impl PostgresScheduleRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PostgresScheduleRepo {
    async fn find_work_day(&self, barber_id: &str, day: DayOfWeek) -> Result<Option<WorkDay>, AppError> {
        sqlx::query_as::<_, WorkDay>("SELECT * FROM work_days WHERE barber_id = $1 AND day_of_week = $2")
            .bind(barber_id)
            .bind(day.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn upsert_work_day(&self, w: &WorkDay) -> Result<WorkDay, AppError> {
        sqlx::query_as::<_, WorkDay>(
            r#"INSERT INTO work_days (id, barber_id, day_of_week, is_working, start_time, end_time, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               ON CONFLICT (barber_id, day_of_week) DO UPDATE SET
                   is_working = EXCLUDED.is_working, start_time = EXCLUDED.start_time,
                   end_time = EXCLUDED.end_time, updated_at = EXCLUDED.updated_at
               RETURNING *"#
        )
            .bind(&w.id)
            .bind(&w.barber_id)
            .bind(&w.day_of_week)
            .bind(w.is_working)
            .bind(&w.start_time)
            .bind(&w.end_time)
            .bind(w.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn find_shop_hours(&self, day: DayOfWeek) -> Result<Option<ShopHours>, AppError> {
        sqlx::query_as::<_, ShopHours>("SELECT * FROM shop_hours WHERE day_of_week = $1")
            .bind(day.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn upsert_shop_hours(&self, h: &ShopHours) -> Result<ShopHours, AppError> {
        sqlx::query_as::<_, ShopHours>(
            r#"INSERT INTO shop_hours (day_of_week, is_open, open_time, close_time) VALUES ($1, $2, $3, $4)
               ON CONFLICT (day_of_week) DO UPDATE SET
                   is_open = EXCLUDED.is_open, open_time = EXCLUDED.open_time, close_time = EXCLUDED.close_time
               RETURNING *"#
        )
            .bind(&h.day_of_week)
            .bind(h.is_open)
            .bind(&h.open_time)
            .bind(&h.close_time)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn create_closure(&self, c: &Closure) -> Result<Closure, AppError> {
        sqlx::query_as::<_, Closure>(
            r#"INSERT INTO closures (id, barber_id, start_date, end_date, reason, created_by, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#
        )
            .bind(&c.id)
            .bind(&c.barber_id)
            .bind(c.start_date)
            .bind(c.end_date)
            .bind(&c.reason)
            .bind(&c.created_by)
            .bind(c.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn list_closures_covering(&self, barber_id: &str, date: NaiveDate) -> Result<Vec<Closure>, AppError> {
        sqlx::query_as::<_, Closure>(
            r#"SELECT * FROM closures WHERE (barber_id IS NULL OR barber_id = $1) AND start_date <= $2 AND end_date >= $2
               ORDER BY (barber_id IS NULL) DESC, created_at ASC"#
        )
            .bind(barber_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn list_closures_from(&self, barber_id: Option<&str>, from: NaiveDate) -> Result<Vec<Closure>, AppError> {
        sqlx::query_as::<_, Closure>(
            r#"SELECT * FROM closures WHERE end_date >= $1 AND ($2::text IS NULL OR barber_id IS NULL OR barber_id = $2)
               ORDER BY start_date ASC, created_at ASC"#
        )
            .bind(from)
            .bind(barber_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn delete_closure(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM closures WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from_db)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Closure not found".into()));
        }
        Ok(())
    }
}
