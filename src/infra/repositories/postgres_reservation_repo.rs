use crate::domain::{models::reservation::Reservation, ports::ReservationRepository};
use crate::domain::services::clock::SLOT_TOLERANCE_MIN;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;
use chrono::{NaiveDate, Utc};

pub struct PostgresReservationRepo {
    pool: PgPool,
}

impl PostgresReservationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepo {
    async fn create_atomic(&self, r: &Reservation) -> Result<Reservation, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::from_db)?;
        // Serializes writers per barber so the tolerance check below cannot race.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&r.barber_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from_db)?;
        let created = sqlx::query_as::<_, Reservation>(
            r#"INSERT INTO reservations (id, barber_id, service_id, customer_id, customer_name, customer_phone, start_time, slot_minute, local_date, day_of_week, status, source, barber_notes, version, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
               RETURNING *"#
        )
            .bind(&r.id)
            .bind(&r.barber_id)
            .bind(&r.service_id)
            .bind(&r.customer_id)
            .bind(&r.customer_name)
            .bind(&r.customer_phone)
            .bind(r.start_time)
            .bind(r.slot_minute)
            .bind(r.local_date)
            .bind(&r.day_of_week)
            .bind(&r.status)
            .bind(&r.source)
            .bind(&r.barber_notes)
            .bind(r.version)
            .bind(r.created_at)
            .bind(r.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_db)?;

        let neighbours: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM reservations WHERE barber_id = $1 AND status = 'confirmed' AND id <> $2 AND slot_minute BETWEEN $3 AND $4"
        )
            .bind(&r.barber_id)
            .bind(&r.id)
            .bind(r.slot_minute - SLOT_TOLERANCE_MIN)
            .bind(r.slot_minute + SLOT_TOLERANCE_MIN)
            .fetch_one(&mut *tx)
            .await
            .map_err(AppError::from_db)?;
        if neighbours > 0 {
            tx.rollback().await.map_err(AppError::from_db)?;
            return Err(AppError::UniqueViolation("uq_reservations_confirmed_slot".into()));
        }

        tx.commit().await.map_err(AppError::from_db)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn list_confirmed_in_slots(&self, barber_id: &str, from_minute: i64, to_minute: i64) -> Result<Vec<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE barber_id = $1 AND status = 'confirmed' AND slot_minute BETWEEN $2 AND $3 ORDER BY slot_minute ASC"
        )
            .bind(barber_id)
            .bind(from_minute)
            .bind(to_minute)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn list_confirmed_between_dates(&self, barber_id: Option<&str>, start: NaiveDate, end: NaiveDate) -> Result<Vec<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE status = 'confirmed' AND local_date BETWEEN $1 AND $2 AND ($3::TEXT IS NULL OR barber_id = $3) ORDER BY start_time ASC"
        )
            .bind(start)
            .bind(end)
            .bind(barber_id)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn transition(&self, id: &str, to_status: &str, actor: Option<&str>, reason: Option<&str>) -> Result<Option<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>(
            r#"UPDATE reservations SET status = $1, cancelled_by = COALESCE($2, cancelled_by), cancel_reason = COALESCE($3, cancel_reason), version = version + 1, updated_at = $4
               WHERE id = $5 AND status = 'confirmed'
               RETURNING *"#
        )
            .bind(to_status)
            .bind(actor)
            .bind(reason)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn claim_due_reminders(&self, from_minute: i64, to_minute: i64, limit: i64) -> Result<Vec<Reservation>, AppError> {
        sqlx::query_as::<_, Reservation>(
            r#"UPDATE reservations SET reminder_sent_at = $1
               WHERE id IN (
                   SELECT id FROM reservations
                   WHERE status = 'confirmed' AND reminder_sent_at IS NULL AND slot_minute BETWEEN $2 AND $3
                   ORDER BY slot_minute ASC LIMIT $4
                   FOR UPDATE SKIP LOCKED
               )
               RETURNING *"#
        )
            .bind(Utc::now())
            .bind(from_minute)
            .bind(to_minute)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from_db)
    }
}
