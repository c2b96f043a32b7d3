use crate::domain::{models::directory::{Barber, Customer, Service}, ports::DirectoryRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresDirectoryRepo {
    pool: PgPool,
}

impl PostgresDirectoryRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryRepository for PostgresDirectoryRepo {
    async fn create_barber(&self, b: &Barber) -> Result<Barber, AppError> {
        sqlx::query_as::<_, Barber>(
            "INSERT INTO barbers (id, name, is_active, notifications_enabled, created_at) VALUES ($1, $2, $3, $4, $5) RETURNING *"
        )
            .bind(&b.id)
            .bind(&b.name)
            .bind(b.is_active)
            .bind(b.notifications_enabled)
            .bind(b.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn find_barber(&self, id: &str) -> Result<Option<Barber>, AppError> {
        sqlx::query_as::<_, Barber>("SELECT * FROM barbers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn create_customer(&self, c: &Customer) -> Result<Customer, AppError> {
        sqlx::query_as::<_, Customer>(
            r#"INSERT INTO customers (id, name, phone, is_blocked, notifications_enabled, reminders_enabled, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7)
               RETURNING *"#
        )
            .bind(&c.id)
            .bind(&c.name)
            .bind(&c.phone)
            .bind(c.is_blocked)
            .bind(c.notifications_enabled)
            .bind(c.reminders_enabled)
            .bind(c.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn find_customer(&self, id: &str) -> Result<Option<Customer>, AppError> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn create_service(&self, s: &Service) -> Result<Service, AppError> {
        sqlx::query_as::<_, Service>(
            "INSERT INTO services (id, name, duration_min, created_at) VALUES ($1, $2, $3, $4) RETURNING *"
        )
            .bind(&s.id)
            .bind(&s.name)
            .bind(s.duration_min)
            .bind(s.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_db)
    }

    async fn find_service(&self, id: &str) -> Result<Option<Service>, AppError> {
        sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_db)
    }
}
