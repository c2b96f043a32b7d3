use crate::domain::{models::session::SessionRecord, ports::SessionRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepo {
    async fn create(&self, session: &SessionRecord) -> Result<SessionRecord, AppError> {
        sqlx::query_as::<_, SessionRecord>(
            "INSERT INTO sessions (id, token_hash, user_id, role, expires_at, created_at) VALUES (?, ?, ?, ?, ?, ?) RETURNING *"
        )
            .bind(&session.id).bind(&session.token_hash).bind(&session.user_id)
            .bind(&session.role).bind(session.expires_at).bind(session.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::from_db)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<SessionRecord>, AppError> {
        sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(token_hash).fetch_optional(&self.pool).await.map_err(AppError::from_db)
    }
}
