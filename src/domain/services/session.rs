use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::models::session::{hash_token, Role, SessionContext, SessionUser};
use crate::domain::ports::SessionRepository;
use crate::domain::services::retry::{with_retry, RetryPolicy};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionValidation {
    Valid { user: SessionUser },
    /// Storage unreachable after retrying; the client keeps its session.
    NetworkError { attempts: u32 },
    AuthError { reason: String },
}

/// Read-only session check. Retries transient storage errors only and never
/// deletes or rewrites the stored session.
pub struct SessionValidator {
    repo: Arc<dyn SessionRepository>,
    retry: RetryPolicy,
}

impl SessionValidator {
    pub fn new(repo: Arc<dyn SessionRepository>, retry: RetryPolicy) -> Self {
        Self { repo, retry }
    }

    pub async fn validate(&self, ctx: &SessionContext, now: DateTime<Utc>) -> SessionValidation {
        let token = ctx.token.trim();
        if token.is_empty() {
            return SessionValidation::AuthError { reason: "missing token".into() };
        }
        let token_hash = hash_token(token);

        let lookup = with_retry(
            "session.validate",
            self.retry,
            AppError::is_transient,
            || self.repo.find_by_token_hash(&token_hash),
        ).await;

        let record = match lookup {
            Ok(Some(record)) => record,
            Ok(None) => return SessionValidation::AuthError { reason: "unknown session".into() },
            Err(failure) if failure.retryable => {
                warn!(attempts = failure.attempts, "session storage unreachable: {}", failure.error);
                return SessionValidation::NetworkError { attempts: failure.attempts };
            }
            Err(failure) => return SessionValidation::AuthError { reason: failure.error.to_string() },
        };

        if record.expires_at <= now {
            return SessionValidation::AuthError { reason: "session expired".into() };
        }
        let Some(role) = Role::parse(&record.role) else {
            return SessionValidation::AuthError { reason: format!("unknown role {}", record.role) };
        };
        debug!(user_id = %record.user_id, role = role.as_str(), "session validated");
        SessionValidation::Valid { user: SessionUser { user_id: record.user_id, role } }
    }
}
