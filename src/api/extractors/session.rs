use axum::{
    extract::{FromRequestParts, FromRef},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{warn, Span};

use crate::domain::models::session::{SessionContext, SessionUser};
use crate::domain::services::session::SessionValidation;
use crate::state::AppState;

pub enum SessionRejection {
    /// Session storage unreachable; the client must keep its token and retry later.
    Offline { attempts: u32 },
    Unauthorized(String),
    Forbidden,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            SessionRejection::Offline { attempts } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "OFFLINE",
                format!("Session could not be verified after {} attempts", attempts),
            ),
            SessionRejection::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", reason),
            SessionRejection::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN", "Staff session required".to_string()),
        };
        (status, Json(json!({ "success": false, "error": code, "message": message }))).into_response()
    }
}

/// Any valid session, taken from `Authorization: Bearer <token>`.
pub struct AuthSession(pub SessionUser);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts.headers.get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| SessionRejection::Unauthorized("missing bearer token".into()))?
            .to_string();

        let app_state = <Arc<AppState> as FromRef<S>>::from_ref(state);

        match app_state.sessions.validate(&SessionContext { token }, Utc::now()).await {
            SessionValidation::Valid { user } => {
                Span::current().record("user_id", &user.user_id);
                Ok(AuthSession(user))
            }
            SessionValidation::NetworkError { attempts } => {
                warn!(attempts, "session check failed on storage errors");
                Err(SessionRejection::Offline { attempts })
            }
            SessionValidation::AuthError { reason } => Err(SessionRejection::Unauthorized(reason)),
        }
    }
}

/// A valid admin or barber session.
pub struct StaffSession(pub SessionUser);

impl<S> FromRequestParts<S> for StaffSession
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthSession(user) = AuthSession::from_request_parts(parts, state).await?;
        if !user.role.is_staff() {
            return Err(SessionRejection::Forbidden);
        }
        Ok(StaffSession(user))
    }
}
