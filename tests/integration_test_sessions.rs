mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use barber_booking::domain::models::session::{Role, SessionContext, SessionRecord};
use barber_booking::domain::ports::SessionRepository;
use barber_booking::domain::services::session::SessionValidation;
use barber_booking::error::AppError;
use chrono::{Duration, Utc};
use common::TestApp;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Session store whose lookups can be switched to fail like an unreachable
/// database (`offline`) or like a schema mismatch (`broken`).
struct FlakySessionRepo {
    inner: Arc<dyn SessionRepository>,
    offline: AtomicBool,
    broken: AtomicBool,
    lookups: AtomicUsize,
}

impl FlakySessionRepo {
    fn wrap(inner: Arc<dyn SessionRepository>) -> Self {
        Self { inner, offline: AtomicBool::new(false), broken: AtomicBool::new(false), lookups: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl SessionRepository for FlakySessionRepo {
    async fn create(&self, session: &SessionRecord) -> Result<SessionRecord, AppError> {
        self.inner.create(session).await
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<SessionRecord>, AppError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        if self.broken.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::ColumnNotFound("expires_at".into())));
        }
        self.inner.find_by_token_hash(token_hash).await
    }
}

async fn flaky_app() -> (TestApp, Arc<FlakySessionRepo>) {
    let mut handle = None;
    let app = TestApp::with_repositories(|mut repos| {
        let flaky = Arc::new(FlakySessionRepo::wrap(repos.sessions.clone()));
        handle = Some(flaky.clone());
        repos.sessions = flaky;
        repos
    }).await;
    (app, handle.unwrap())
}

#[tokio::test]
async fn test_storage_outage_is_a_network_error_not_a_logout() {
    let (app, flaky) = flaky_app().await;
    let token = app.issue_session("barber-7", Role::Barber).await;

    flaky.offline.store(true, Ordering::SeqCst);
    let result = app.state.sessions.validate(&SessionContext { token: token.clone() }, Utc::now()).await;
    assert_eq!(result, SessionValidation::NetworkError { attempts: 3 });
    assert_eq!(flaky.lookups.load(Ordering::SeqCst), 3);

    let (status, body) = app.request("GET", "/api/v1/notifications/logs?recipientId=x&recipientType=barber", Some(&token), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "OFFLINE");

    // The stored session survives the outage untouched.
    flaky.offline.store(false, Ordering::SeqCst);
    match app.state.sessions.validate(&SessionContext { token: token.clone() }, Utc::now()).await {
        SessionValidation::Valid { user } => {
            assert_eq!(user.user_id, "barber-7");
            assert_eq!(user.role, Role::Barber);
        }
        other => panic!("expected a valid session, got {:?}", other),
    }
    let (status, _) = app.request("GET", "/api/v1/notifications/logs?recipientId=x&recipientType=barber", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_auth_failures_are_not_retried() {
    let (app, flaky) = flaky_app().await;

    let result = app.state.sessions.validate(&SessionContext { token: "not-a-real-token".into() }, Utc::now()).await;
    assert!(matches!(result, SessionValidation::AuthError { .. }));
    assert_eq!(flaky.lookups.load(Ordering::SeqCst), 1);

    let result = app.state.sessions.validate(&SessionContext { token: "   ".into() }, Utc::now()).await;
    assert!(matches!(result, SessionValidation::AuthError { .. }));
    assert_eq!(flaky.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_schema_errors_are_not_mistaken_for_an_outage() {
    let (app, flaky) = flaky_app().await;
    let token = app.issue_session("barber-7", Role::Barber).await;

    flaky.broken.store(true, Ordering::SeqCst);
    let result = app.state.sessions.validate(&SessionContext { token }, Utc::now()).await;
    assert!(matches!(result, SessionValidation::AuthError { .. }), "got {:?}", result);
    assert_eq!(flaky.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_expired_and_missing_tokens_are_unauthorized() {
    let app = TestApp::new().await;
    let (expired, token) = SessionRecord::issue("admin-2".to_string(), Role::Admin, Duration::minutes(-5));
    app.state.repos.sessions.create(&expired).await.unwrap();

    let (status, body) = app.request("POST", "/api/v1/closures", Some(&token), Some(json!({
        "startDate": "2030-01-01", "endDate": "2030-01-01"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
    assert_eq!(body["message"], "session expired");

    let (status, _) = app.request("POST", "/api/v1/closures", Some("unknown"), Some(json!({
        "startDate": "2030-01-01", "endDate": "2030-01-01"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.request("POST", "/api/v1/closures", None, Some(json!({
        "startDate": "2030-01-01", "endDate": "2030-01-01"
    }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_session_cannot_use_staff_routes() {
    let app = TestApp::new().await;
    let alice = app.seed_customer("Alice").await;
    let token = app.issue_session(&alice.id, Role::Customer).await;

    let (status, body) = app.request("POST", "/api/v1/closures", Some(&token), Some(json!({
        "startDate": "2030-01-01", "endDate": "2030-01-01"
    }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    // Non-staff routes still accept the session.
    let (status, _) = app.request("DELETE", "/api/v1/push/subscriptions", Some(&token),
        Some(json!({ "endpoint": "https://push.example/none" }))).await;
    assert_eq!(status, StatusCode::OK);
}
