use barber_booking::{
    api::router::create_router,
    state::{AppState, Repositories},
    config::Config,
    infra::factory::{build_state, sqlite_repositories},
    domain::models::{
        directory::{Barber, Customer, Service},
        schedule::DayOfWeek,
        session::{Role, SessionRecord},
        subscription::{NewSubscriptionParams, PushSubscriptionRecord, Recipient},
    },
    domain::ports::{DeliveryError, PushTransport},
    domain::services::clock,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use std::str::FromStr;
use async_trait::async_trait;
use tower::ServiceExt;
use serde_json::Value;

/// Push transport double. Endpoints listed in `failures` fail with the given
/// status (`None` for a network-level error), endpoints in `hanging` never
/// answer; every other send succeeds.
#[derive(Default)]
pub struct MockTransport {
    failures: Mutex<HashMap<String, Option<u16>>>,
    hanging: Mutex<HashSet<String>>,
    sent: Mutex<Vec<(String, String)>>,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn fail_endpoint(&self, endpoint: &str, status: Option<u16>) {
        self.failures.lock().unwrap().insert(endpoint.to_string(), status);
    }

    pub fn hang_endpoint(&self, endpoint: &str) {
        self.hanging.lock().unwrap().insert(endpoint.to_string());
    }

    pub fn attempts_for(&self, endpoint: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|(e, _)| e == endpoint).count()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.sent.lock().unwrap().iter()
            .map(|(_, body)| serde_json::from_str(body).unwrap())
            .collect()
    }
}

#[async_trait]
impl PushTransport for MockTransport {
    async fn send(&self, subscription: &PushSubscriptionRecord, payload: &str) -> Result<(), DeliveryError> {
        self.sent.lock().unwrap().push((subscription.endpoint.clone(), payload.to_string()));
        let hangs = self.hanging.lock().unwrap().contains(&subscription.endpoint);
        if hangs {
            std::future::pending::<()>().await;
        }
        match self.failures.lock().unwrap().get(&subscription.endpoint) {
            Some(status) => Err(DeliveryError::new(*status, "mock delivery failure")),
            None => Ok(()),
        }
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub transport: Arc<MockTransport>,
    pub config: Config,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::build(|_| {}, |repos| repos, true).await
    }

    pub async fn with_config(tweak: impl FnOnce(&mut Config)) -> Self {
        Self::build(tweak, |repos| repos, true).await
    }

    pub async fn without_push() -> Self {
        Self::build(|_| {}, |repos| repos, false).await
    }

    /// Lets a test swap individual repositories, e.g. for fault injection.
    pub async fn with_repositories(wrap: impl FnOnce(Repositories) -> Repositories) -> Self {
        Self::build(|_| {}, wrap, true).await
    }

    async fn build(
        tweak: impl FnOnce(&mut Config),
        wrap: impl FnOnce(Repositories) -> Repositories,
        push: bool,
    ) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut config = Config::with_database(db_url);
        config.push_send_timeout_ms = 2_000;
        config.session_retry_initial_ms = 5;
        tweak(&mut config);

        let transport = Arc::new(MockTransport::default());
        let push_transport: Option<Arc<dyn PushTransport>> = if push { Some(transport.clone()) } else { None };

        let state = Arc::new(build_state(&config, wrap(sqlite_repositories(pool.clone())), push_transport));
        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            transport,
            config,
        }
    }

    pub async fn seed_barber(&self, name: &str) -> Barber {
        self.state.repos.directory.create_barber(&Barber::new(name.to_string())).await.unwrap()
    }

    pub async fn seed_customer(&self, name: &str) -> Customer {
        self.state.repos.directory.create_customer(&Customer::new(name.to_string(), "+15550100".to_string())).await.unwrap()
    }

    pub async fn seed_service(&self, name: &str, duration_min: i32) -> Service {
        self.state.repos.directory.create_service(&Service::new(name.to_string(), duration_min)).await.unwrap()
    }

    /// Persists a session and returns the bearer token.
    pub async fn issue_session(&self, user_id: &str, role: Role) -> String {
        let (record, token) = SessionRecord::issue(user_id.to_string(), role, ChronoDuration::hours(1));
        self.state.repos.sessions.create(&record).await.unwrap();
        token
    }

    pub async fn staff_token(&self) -> String {
        self.issue_session("admin-1", Role::Admin).await
    }

    /// Books through the self-service route with the customer's own session.
    pub async fn book_as(&self, customer: &Customer, body: Value) -> (StatusCode, Value) {
        let token = self.issue_session(&customer.id, Role::Customer).await;
        self.request("POST", "/api/v1/reservations", Some(&token), Some(body)).await
    }

    pub async fn register_device(&self, owner: Recipient, endpoint: &str) -> PushSubscriptionRecord {
        self.state.registry.subscribe(NewSubscriptionParams {
            owner,
            endpoint: endpoint.to_string(),
            p256dh: "BNcRdreALRFXTkOOUHK1EtK2wtaz5Ry4YfYCA_0QTpQtUbVlUls0VJXg7A8u-Ts1XbjhazAkj7I99e8QcYP7DkM".to_string(),
            auth: "tBHItJI5svbpez7KI4CCXg".to_string(),
            device_type: "web".to_string(),
            device_name: None,
            user_agent: Some("test-agent".to_string()),
        }).await.unwrap()
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, json)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

/// Next date strictly after today (UTC) that falls on `day`.
#[allow(dead_code)]
pub fn next_weekday(day: DayOfWeek) -> NaiveDate {
    let mut date = Utc::now().date_naive() + ChronoDuration::days(1);
    while clock::day_of_date(date) != day {
        date += ChronoDuration::days(1);
    }
    date
}

#[allow(dead_code)]
pub fn at(date: NaiveDate, hhmm: &str) -> DateTime<Utc> {
    date.and_time(clock::parse_time_slot(hhmm).unwrap()).and_utc()
}

/// Booking form body for `start`, with the day fields derived from it.
#[allow(dead_code)]
pub fn booking_body(barber: &Barber, service: &Service, customer: &Customer, start: DateTime<Utc>) -> Value {
    serde_json::json!({
        "barberId": barber.id,
        "serviceId": service.id,
        "customerId": customer.id,
        "customerName": customer.name,
        "customerPhone": customer.phone,
        "dateTimestamp": start.timestamp_millis(),
        "timeTimestamp": start.timestamp_millis(),
        "dayName": clock::day_of_date(start.date_naive()).as_str(),
    })
}
