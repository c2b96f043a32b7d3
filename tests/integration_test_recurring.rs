mod common;

use axum::http::StatusCode;
use barber_booking::domain::models::reservation::ReservationSource;
use barber_booking::domain::models::schedule::{DayOfWeek, WorkDay};
use barber_booking::domain::services::reservation_service::CreateReservationCommand;
use chrono::Utc;
use common::{at, next_weekday, TestApp};
use serde_json::{json, Value};

fn recurring_body(barber_id: &str, customer_id: &str, service_id: &str, day: &str, time: &str) -> Value {
    json!({
        "barberId": barber_id,
        "customerId": customer_id,
        "serviceId": service_id,
        "dayOfWeek": day,
        "timeSlot": time,
    })
}

#[tokio::test]
async fn test_create_reports_conflicting_reservations() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let carol = app.seed_customer("Carol").await;
    let staff = app.staff_token().await;
    let tuesday = next_weekday(DayOfWeek::Tuesday);

    let booked = app.state.reservations.create(CreateReservationCommand {
        barber_id: barber.id.clone(),
        service_id: service.id.clone(),
        customer_id: alice.id.clone(),
        customer_name: alice.name.clone(),
        customer_phone: alice.phone.clone(),
        start: at(tuesday, "14:00"),
        expected_date: None,
        expected_day: None,
        barber_notes: None,
        source: ReservationSource::SelfService,
    }, Utc::now()).await.unwrap();

    let (status, body) = app.request("POST", "/api/v1/recurring", Some(&staff),
        Some(recurring_body(&barber.id, &carol.id, &service.id, "Tuesday", "14:00"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["recurring"]["dayOfWeek"], "tuesday");
    assert_eq!(body["recurring"]["timeSlot"], "14:00");
    assert_eq!(body["recurring"]["createdBy"], "admin-1");

    // The one-off reservation is reported, not cancelled.
    let conflicts = body["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["reservationId"], booked.id);
    assert_eq!(conflicts[0]["customerName"], "Alice");
    let still_booked = app.state.reservations.find(&booked.id).await.unwrap();
    assert_eq!(still_booked.status, "confirmed");
}

#[tokio::test]
async fn test_second_active_pattern_on_same_slot_conflicts() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let carol = app.seed_customer("Carol").await;
    let staff = app.staff_token().await;

    let (status, first) = app.request("POST", "/api/v1/recurring", Some(&staff),
        Some(recurring_body(&barber.id, &alice.id, &service.id, "friday", "10:00"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request("POST", "/api/v1/recurring", Some(&staff),
        Some(recurring_body(&barber.id, &carol.id, &service.id, "fri", "10:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SLOT_CONFLICT");

    let id = first["recurring"]["id"].as_str().unwrap();
    let (status, _) = app.request("DELETE", &format!("/api/v1/recurring/{}", id), Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);

    // A deactivated pattern frees the slot.
    let (status, _) = app.request("POST", "/api/v1/recurring", Some(&staff),
        Some(recurring_body(&barber.id, &carol.id, &service.id, "friday", "10:00"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request("DELETE", &format!("/api/v1/recurring/{}", id), Some(&staff), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_create_rejections() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let long_service = app.seed_service("Colour", 90).await;
    let alice = app.seed_customer("Alice").await;
    let blocked = app.seed_customer("Mallory").await;
    let staff = app.staff_token().await;

    sqlx::query("UPDATE customers SET is_blocked = 1 WHERE id = ?")
        .bind(&blocked.id)
        .execute(&app.pool)
        .await
        .unwrap();
    let day_off = WorkDay::new(barber.id.clone(), DayOfWeek::Monday, false, "09:00".into(), "19:00".into());
    app.state.repos.schedule.upsert_work_day(&day_off).await.unwrap();

    let cases = [
        (recurring_body(&barber.id, "ghost", &service.id, "tuesday", "10:00"), StatusCode::NOT_FOUND, "CUSTOMER_NOT_FOUND"),
        (recurring_body(&barber.id, &blocked.id, &service.id, "tuesday", "10:00"), StatusCode::UNPROCESSABLE_ENTITY, "CUSTOMER_BLOCKED"),
        (recurring_body(&barber.id, &alice.id, "ghost", "tuesday", "10:00"), StatusCode::NOT_FOUND, "SERVICE_NOT_FOUND"),
        (recurring_body(&barber.id, &alice.id, &service.id, "monday", "10:00"), StatusCode::UNPROCESSABLE_ENTITY, "BARBER_NOT_WORKING"),
        (recurring_body(&barber.id, &alice.id, &service.id, "tuesday", "25:00"), StatusCode::BAD_REQUEST, "INVALID_TIME_SLOT"),
        (recurring_body(&barber.id, &alice.id, &service.id, "tuesday", "10:15"), StatusCode::BAD_REQUEST, "INVALID_TIME_SLOT"),
        (recurring_body(&barber.id, &alice.id, &long_service.id, "tuesday", "18:00"), StatusCode::BAD_REQUEST, "INVALID_TIME_SLOT"),
        (recurring_body(&barber.id, &alice.id, &service.id, "someday", "10:00"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
    ];

    for (body, expected_status, expected_code) in cases {
        let (status, response) = app.request("POST", "/api/v1/recurring", Some(&staff), Some(body.clone())).await;
        assert_eq!(status, expected_status, "body: {}", body);
        assert_eq!(response["error"], expected_code, "body: {}", body);
    }
}

#[tokio::test]
async fn test_recurring_requires_staff() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let token = app.issue_session(&alice.id, barber_booking::domain::models::session::Role::Customer).await;

    let body = recurring_body(&barber.id, &alice.id, &service.id, "tuesday", "10:00");
    let (status, _) = app.request("POST", "/api/v1/recurring", Some(&token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.request("POST", "/api/v1/recurring", None, Some(body)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
