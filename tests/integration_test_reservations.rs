mod common;

use axum::http::StatusCode;
use barber_booking::domain::models::closure::ClosurePolicy;
use barber_booking::domain::models::reservation::ReservationSource;
use barber_booking::domain::models::schedule::{DayOfWeek, WorkDay};
use barber_booking::domain::models::session::Role;
use barber_booking::domain::services::closure_service::CreateClosureCommand;
use barber_booking::domain::services::reservation_service::{CreateReservationCommand, ReservationError};
use chrono::{Duration, Utc};
use common::{at, booking_body, next_weekday, TestApp};
use serde_json::json;

fn command(barber_id: &str, service_id: &str, customer_id: &str, start: chrono::DateTime<Utc>, source: ReservationSource) -> CreateReservationCommand {
    CreateReservationCommand {
        barber_id: barber_id.to_string(),
        service_id: service_id.to_string(),
        customer_id: customer_id.to_string(),
        customer_name: "Customer".to_string(),
        customer_phone: "+15550100".to_string(),
        start,
        expected_date: None,
        expected_day: None,
        barber_notes: None,
        source,
    }
}

#[tokio::test]
async fn test_taken_slot_rejected_next_slot_accepted() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let carol = app.seed_customer("Carol").await;
    let date = next_weekday(DayOfWeek::Wednesday);

    let (status, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, at(date, "11:00"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert!(body["reservationId"].is_string());

    let (status, body) = app.book_as(&carol, booking_body(&barber, &service, &carol, at(date, "11:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "SLOT_ALREADY_TAKEN");

    let (status, _) = app.book_as(&carol, booking_body(&barber, &service, &carol, at(date, "11:30"))).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_concurrent_requests_have_one_winner() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let start = at(next_weekday(DayOfWeek::Thursday), "15:00");

    let mut customers = Vec::new();
    for i in 0..12 {
        customers.push(app.seed_customer(&format!("Customer {}", i)).await);
    }

    let mut handles = Vec::new();
    for customer in &customers {
        let service_handle = app.state.reservations.clone();
        let cmd = command(&barber.id, &service.id, &customer.id, start, ReservationSource::SelfService);
        handles.push(tokio::spawn(async move { service_handle.create(cmd, Utc::now()).await }));
    }

    let mut won = 0;
    let mut lost = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => won += 1,
            Err(ReservationError::SlotAlreadyTaken) => lost += 1,
            Err(other) => panic!("unexpected outcome: {:?}", other),
        }
    }
    assert_eq!(won, 1);
    assert_eq!(lost, customers.len() - 1);

    let holders = app.state.repos.reservations
        .list_confirmed_in_slots(&barber.id, start.timestamp() / 60, start.timestamp() / 60)
        .await
        .unwrap();
    assert_eq!(holders.len(), 1);
}

#[tokio::test]
async fn test_same_customer_cannot_double_book_across_entry_points() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let staff = app.staff_token().await;
    let start = at(next_weekday(DayOfWeek::Friday), "10:00");

    let (status, _) = app.book_as(&alice, booking_body(&barber, &service, &alice, start)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request("POST", "/api/v1/reservations/manual", Some(&staff), Some(booking_body(&barber, &service, &alice, start))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CUSTOMER_DOUBLE_BOOKING");

    // Same customer resubmitting through self-service.
    let (_, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, start)).await;
    assert_eq!(body["error"], "CUSTOMER_DOUBLE_BOOKING");
}

#[tokio::test]
async fn test_manual_booking_may_fall_outside_work_window() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let staff = app.staff_token().await;
    let late = at(next_weekday(DayOfWeek::Monday), "20:00");

    let (status, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, late)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "OUTSIDE_WORKING_HOURS");

    let (status, body) = app.request("POST", "/api/v1/reservations/manual", Some(&staff), Some(booking_body(&barber, &service, &alice, late))).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let customer_token = app.issue_session(&alice.id, Role::Customer).await;
    let (status, body) = app.request("POST", "/api/v1/reservations/manual", Some(&customer_token), Some(booking_body(&barber, &service, &alice, late))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn test_business_rules_reject_bookings() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let tuesday = next_weekday(DayOfWeek::Tuesday);

    // Off-grid minute.
    let (_, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, at(tuesday, "10:15"))).await;
    assert_eq!(body["error"], "OUTSIDE_WORKING_HOURS");

    // Day off.
    let off = WorkDay::new(barber.id.clone(), DayOfWeek::Tuesday, false, "09:00".into(), "17:00".into());
    app.state.repos.schedule.upsert_work_day(&off).await.unwrap();
    let (_, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, at(tuesday, "10:00"))).await;
    assert_eq!(body["error"], "BARBER_NOT_WORKING");

    // Past.
    let past = Utc::now() - Duration::hours(2);
    let (status, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, past)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");

    // Unknown service.
    let mut body_json = booking_body(&barber, &service, &alice, at(next_weekday(DayOfWeek::Wednesday), "10:00"));
    body_json["serviceId"] = json!("missing");
    let (status, body) = app.book_as(&alice, body_json).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SERVICE_NOT_FOUND");
}

#[tokio::test]
async fn test_day_fields_must_match_start() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let start = at(next_weekday(DayOfWeek::Wednesday), "10:00");

    let mut body_json = booking_body(&barber, &service, &alice, start);
    body_json["dayName"] = json!("monday");
    let (_, body) = app.book_as(&alice, body_json).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");

    let mut body_json = booking_body(&barber, &service, &alice, start);
    body_json["dateTimestamp"] = json!((start + Duration::days(1)).timestamp_millis());
    let (_, body) = app.book_as(&alice, body_json).await;
    assert_eq!(body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_blocked_customer_and_closed_day() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let date = next_weekday(DayOfWeek::Saturday);

    sqlx::query("UPDATE customers SET is_blocked = 1 WHERE id = ?").bind(&alice.id).execute(&app.pool).await.unwrap();
    let (status, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, at(date, "10:00"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "CUSTOMER_BLOCKED");

    let carol = app.seed_customer("Carol").await;
    app.state.closures.create(CreateClosureCommand {
        barber_id: None,
        start_date: date,
        end_date: date,
        reason: Some("Holiday".into()),
        created_by: "admin-1".into(),
        policy: Some(ClosurePolicy::Keep),
    }).await.unwrap();
    let (_, body) = app.book_as(&carol, booking_body(&barber, &service, &carol, at(date, "10:00"))).await;
    assert_eq!(body["error"], "CLOSED");
}

#[tokio::test]
async fn test_recurring_block_wins_over_booking() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let carol = app.seed_customer("Carol").await;
    let staff = app.staff_token().await;

    let (status, _) = app.request("POST", "/api/v1/recurring", Some(&staff), Some(json!({
        "barberId": barber.id, "customerId": alice.id, "serviceId": service.id,
        "dayOfWeek": "tuesday", "timeSlot": "14:00", "createdBy": "admin-1"
    }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let start = at(next_weekday(DayOfWeek::Tuesday), "14:00");
    let (_, body) = app.book_as(&carol, booking_body(&barber, &service, &carol, start)).await;
    assert_eq!(body["error"], "SLOT_ALREADY_TAKEN");

    // Manual bookings obey recurring blocks too.
    let (_, body) = app.request("POST", "/api/v1/reservations/manual", Some(&staff), Some(booking_body(&barber, &service, &carol, start))).await;
    assert_eq!(body["error"], "SLOT_ALREADY_TAKEN");
}

#[tokio::test]
async fn test_cancel_and_complete_transitions() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let carol = app.seed_customer("Carol").await;
    let staff = app.staff_token().await;
    let start = at(next_weekday(DayOfWeek::Thursday), "09:30");

    let (_, body) = app.book_as(&alice, booking_body(&barber, &service, &alice, start)).await;
    let id = body["reservationId"].as_str().unwrap().to_string();

    // Another customer may not cancel it.
    let carol_token = app.issue_session(&carol.id, Role::Customer).await;
    let (status, _) = app.request("POST", &format!("/api/v1/reservations/{}/cancel", id), Some(&carol_token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let alice_token = app.issue_session(&alice.id, Role::Customer).await;
    let (status, body) = app.request("POST", &format!("/api/v1/reservations/{}/cancel", id), Some(&alice_token), Some(json!({"reason": "Sick"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let stored = app.state.repos.reservations.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
    assert_eq!(stored.cancelled_by.as_deref(), Some(alice.id.as_str()));
    assert_eq!(stored.cancel_reason.as_deref(), Some("Sick"));

    let (status, body) = app.request("POST", &format!("/api/v1/reservations/{}/complete", id), Some(&staff), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "INVALID_TRANSITION");

    // Cancelling frees the slot.
    let (status, body) = app.book_as(&carol, booking_body(&barber, &service, &carol, start)).await;
    assert_eq!(status, StatusCode::CREATED);
    let rebooked = body["reservationId"].as_str().unwrap().to_string();

    let (status, body) = app.request("POST", &format!("/api/v1/reservations/{}/complete", rebooked), Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = app.request("POST", "/api/v1/reservations/missing/complete", Some(&staff), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_batch_cancel_reports_each_outcome() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let staff = app.staff_token().await;
    let date = next_weekday(DayOfWeek::Friday);

    let first = app.state.reservations.create(command(&barber.id, &service.id, &alice.id, at(date, "09:00"), ReservationSource::SelfService), Utc::now()).await.unwrap();
    let second = app.state.reservations.create(command(&barber.id, &service.id, &alice.id, at(date, "09:30"), ReservationSource::SelfService), Utc::now()).await.unwrap();

    let (status, body) = app.request("POST", "/api/v1/reservations/cancel-batch", Some(&staff), Some(json!({
        "reservationIds": [first.id, "missing", second.id],
        "reason": "Recurring slot"
    }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["error"], "NOT_FOUND");
    assert_eq!(results[2]["success"], true);

    let stored = app.state.repos.reservations.find_by_id(&second.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "cancelled");
    assert_eq!(stored.cancel_reason.as_deref(), Some("Recurring slot"));
}

#[tokio::test]
async fn test_neighbouring_minute_counts_as_the_same_slot() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let carol = app.seed_customer("Carol").await;
    let staff = app.staff_token().await;
    let date = next_weekday(DayOfWeek::Wednesday);

    let (status, _) = app.book_as(&alice, booking_body(&barber, &service, &alice, at(date, "10:00"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.request("POST", "/api/v1/reservations/manual", Some(&staff),
        Some(booking_body(&barber, &service, &carol, at(date, "10:01")))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SLOT_ALREADY_TAKEN");

    let (status, body) = app.request("POST", "/api/v1/reservations/manual", Some(&staff),
        Some(booking_body(&barber, &service, &alice, at(date, "09:59")))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "CUSTOMER_DOUBLE_BOOKING");

    // Outside the tolerance the manual booking goes through.
    let (status, _) = app.request("POST", "/api/v1/reservations/manual", Some(&staff),
        Some(booking_body(&barber, &service, &carol, at(date, "10:02")))).await;
    assert_eq!(status, StatusCode::CREATED);

    let confirmed: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE barber_id = ? AND status = 'confirmed'")
        .bind(&barber.id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(confirmed, 2);
}

#[tokio::test]
async fn test_self_service_booking_requires_own_session() {
    let app = TestApp::new().await;
    let barber = app.seed_barber("Bob").await;
    let service = app.seed_service("Cut", 30).await;
    let alice = app.seed_customer("Alice").await;
    let carol = app.seed_customer("Carol").await;
    let start = at(next_weekday(DayOfWeek::Thursday), "11:00");

    let (status, _) = app.request("POST", "/api/v1/reservations", None, Some(booking_body(&barber, &service, &alice, start))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let carol_token = app.issue_session(&carol.id, Role::Customer).await;
    let (status, _) = app.request("POST", "/api/v1/reservations", Some(&carol_token), Some(booking_body(&barber, &service, &alice, start))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Staff may book on a customer's behalf through the same route.
    let staff = app.staff_token().await;
    let (status, _) = app.request("POST", "/api/v1/reservations", Some(&staff), Some(booking_body(&barber, &service, &alice, start))).await;
    assert_eq!(status, StatusCode::CREATED);
}
