use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    extract::{Extension, Path, Query, State},
    http::{Request, StatusCode},
    Json,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{any, body_partial_json, method, path, query_param};

use booking_cell::handlers::{
    create_booking, list_bookings, update_booking_status, update_payment_status,
};
use booking_cell::models::{
    BookingListQuery, CreateBookingRequest, UpdatePaymentRequest, UpdateStatusRequest,
};
use booking_cell::router::booking_routes;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockDataResponses, TestConfig, TestUser};

struct Catalog {
    vaccine_id: Uuid,
    facility_id: Uuid,
}

/// Vaccine with two doses and a facility open 08:00-18:00 taking
/// `max_per_day` bookings, with `already_booked` of them taken.
async fn mount_catalog(server: &MockServer, max_per_day: i32, already_booked: usize) -> Catalog {
    let catalog = Catalog {
        vaccine_id: Uuid::new_v4(),
        facility_id: Uuid::new_v4(),
    };

    Mock::given(method("GET"))
        .and(path("/rest/v1/vaccines"))
        .and(query_param("id", format!("eq.{}", catalog.vaccine_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::vaccine_row(&catalog.vaccine_id, "Measles")
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/facilities"))
        .and(query_param("id", format!("eq.{}", catalog.facility_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::facility_row(&catalog.facility_id, "North Clinic", max_per_day)
        ])))
        .mount(server)
        .await;

    let taken: Vec<Value> = (0..already_booked).map(|_| json!({ "id": Uuid::new_v4() })).collect();
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(taken)))
        .mount(server)
        .await;

    catalog
}

fn booking_request(catalog: &Catalog, date: NaiveDate, time: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        vaccine_id: catalog.vaccine_id,
        facility_id: catalog.facility_id,
        date,
        time: time.parse::<NaiveTime>().unwrap(),
        dose_number: None,
        notes: None,
        user_id: None,
    }
}

fn in_days(days: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days)).date_naive()
}

async fn mount_booking(server: &MockServer, booking_id: &Uuid, owner: &Uuid, status: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::booking_row(booking_id, owner, status)
        ])))
        .mount(server)
        .await;
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ==============================================================================
// CREATION
// ==============================================================================

#[tokio::test]
async fn test_create_booking_copies_vaccine_price() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@example.com");
    let catalog = mount_catalog(&server, 10, 3).await;
    let booking_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .and(body_partial_json(json!({
            "user_id": patient.id,
            "status": "pending",
            "payment_status": "pending",
            "price": 25.0,
            "dose_number": 1
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockDataResponses::booking_row(&booking_id, &patient.id, "pending")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (status, Json(body)) = create_booking(
        State(config),
        Extension(patient.to_user()),
        Json(booking_request(&catalog, in_days(3), "09:30")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], booking_id.to_string());
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_admin_booking_for_unknown_user_is_rejected() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@example.com");
    let catalog = mount_catalog(&server, 10, 0).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "message": "insert or update on table \"bookings\" violates foreign key constraint"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut request = booking_request(&catalog, in_days(3), "09:30");
    let ghost = Uuid::new_v4();
    request.user_id = Some(ghost);

    let result = create_booking(State(config), Extension(admin.to_user()), Json(request)).await;

    assert_matches!(
        result,
        Err(AppError::ValidationError(msg)) if msg == format!("Validation error: User {} does not exist", ghost)
    );
}

#[tokio::test]
async fn test_past_dates_are_rejected_before_lookup() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@example.com");

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let catalog = Catalog { vaccine_id: Uuid::new_v4(), facility_id: Uuid::new_v4() };
    let result = create_booking(
        State(config),
        Extension(patient.to_user()),
        Json(booking_request(&catalog, in_days(-1), "09:30")),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) if msg == "Booking date cannot be in the past");
}

#[tokio::test]
async fn test_booking_outside_opening_hours() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@example.com");
    let catalog = mount_catalog(&server, 10, 0).await;

    let result = create_booking(
        State(config),
        Extension(patient.to_user()),
        Json(booking_request(&catalog, in_days(2), "18:00")),
    )
    .await;

    assert_matches!(result, Err(AppError::BadRequest(msg)) if msg.contains("closed"));
}

#[tokio::test]
async fn test_dose_beyond_course_is_rejected() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@example.com");
    let catalog = mount_catalog(&server, 10, 0).await;

    let request = CreateBookingRequest {
        dose_number: Some(3),
        ..booking_request(&catalog, in_days(2), "10:00")
    };
    let result = create_booking(State(config), Extension(patient.to_user()), Json(request)).await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_full_facility_is_a_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@example.com");
    let catalog = mount_catalog(&server, 2, 2).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let result = create_booking(
        State(config),
        Extension(patient.to_user()),
        Json(booking_request(&catalog, in_days(2), "10:00")),
    )
    .await;

    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_patient_cannot_book_for_someone_else() {
    let config = TestConfig::default().to_arc();
    let patient = TestUser::patient("pat@example.com");
    let catalog = Catalog { vaccine_id: Uuid::new_v4(), facility_id: Uuid::new_v4() };

    let request = CreateBookingRequest {
        user_id: Some(Uuid::new_v4()),
        ..booking_request(&catalog, in_days(2), "10:00")
    };
    let result = create_booking(State(config), Extension(patient.to_user()), Json(request)).await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

// ==============================================================================
// STATUS TRANSITIONS
// ==============================================================================

#[tokio::test]
async fn test_unknown_status_is_rejected_without_storage_access() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri());
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, None);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = booking_routes(config.to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/{}/status", Uuid::new_v4()))
                .header("Authorization", format!("Bearer {}", token))
                .header("Content-Type", "application/json")
                .body(Body::from(json!({ "status": "shipped" }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Invalid booking status: shipped");
}

#[tokio::test]
async fn test_completed_booking_cannot_be_reconfirmed() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let doctor = TestUser::doctor("doc@example.com");
    let booking_id = Uuid::new_v4();
    mount_booking(&server, &booking_id, &Uuid::new_v4(), "completed").await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = update_booking_status(
        State(config),
        Path(booking_id),
        Extension(doctor.to_user()),
        Json(UpdateStatusRequest { status: "confirmed".to_string() }),
    )
    .await;

    assert_matches!(
        result,
        Err(AppError::Conflict(msg)) if msg == "Cannot change booking status from completed to confirmed"
    );
}

#[tokio::test]
async fn test_doctor_confirms_with_conditional_write() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let doctor = TestUser::doctor("doc@example.com");
    let booking_id = Uuid::new_v4();
    let owner = Uuid::new_v4();
    mount_booking(&server, &booking_id, &owner, "pending").await;

    let mut confirmed = MockDataResponses::booking_row(&booking_id, &owner, "confirmed");
    confirmed["doctor_id"] = json!(doctor.id);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", format!("eq.{}", booking_id)))
        .and(query_param("status", "eq.pending"))
        .and(body_partial_json(json!({ "status": "confirmed", "doctor_id": doctor.id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([confirmed])))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = update_booking_status(
        State(config),
        Path(booking_id),
        Extension(doctor.to_user()),
        Json(UpdateStatusRequest { status: "confirmed".to_string() }),
    )
    .await
    .unwrap();

    assert_eq!(body["status"], "confirmed");
    assert_eq!(body["doctor_id"], doctor.id.to_string());
}

#[tokio::test]
async fn test_lost_race_is_reported_as_conflict() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@example.com");
    let booking_id = Uuid::new_v4();
    mount_booking(&server, &booking_id, &patient.id, "pending").await;

    // Someone else moved the booking after it was read.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = update_booking_status(
        State(config),
        Path(booking_id),
        Extension(patient.to_user()),
        Json(UpdateStatusRequest { status: "cancelled".to_string() }),
    )
    .await;

    assert_matches!(result, Err(AppError::Conflict(_)));
}

#[tokio::test]
async fn test_owner_cannot_confirm_own_booking() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let patient = TestUser::patient("pat@example.com");
    let booking_id = Uuid::new_v4();
    mount_booking(&server, &booking_id, &patient.id, "pending").await;

    let result = update_booking_status(
        State(config),
        Path(booking_id),
        Extension(patient.to_user()),
        Json(UpdateStatusRequest { status: "confirmed".to_string() }),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_owner_cancels_through_router() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri());
    let patient = TestUser::patient("pat@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);
    let booking_id = Uuid::new_v4();
    mount_booking(&server, &booking_id, &patient.id, "confirmed").await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "eq.confirmed"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::booking_row(&booking_id, &patient.id, "cancelled")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = booking_routes(config.to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/{}/cancel", booking_id))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["booking"]["status"], "cancelled");
}

#[tokio::test]
async fn test_completion_via_status_uses_transactional_function() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let doctor = TestUser::doctor("doc@example.com");
    let booking_id = Uuid::new_v4();
    let owner = Uuid::new_v4();
    mount_booking(&server, &booking_id, &owner, "confirmed").await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/complete_booking"))
        .and(body_partial_json(json!({
            "p_booking_id": booking_id,
            "p_doctor_id": doctor.id,
            "p_batch_number": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completed",
            "booking": MockDataResponses::booking_row(&booking_id, &owner, "completed"),
            "history": MockDataResponses::history_row(&Uuid::new_v4(), &owner, "UNRECORDED")
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let Json(body) = update_booking_status(
        State(config),
        Path(booking_id),
        Extension(doctor.to_user()),
        Json(UpdateStatusRequest { status: "completed".to_string() }),
    )
    .await
    .unwrap();

    assert_eq!(body["status"], "completed");
}

// ==============================================================================
// LISTING AND PAYMENT
// ==============================================================================

#[tokio::test]
async fn test_patient_cannot_list_all_bookings() {
    let config = TestConfig::default().to_arc();
    let patient = TestUser::patient("pat@example.com");

    let result = list_bookings(
        State(config),
        Extension(patient.to_user()),
        Query(BookingListQuery::default()),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_admin_list_applies_filters() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@example.com");
    let facility_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("status", "eq.confirmed"))
        .and(query_param("facility_id", format!("eq.{}", facility_id)))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::booking_row(&Uuid::new_v4(), &Uuid::new_v4(), "confirmed")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = list_bookings(
        State(config),
        Extension(admin.to_user()),
        Query(BookingListQuery {
            status: Some("confirmed".to_string()),
            facility_id: Some(facility_id),
            limit: Some(20),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_payment_status_is_admin_only_and_validated() {
    let config = TestConfig::default().to_arc();
    let doctor = TestUser::doctor("doc@example.com");
    let admin = TestUser::admin("admin@example.com");

    let forbidden = update_payment_status(
        State(config.clone()),
        Path(Uuid::new_v4()),
        Extension(doctor.to_user()),
        Json(UpdatePaymentRequest { payment_status: "paid".to_string() }),
    )
    .await;
    assert_matches!(forbidden, Err(AppError::Forbidden(_)));

    let invalid = update_payment_status(
        State(config),
        Path(Uuid::new_v4()),
        Extension(admin.to_user()),
        Json(UpdatePaymentRequest { payment_status: "free".to_string() }),
    )
    .await;
    assert_matches!(invalid, Err(AppError::BadRequest(msg)) if msg == "Invalid payment status: free");
}
