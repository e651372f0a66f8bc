use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    extract::{Extension, Path, State},
    http::{Request, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use facility_cell::handlers::{create_facility, delete_facility, update_facility};
use facility_cell::models::{
    CreateFacilityRequest, DayHours, Location, OperatingHours, UpdateFacilityRequest,
};
use facility_cell::router::facility_routes;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockDataResponses, TestConfig, TestUser};

fn facility_near(id: &Uuid, name: &str, latitude: f64, longitude: f64) -> Value {
    let mut row = MockDataResponses::facility_row(id, name, 20);
    row["location"] = json!({ "latitude": latitude, "longitude": longitude });
    row
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_nearby_search_orders_by_distance() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/facilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            facility_near(&Uuid::new_v4(), "Galway Clinic", 53.2707, -9.0568),
            facility_near(&Uuid::new_v4(), "Temple Bar Clinic", 53.3454, -6.2675),
            facility_near(&Uuid::new_v4(), "Spire Clinic", 53.3498, -6.2603)
        ])))
        .mount(&server)
        .await;

    let app = facility_routes(config.to_arc());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/?lat=53.3498&lng=-6.2603&radius_km=5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["facilities"][0]["name"], "Spire Clinic");
    assert_eq!(body["facilities"][1]["name"], "Temple Bar Clinic");
    assert!(body["facilities"][1]["distance_km"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_half_given_coordinates_are_rejected() {
    let app = facility_routes(TestConfig::default().to_arc());

    let response = app
        .oneshot(Request::builder().uri("/?lat=53.3").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_rejects_inverted_hours() {
    let config = TestConfig::default().to_arc();
    let admin = TestUser::admin("admin@example.com");

    let request = CreateFacilityRequest {
        name: "Night Clinic".to_string(),
        address: "2 High Street".to_string(),
        phone: None,
        operating_hours: OperatingHours {
            monday: Some(DayHours {
                open: "20:00:00".parse().unwrap(),
                close: "08:00:00".parse().unwrap(),
            }),
            ..Default::default()
        },
        location: Location { latitude: 53.0, longitude: -6.0 },
        max_bookings_per_day: 40,
        is_active: None,
    };

    let result = create_facility(State(config), Extension(admin.to_user()), Json(request)).await;
    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_update_unknown_facility_is_not_found() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@example.com");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/facilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = update_facility(
        State(config),
        Path(Uuid::new_v4()),
        Extension(admin.to_user()),
        Json(UpdateFacilityRequest {
            max_bookings_per_day: Some(15),
            ..Default::default()
        }),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_patient_cannot_update_facility() {
    let config = TestConfig::default().to_arc();
    let patient = TestUser::patient("pat@example.com");

    let result = update_facility(
        State(config),
        Path(Uuid::new_v4()),
        Extension(patient.to_user()),
        Json(UpdateFacilityRequest::default()),
    )
    .await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_deleted_facility_disappears_from_list() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri());
    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, None);

    let kept = Uuid::new_v4();
    let removed = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/facilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::facility_row(&kept, "North Clinic", 20),
            MockDataResponses::facility_row(&removed, "South Clinic", 20)
        ])))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/facilities"))
        .and(query_param("id", format!("eq.{}", removed)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::facility_row(&removed, "South Clinic", 20)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/facilities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockDataResponses::facility_row(&kept, "North Clinic", 20)
        ])))
        .mount(&server)
        .await;

    let app = facility_routes(config.to_arc());

    let before = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(before).await["total"], 2);

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/{}", removed))
                .header("Authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let after = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(after).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["facilities"][0]["id"], kept.to_string());
}

#[tokio::test]
async fn test_facility_with_bookings_cannot_be_deleted() {
    let server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&server.uri()).to_arc();
    let admin = TestUser::admin("admin@example.com");

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/facilities"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "message": "update or delete on table \"facilities\" violates foreign key constraint"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = delete_facility(State(config), Path(Uuid::new_v4()), Extension(admin.to_user())).await;

    assert_matches!(
        result,
        Err(AppError::Conflict(msg)) if msg == "Facility has bookings and cannot be deleted"
    );
}
