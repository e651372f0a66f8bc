use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{
    BookingListQuery, BookingStatus, CreateBookingRequest, PaymentStatus,
    UpdatePaymentRequest, UpdateStatusRequest, UserBookingsQuery,
};
use crate::services::BookingService;

// ==============================================================================
// BOOKING CREATION AND LOOKUP
// ==============================================================================

#[axum::debug_handler]
pub async fn create_booking(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = BookingService::new(&config);
    let booking = service.create_booking(request, &user).await?;

    Ok((StatusCode::CREATED, Json(json!(booking))))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(config): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);
    let booking = service.get_booking(&booking_id, &user).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn get_user_bookings(
    State(config): State<Arc<AppConfig>>,
    Path(user_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Query(query): Query<UserBookingsQuery>,
) -> Result<Json<Value>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<BookingStatus>)
        .transpose()?;

    let service = BookingService::new(&config);
    let bookings = service.list_user_bookings(&user_id, status, &user).await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);
    let bookings = service.list_bookings(query, &user).await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

// ==============================================================================
// STATUS AND PAYMENT
// ==============================================================================

#[axum::debug_handler]
pub async fn update_booking_status(
    State(config): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    // Unknown statuses are rejected before anything is read or written.
    let new_status: BookingStatus = request.status.parse()?;
    debug!("User {} requests booking {} -> {}", user.id, booking_id, new_status);

    let service = BookingService::new(&config);
    let booking = service.update_status(&booking_id, new_status, &user).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(config): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&config);
    let booking = service.cancel_booking(&booking_id, &user).await?;

    Ok(Json(json!({
        "booking": booking,
        "message": "Booking cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_payment_status(
    State(config): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;
    let payment_status: PaymentStatus = request.payment_status.parse()?;

    let service = BookingService::new(&config);
    let booking = service.update_payment_status(&booking_id, payment_status).await?;

    Ok(Json(json!(booking)))
}
