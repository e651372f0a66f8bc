use std::sync::Arc;

use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};
use shared_models::error::AppError;
use shared_utils::extractor::require_role;

use crate::models::{
    CompleteBookingRequest, RegisterShiftRequest, ShiftBookingsQuery, ShiftCapacityQuery,
    ShiftListQuery,
};
use crate::services::ShiftService;

// ==============================================================================
// SHIFT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn register_shift(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<RegisterShiftRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, &[Role::Doctor])?;

    let shift_service = ShiftService::new(&state);
    let shift = shift_service.register_shift(request, &user).await?;

    Ok((StatusCode::CREATED, Json(json!(shift))))
}

#[axum::debug_handler]
pub async fn list_my_shifts(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ShiftListQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor])?;

    let shift_service = ShiftService::new(&state);
    let shifts = shift_service.list_shifts(&user.id, query).await?;

    Ok(Json(json!({
        "shifts": shifts,
        "total": shifts.len()
    })))
}

#[axum::debug_handler]
pub async fn cancel_shift(
    State(state): State<Arc<AppConfig>>,
    Path(shift_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let shift_service = ShiftService::new(&state);
    let shift = shift_service.cancel_shift(&shift_id, &user).await?;

    Ok(Json(json!({
        "shift": shift,
        "message": "Shift cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_shift_capacity(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ShiftCapacityQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let shift_service = ShiftService::new(&state);
    let capacity = shift_service.get_capacity(query.date, query.shift_type).await?;

    Ok(Json(json!(capacity)))
}

#[axum::debug_handler]
pub async fn get_shift_bookings(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ShiftBookingsQuery>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let shift_service = ShiftService::new(&state);
    let bookings = shift_service.get_shift_bookings(query, &user).await?;

    Ok(Json(json!({
        "bookings": bookings,
        "total": bookings.len()
    })))
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn confirm_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor])?;

    let shift_service = ShiftService::new(&state);
    let booking = shift_service.confirm_booking(&booking_id, &user).await?;

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn complete_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CompleteBookingRequest>,
) -> Result<Json<Value>, AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let shift_service = ShiftService::new(&state);
    let outcome = shift_service.complete_booking(&booking_id, request, &user).await?;

    Ok(Json(json!({
        "booking": outcome.booking,
        "history": outcome.history,
        "message": "Vaccination completed"
    })))
}
