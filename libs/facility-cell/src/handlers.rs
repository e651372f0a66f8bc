use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{CreateFacilityRequest, UpdateFacilityRequest, FacilitySearchQuery};
use crate::services::FacilityService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_facilities(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<FacilitySearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = FacilityService::new(&config);
    let facilities = service.list_facilities(query).await?;

    Ok(Json(json!({
        "facilities": facilities,
        "total": facilities.len()
    })))
}

#[axum::debug_handler]
pub async fn get_facility(
    State(config): State<Arc<AppConfig>>,
    Path(facility_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = FacilityService::new(&config);
    let facility = service.get_facility(&facility_id).await?;

    Ok(Json(json!(facility)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_facility(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateFacilityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;

    let service = FacilityService::new(&config);
    let facility = service.create_facility(request).await?;

    Ok((StatusCode::CREATED, Json(json!(facility))))
}

#[axum::debug_handler]
pub async fn update_facility(
    State(config): State<Arc<AppConfig>>,
    Path(facility_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateFacilityRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = FacilityService::new(&config);
    let facility = service.update_facility(&facility_id, request).await?;

    Ok(Json(json!(facility)))
}

#[axum::debug_handler]
pub async fn delete_facility(
    State(config): State<Arc<AppConfig>>,
    Path(facility_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = FacilityService::new(&config);
    service.delete_facility(&facility_id).await?;

    Ok(Json(json!({
        "message": "Facility deleted successfully"
    })))
}
