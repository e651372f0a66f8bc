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

use crate::models::{CreateVaccineRequest, UpdateVaccineRequest, VaccineSearchQuery};
use crate::services::VaccineService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_vaccines(
    State(config): State<Arc<AppConfig>>,
    Query(query): Query<VaccineSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = VaccineService::new(&config);
    let vaccines = service.list_vaccines(query).await?;

    Ok(Json(json!({
        "vaccines": vaccines,
        "total": vaccines.len()
    })))
}

#[axum::debug_handler]
pub async fn get_vaccine(
    State(config): State<Arc<AppConfig>>,
    Path(vaccine_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = VaccineService::new(&config);
    let vaccine = service.get_vaccine(&vaccine_id).await?;

    Ok(Json(json!(vaccine)))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_vaccine(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateVaccineRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;

    let service = VaccineService::new(&config);
    let vaccine = service.create_vaccine(request).await?;

    Ok((StatusCode::CREATED, Json(json!(vaccine))))
}

#[axum::debug_handler]
pub async fn update_vaccine(
    State(config): State<Arc<AppConfig>>,
    Path(vaccine_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateVaccineRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = VaccineService::new(&config);
    let vaccine = service.update_vaccine(&vaccine_id, request).await?;

    Ok(Json(json!(vaccine)))
}

#[axum::debug_handler]
pub async fn delete_vaccine(
    State(config): State<Arc<AppConfig>>,
    Path(vaccine_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = VaccineService::new(&config);
    service.delete_vaccine(&vaccine_id).await?;

    Ok(Json(json!({
        "message": "Vaccine deleted successfully"
    })))
}
