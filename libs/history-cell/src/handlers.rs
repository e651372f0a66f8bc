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

use crate::models::{CreateHistoryRequest, HistoryQuery};
use crate::services::HistoryService;

#[axum::debug_handler]
pub async fn get_user_history(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    let service = HistoryService::new(&config);

    let records = service.list_for_user(&user_id, query, &user).await?;

    Ok(Json(json!({
        "history": records,
        "total": records.len()
    })))
}

#[axum::debug_handler]
pub async fn get_history_record(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Path(record_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = HistoryService::new(&config);

    let record = service.get_record(&record_id, &user).await?;

    Ok(Json(json!(record)))
}

#[axum::debug_handler]
pub async fn create_history_record(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateHistoryRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_role(&user, &[Role::Doctor, Role::Admin])?;

    let service = HistoryService::new(&config);
    let record = service.create_record(request, &user).await?;

    Ok((StatusCode::CREATED, Json(json!(record))))
}
