use std::sync::Arc;

use axum::{
    extract::{Extension, Json, State},
    http::{HeaderMap, StatusCode},
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::{TokenResponse, User};
use shared_models::error::AppError;
use shared_utils::extractor::{extract_bearer_token, require_admin};
use shared_utils::jwt;

use crate::models::{
    CreateUserRequest, LoginRequest, RegisterRequest, RequestResetRequest,
    SetNewPasswordRequest, VerifyOtpRequest,
};
use crate::services::{AccountService, PasswordResetService};

#[axum::debug_handler]
pub async fn register(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AccountService::new(&config);
    let response = service.register(request).await?;

    Ok((StatusCode::CREATED, Json(json!(response))))
}

#[axum::debug_handler]
pub async fn login(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&config);
    let response = service.login(request).await?;

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn request_reset(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RequestResetRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PasswordResetService::new(&config);
    service.request_reset(request).await?;

    Ok(Json(json!({
        "message": "OTP sent to your email"
    })))
}

#[axum::debug_handler]
pub async fn verify_otp(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PasswordResetService::new(&config);
    let response = service.verify_otp(request).await?;

    Ok(Json(json!(response)))
}

#[axum::debug_handler]
pub async fn set_new_password(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<SetNewPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PasswordResetService::new(&config);
    service.set_new_password(request).await?;

    Ok(Json(json!({
        "message": "Password updated successfully"
    })))
}

/// Reports whether the presented bearer token is valid and whose it is.
pub async fn validate_token(
    State(config): State<Arc<AppConfig>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;
    let user = jwt::validate_token(token, &config.jwt_secret).map_err(AppError::Auth)?;

    Ok(Json(TokenResponse {
        valid: true,
        user_id: user.id,
        email: user.email,
        role: user.role,
    }))
}

#[axum::debug_handler]
pub async fn me(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AccountService::new(&config);
    let account = service.get_user(&user.id).await?;

    Ok(Json(json!(account)))
}

#[axum::debug_handler]
pub async fn create_user(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_admin(&user)?;

    let service = AccountService::new(&config);
    let account = service.create_user(request).await?;

    Ok((StatusCode::CREATED, Json(json!(account))))
}
