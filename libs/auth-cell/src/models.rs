use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::auth::{Role, User};
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn to_principal(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            name: Some(self.name.clone()),
            role: self.role,
            issued_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    pub otp_hash: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: i32,
    pub verified_at: Option<DateTime<Utc>>,
    pub reset_token_hash: Option<String>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserAccount,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpResponse {
    pub message: String,
    pub reset_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetNewPasswordRequest {
    pub email: String,
    pub reset_token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with email {0} already exists")]
    EmailTaken(String),

    #[error("No account found for this email")]
    UserNotFound,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("{0}")]
    WeakPassword(String),

    #[error("Name is required")]
    MissingName,

    #[error("Invalid OTP")]
    InvalidOtp,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("Too many failed attempts, request a new OTP")]
    TooManyAttempts,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Token error: {0}")]
    Token(String),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Failed to deliver OTP: {0}")]
    Notification(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let message = err.to_string();
        match err {
            AuthError::InvalidCredentials => AppError::Auth(message),
            AuthError::EmailTaken(_) => AppError::Conflict(message),
            AuthError::UserNotFound => AppError::NotFound(message),
            AuthError::InvalidEmail
            | AuthError::WeakPassword(_)
            | AuthError::MissingName => AppError::ValidationError(message),
            AuthError::InvalidOtp
            | AuthError::OtpExpired
            | AuthError::TooManyAttempts
            | AuthError::InvalidResetToken => AppError::BadRequest(message),
            AuthError::Token(_) | AuthError::Hashing(_) => AppError::Internal(message),
            AuthError::Notification(_) => AppError::ExternalService(message),
            AuthError::Database(_) => AppError::Database(message),
        }
    }
}
