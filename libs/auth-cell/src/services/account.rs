use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{filter_value, is_conflict, SupabaseClient};
use shared_models::auth::Role;
use shared_utils::jwt::issue_token;

use crate::models::{
    AuthError, AuthResponse, CreateUserRequest, LoginRequest, RegisterRequest, UserAccount,
};
use crate::services::password::PasswordService;

const USERS_TABLE: &str = "users";

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

/// Compiled once. `None` only if the pattern itself is broken, in which case
/// every address is rejected.
fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| match Regex::new(EMAIL_PATTERN) {
            Ok(regex) => Some(regex),
            Err(e) => {
                error!("Email pattern failed to compile: {}", e);
                None
            }
        })
        .as_ref()
}

/// Trims and lowercases an email, rejecting anything that is not shaped like
/// `local@domain.tld`.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let normalized = email.trim().to_lowercase();
    if email_regex().is_some_and(|regex| regex.is_match(&normalized)) {
        Ok(normalized)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

pub struct AccountService {
    supabase: SupabaseClient,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl AccountService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            jwt_secret: config.jwt_secret.clone(),
            token_ttl_hours: config.token_ttl_hours,
        }
    }

    /// Public sign-up. Always creates a patient account.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AuthError> {
        let account = self
            .create_account(&request.email, &request.password, &request.name, request.phone, Role::User)
            .await?;

        self.auth_response(account)
    }

    /// Admin-only account creation with an explicit role.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserAccount, AuthError> {
        self.create_account(&request.email, &request.password, &request.name, request.phone, request.role)
            .await
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let email = normalize_email(&request.email).map_err(|_| AuthError::InvalidCredentials)?;
        debug!("Login attempt for {}", email);

        let account = self
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !PasswordService::verify_password(&request.password, &account.password_hash) {
            warn!("Failed login for {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        info!("User {} logged in", account.id);
        self.auth_response(account)
    }

    pub async fn get_user(&self, user_id: &Uuid) -> Result<UserAccount, AuthError> {
        self.supabase
            .select_one(USERS_TABLE, &format!("id=eq.{}", user_id))
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, AuthError> {
        self.supabase
            .select_one(USERS_TABLE, &format!("email=eq.{}", filter_value(email)))
            .await
            .map_err(|e| AuthError::Database(e.to_string()))
    }

    pub async fn update_password(&self, user_id: &Uuid, new_password: &str) -> Result<(), AuthError> {
        PasswordService::validate_password(new_password)?;
        let password_hash = PasswordService::hash_password(new_password)?;

        let updated: Vec<UserAccount> = self.supabase
            .update(
                USERS_TABLE,
                &format!("id=eq.{}", user_id),
                json!({
                    "password_hash": password_hash,
                    "updated_at": Utc::now().to_rfc3339()
                }),
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        if updated.is_empty() {
            return Err(AuthError::UserNotFound);
        }

        info!("Password updated for user {}", user_id);
        Ok(())
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
        phone: Option<String>,
        role: Role,
    ) -> Result<UserAccount, AuthError> {
        let email = normalize_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        PasswordService::validate_password(password)?;

        if self.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let password_hash = PasswordService::hash_password(password)?;
        let now = Utc::now().to_rfc3339();

        let account: UserAccount = self.supabase
            .insert(
                USERS_TABLE,
                json!({
                    "email": email,
                    "password_hash": password_hash,
                    "name": name,
                    "phone": phone,
                    "role": role,
                    "created_at": now,
                    "updated_at": now
                }),
            )
            .await
            .map_err(|e| {
                // The unique index still catches a sign-up racing the lookup above.
                if is_conflict(&e) {
                    AuthError::EmailTaken(email.clone())
                } else {
                    AuthError::Database(e.to_string())
                }
            })?;

        info!("Created {} account {}", account.role, account.id);
        Ok(account)
    }

    fn auth_response(&self, account: UserAccount) -> Result<AuthResponse, AuthError> {
        let token = issue_token(&account.to_principal(), &self.jwt_secret, self.token_ttl_hours)
            .map_err(AuthError::Token)?;

        Ok(AuthResponse { token, user: account })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_email_pattern_compiles() {
        assert!(email_regex().is_some());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM ").unwrap(), "jane.doe@example.com");
        assert_matches!(normalize_email("not-an-email"), Err(AuthError::InvalidEmail));
        assert_matches!(normalize_email("a b@example.com"), Err(AuthError::InvalidEmail));
        assert_matches!(normalize_email("user@localhost"), Err(AuthError::InvalidEmail));
    }
}
