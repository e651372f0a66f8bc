use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use rand::{Rng, RngCore};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    AuthError, PasswordReset, RequestResetRequest, SetNewPasswordRequest, UserAccount,
    VerifyOtpRequest, VerifyOtpResponse,
};
use crate::services::account::{normalize_email, AccountService};
use crate::services::notifier::{notifier_for, OtpNotifier};

const RESETS_TABLE: &str = "password_resets";

pub const MAX_OTP_ATTEMPTS: i32 = 5;

pub fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Codes and reset tokens are stored as SHA-256 hex digests only.
pub fn hash_secret(secret: &str) -> String {
    format!("{:x}", Sha256::digest(secret.trim().as_bytes()))
}

pub struct PasswordResetService {
    supabase: SupabaseClient,
    accounts: AccountService,
    notifier: Box<dyn OtpNotifier>,
    otp_ttl_minutes: i64,
}

impl PasswordResetService {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_notifier(config, notifier_for(config))
    }

    pub fn with_notifier(config: &AppConfig, notifier: Box<dyn OtpNotifier>) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            accounts: AccountService::new(config),
            notifier,
            otp_ttl_minutes: config.otp_ttl_minutes,
        }
    }

    pub async fn request_reset(&self, request: RequestResetRequest) -> Result<(), AuthError> {
        let account = self.account_for(&request.email).await?;
        debug!("Issuing password reset OTP for user {}", account.id);

        // A new request supersedes whatever was outstanding.
        let _: Vec<PasswordReset> = self.supabase
            .delete(RESETS_TABLE, &format!("user_id=eq.{}", account.id))
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        let otp = generate_otp();
        let now = Utc::now();

        let _: PasswordReset = self.supabase
            .insert(
                RESETS_TABLE,
                json!({
                    "user_id": account.id,
                    "otp_hash": hash_secret(&otp),
                    "expires_at": (now + Duration::minutes(self.otp_ttl_minutes)).to_rfc3339(),
                    "attempts": 0,
                    "created_at": now.to_rfc3339()
                }),
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        self.notifier
            .send_otp(&account.email, &otp, self.otp_ttl_minutes)
            .await?;

        info!("Password reset requested for user {}", account.id);
        Ok(())
    }

    pub async fn verify_otp(&self, request: VerifyOtpRequest) -> Result<VerifyOtpResponse, AuthError> {
        let account = self.account_for(&request.email).await?;
        let reset = self.latest_reset(&account).await?.ok_or(AuthError::InvalidOtp)?;

        if reset.is_expired(Utc::now()) {
            return Err(AuthError::OtpExpired);
        }
        if reset.attempts >= MAX_OTP_ATTEMPTS {
            return Err(AuthError::TooManyAttempts);
        }

        // Each guess spends an attempt before it is compared. The increment
        // only lands while the counter still holds the value read above, so
        // concurrent guesses cannot share one attempt.
        let unchanged = format!("attempts=eq.{}", reset.attempts);
        let claimed = self
            .patch_reset(&reset, Some(unchanged.as_str()), json!({ "attempts": reset.attempts + 1 }))
            .await?;
        if !claimed {
            warn!("Concurrent OTP guess for user {} rejected", account.id);
            return Err(AuthError::InvalidOtp);
        }

        if hash_secret(&request.otp) != reset.otp_hash {
            warn!("Wrong OTP for user {} (attempt {})", account.id, reset.attempts + 1);
            return Err(AuthError::InvalidOtp);
        }

        let reset_token = generate_reset_token();
        self.patch_reset(
            &reset,
            None,
            json!({
                "verified_at": Utc::now().to_rfc3339(),
                "reset_token_hash": hash_secret(&reset_token)
            }),
        )
        .await?;

        info!("OTP verified for user {}", account.id);
        Ok(VerifyOtpResponse {
            message: "OTP verified".to_string(),
            reset_token,
        })
    }

    pub async fn set_new_password(&self, request: SetNewPasswordRequest) -> Result<(), AuthError> {
        let account = self.account_for(&request.email).await?;
        let reset = self
            .latest_reset(&account)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let token_matches = reset
            .reset_token_hash
            .as_deref()
            .map(|hash| hash == hash_secret(&request.reset_token))
            .unwrap_or(false);

        if reset.verified_at.is_none() || !token_matches || reset.is_expired(Utc::now()) {
            return Err(AuthError::InvalidResetToken);
        }

        self.accounts.update_password(&account.id, &request.new_password).await?;
        self.patch_reset(&reset, None, json!({ "used_at": Utc::now().to_rfc3339() })).await?;

        info!("Password reset completed for user {}", account.id);
        Ok(())
    }

    async fn account_for(&self, email: &str) -> Result<UserAccount, AuthError> {
        let email = normalize_email(email)?;
        self.accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn latest_reset(&self, account: &UserAccount) -> Result<Option<PasswordReset>, AuthError> {
        self.supabase
            .select_one(
                RESETS_TABLE,
                &format!(
                    "user_id=eq.{}&used_at=is.null&order=created_at.desc&limit=1",
                    account.id
                ),
            )
            .await
            .map_err(|e| AuthError::Database(e.to_string()))
    }

    /// Patches the reset row, narrowed by an extra `condition` filter when
    /// given. Returns whether a row was written.
    async fn patch_reset(
        &self,
        reset: &PasswordReset,
        condition: Option<&str>,
        body: serde_json::Value,
    ) -> Result<bool, AuthError> {
        let filter = match condition {
            Some(condition) => format!("id=eq.{}&{}", reset.id, condition),
            None => format!("id=eq.{}", reset.id),
        };

        let updated: Vec<PasswordReset> = self.supabase
            .update(RESETS_TABLE, &filter, body)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;
        Ok(!updated.is_empty())
    }
}
