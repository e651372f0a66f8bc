use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;

use crate::models::AuthError;

/// Delivers password-reset codes to the account holder.
#[async_trait]
pub trait OtpNotifier: Send + Sync {
    async fn send_otp(&self, email: &str, otp: &str, expires_in_minutes: i64) -> Result<(), AuthError>;
}

/// Posts the code to an external mail/SMS relay.
pub struct WebhookOtpNotifier {
    client: Client,
    url: String,
}

impl WebhookOtpNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl OtpNotifier for WebhookOtpNotifier {
    async fn send_otp(&self, email: &str, otp: &str, expires_in_minutes: i64) -> Result<(), AuthError> {
        debug!("Posting OTP for {} to relay", email);

        let response = self.client
            .post(&self.url)
            .json(&json!({
                "email": email,
                "otp": otp,
                "expires_in_minutes": expires_in_minutes
            }))
            .send()
            .await
            .map_err(|e| AuthError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Notification(format!(
                "relay responded with {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Used when no relay is configured; records that a code was issued.
pub struct LogOtpNotifier;

#[async_trait]
impl OtpNotifier for LogOtpNotifier {
    async fn send_otp(&self, email: &str, _otp: &str, expires_in_minutes: i64) -> Result<(), AuthError> {
        info!(
            "OTP issued for {} (valid {} minutes); no relay configured",
            email, expires_in_minutes
        );
        Ok(())
    }
}

pub fn notifier_for(config: &AppConfig) -> Box<dyn OtpNotifier> {
    match &config.otp_webhook_url {
        Some(url) => Box::new(WebhookOtpNotifier::new(url.clone())),
        None => Box::new(LogOtpNotifier),
    }
}
