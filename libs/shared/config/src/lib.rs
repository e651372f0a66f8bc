use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub otp_ttl_minutes: i64,
    pub max_doctors_per_shift: i64,
    pub otp_webhook_url: Option<String>,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            jwt_secret: String::new(),
            token_ttl_hours: 24,
            otp_ttl_minutes: 10,
            max_doctors_per_shift: 3,
            otp_webhook_url: None,
            port: 3000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, token issuance will fail");
                    String::new()
                }),
            token_ttl_hours: parse_or("TOKEN_TTL_HOURS", defaults.token_ttl_hours),
            otp_ttl_minutes: parse_or("OTP_TTL_MINUTES", defaults.otp_ttl_minutes),
            max_doctors_per_shift: parse_or("MAX_DOCTORS_PER_SHIFT", defaults.max_doctors_per_shift),
            otp_webhook_url: env::var("OTP_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            port: parse_or("PORT", defaults.port),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_not_configured() {
        let config = AppConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.max_doctors_per_shift, 3);
    }

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        env::set_var("VAXTRACK_TEST_PARSE_OR", "not-a-number");
        assert_eq!(parse_or("VAXTRACK_TEST_PARSE_OR", 7i64), 7);
        env::set_var("VAXTRACK_TEST_PARSE_OR", " 12 ");
        assert_eq!(parse_or("VAXTRACK_TEST_PARSE_OR", 7i64), 12);
        env::remove_var("VAXTRACK_TEST_PARSE_OR");
    }
}
