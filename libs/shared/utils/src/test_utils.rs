use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{Role, User};

use crate::jwt::issue_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Points the data API at a mock server.
    pub fn with_supabase_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::new("test@example.com", Role::User)
    }
}

impl TestUser {
    pub fn new(email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: "Test User".to_string(),
            role,
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, Role::Doctor)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, Role::User)
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, Role::Admin)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            name: Some(self.name.clone()),
            role: self.role,
            issued_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        issue_token(&user.to_user(), secret, exp_hours.unwrap_or(24))
            .expect("test secret is never empty")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Rows shaped like the data API returns them.
pub struct MockDataResponses;

impl MockDataResponses {
    pub fn user_row(id: &Uuid, email: &str, role: Role, password_hash: &str) -> serde_json::Value {
        json!({
            "id": id,
            "email": email,
            "password_hash": password_hash,
            "name": "Test User",
            "phone": null,
            "role": role,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn vaccine_row(id: &Uuid, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "manufacturer": "Acme Biologics",
            "description": null,
            "dosage": "0.5ml",
            "doses_required": 2,
            "storage_temperature": "2-8°C",
            "shelf_life": "12 months",
            "quantity": 100,
            "price": 25.0,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    /// Facility open 08:00-18:00 every day.
    pub fn facility_row(id: &Uuid, name: &str, max_bookings_per_day: i32) -> serde_json::Value {
        let day = json!({ "open": "08:00:00", "close": "18:00:00" });
        json!({
            "id": id,
            "name": name,
            "address": "1 Main Street",
            "phone": null,
            "operating_hours": {
                "monday": day, "tuesday": day, "wednesday": day, "thursday": day,
                "friday": day, "saturday": day, "sunday": day
            },
            "location": { "latitude": 53.3498, "longitude": -6.2603 },
            "max_bookings_per_day": max_bookings_per_day,
            "is_active": true,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn booking_row(id: &Uuid, user_id: &Uuid, status: &str) -> serde_json::Value {
        let date = (Utc::now() + Duration::days(3)).date_naive();
        json!({
            "id": id,
            "user_id": user_id,
            "vaccine_id": Uuid::new_v4(),
            "facility_id": Uuid::new_v4(),
            "date": date,
            "time": "09:30:00",
            "status": status,
            "dose_number": 1,
            "doctor_id": null,
            "price": 25.0,
            "payment_status": "pending",
            "notes": null,
            "batch_number": null,
            "side_effects": null,
            "completed_at": null,
            "cancelled_at": null,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn shift_row(id: &Uuid, doctor_id: &Uuid, shift_type: &str) -> serde_json::Value {
        let date = (Utc::now() + Duration::days(3)).date_naive();
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "shift_date": date,
            "shift_type": shift_type,
            "status": "registered",
            "start_time": "07:00:00",
            "end_time": "12:00:00",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn history_row(id: &Uuid, user_id: &Uuid, batch_number: &str) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": user_id,
            "vaccine_id": Uuid::new_v4(),
            "booking_id": Uuid::new_v4(),
            "dose_number": 1,
            "date": "2024-06-01",
            "location": "North Clinic",
            "doctor_id": Uuid::new_v4(),
            "batch_number": batch_number,
            "side_effects": null,
            "notes": null,
            "created_at": "2024-06-01T10:00:00Z"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert_eq!(app_config.supabase_url, "http://localhost:54321");
        assert_eq!(app_config.supabase_service_key, "test-service-key");
        assert!(app_config.is_configured());
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::doctor("doc@example.com");
        assert_eq!(user.email, "doc@example.com");
        assert_eq!(user.role, Role::Doctor);

        let user_model = user.to_user();
        assert_eq!(user_model.email, user.email);
        assert_eq!(user_model.id, user.id);
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }
}
