use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vaccine {
    pub id: Uuid,
    pub name: String,
    pub manufacturer: String,
    pub description: Option<String>,
    pub dosage: String,
    pub doses_required: i32,
    pub storage_temperature: String,
    pub shelf_life: String,
    pub quantity: i32,
    pub price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vaccine {
    /// Active and with stock left.
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.quantity > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVaccineRequest {
    pub name: String,
    pub manufacturer: String,
    pub description: Option<String>,
    pub dosage: String,
    pub doses_required: Option<i32>,
    pub storage_temperature: String,
    pub shelf_life: String,
    pub quantity: i32,
    pub price: f64,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVaccineRequest {
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub doses_required: Option<i32>,
    pub storage_temperature: Option<String>,
    pub shelf_life: Option<String>,
    pub quantity: Option<i32>,
    pub price: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaccineSearchQuery {
    pub active: Option<bool>,
    pub search: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VaccineError {
    #[error("Vaccine not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Vaccine is referenced by bookings or vaccination records and cannot be deleted")]
    InUse,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<VaccineError> for AppError {
    fn from(err: VaccineError) -> Self {
        match err {
            VaccineError::NotFound => AppError::NotFound(err.to_string()),
            VaccineError::ValidationError(msg) => AppError::ValidationError(msg),
            VaccineError::InUse => AppError::Conflict(err.to_string()),
            VaccineError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
