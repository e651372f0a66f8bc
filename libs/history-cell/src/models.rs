use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

/// One administered dose. Rows are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaccinationHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vaccine_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub dose_number: i32,
    pub date: NaiveDate,
    pub location: String,
    pub doctor_id: Option<Uuid>,
    pub batch_number: Option<String>,
    pub side_effects: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHistoryRequest {
    pub user_id: Uuid,
    pub vaccine_id: Uuid,
    pub date: NaiveDate,
    pub location: String,
    pub dose_number: i32,
    pub batch_number: Option<String>,
    pub side_effects: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    pub vaccine_id: Option<Uuid>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HistoryError {
    #[error("Vaccination record not found")]
    NotFound,

    #[error("Not authorized to view this vaccination history")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown user or vaccine")]
    UnknownReference,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<HistoryError> for AppError {
    fn from(err: HistoryError) -> Self {
        match err {
            HistoryError::NotFound => AppError::NotFound(err.to_string()),
            HistoryError::Forbidden => AppError::Forbidden(err.to_string()),
            HistoryError::ValidationError(msg) => AppError::ValidationError(msg),
            HistoryError::UnknownReference => AppError::ValidationError(err.to_string()),
            HistoryError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
