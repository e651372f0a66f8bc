use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use history_cell::models::VaccinationHistory;
use shared_models::error::AppError;

// ==============================================================================
// CORE BOOKING MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub vaccine_id: Uuid,
    pub facility_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: BookingStatus,
    pub dose_number: i32,
    pub doctor_id: Option<Uuid>,
    pub price: f64,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub batch_number: Option<String>,
    pub side_effects: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(BookingError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(BookingError::InvalidPaymentStatus(other.to_string())),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub vaccine_id: Uuid,
    pub facility_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub dose_number: Option<i32>,
    pub notes: Option<String>,
    /// Admins may book on behalf of another user.
    pub user_id: Option<Uuid>,
}

/// Status arrives as a raw string so unknown values can be rejected with a
/// precise message.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingListQuery {
    pub status: Option<String>,
    pub facility_id: Option<Uuid>,
    pub vaccine_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserBookingsQuery {
    pub status: Option<String>,
}

// ==============================================================================
// COMPLETION MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionDetails {
    pub batch_number: Option<String>,
    pub side_effects: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionOutcome {
    pub booking: Booking,
    pub history: VaccinationHistory,
}

/// Result of the `complete_booking` database function.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionRpcResult {
    Completed {
        booking: Booking,
        history: VaccinationHistory,
    },
    NotFound,
    InvalidStatus {
        current_status: BookingStatus,
    },
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Booking not found")]
    NotFound,

    #[error("Vaccine not found")]
    VaccineNotFound,

    #[error("Facility not found")]
    FacilityNotFound,

    #[error("Invalid booking status: {0}")]
    InvalidStatus(String),

    #[error("Invalid payment status: {0}")]
    InvalidPaymentStatus(String),

    #[error("Cannot change booking status from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    #[error("Booking was modified by another request, reload and try again")]
    StatusChanged,

    #[error("Booking date cannot be in the past")]
    DateInPast,

    #[error("Vaccine is not available for booking")]
    VaccineUnavailable,

    #[error("Facility is not accepting bookings")]
    FacilityUnavailable,

    #[error("Facility is closed at the requested time")]
    FacilityClosed,

    #[error("Invalid dose number: {0}")]
    InvalidDose(String),

    #[error("Facility is fully booked on {0}")]
    FacilityFull(NaiveDate),

    #[error("{0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::NotFound
            | BookingError::VaccineNotFound
            | BookingError::FacilityNotFound => AppError::NotFound(message),
            BookingError::InvalidStatus(_)
            | BookingError::InvalidPaymentStatus(_)
            | BookingError::DateInPast
            | BookingError::VaccineUnavailable
            | BookingError::FacilityUnavailable
            | BookingError::FacilityClosed => AppError::BadRequest(message),
            BookingError::InvalidDose(_) | BookingError::ValidationError(_) => {
                AppError::ValidationError(message)
            }
            BookingError::InvalidTransition { .. }
            | BookingError::StatusChanged
            | BookingError::FacilityFull(_) => AppError::Conflict(message),
            BookingError::Forbidden(_) => AppError::Forbidden(message),
            BookingError::DatabaseError(_) => AppError::Database(message),
        }
    }
}
