use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use booking_cell::models::BookingError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Morning,
    Afternoon,
    Night,
}

const fn at_hour(hour: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, 0, 0) {
        Some(time) => time,
        None => panic!("shift boundary out of range"),
    }
}

const SEVEN_AM: NaiveTime = at_hour(7);
const NOON: NaiveTime = at_hour(12);
const FIVE_PM: NaiveTime = at_hour(17);
const TEN_PM: NaiveTime = at_hour(22);

impl ShiftType {
    /// Fixed working window, start inclusive and end exclusive.
    pub fn window(&self) -> (NaiveTime, NaiveTime) {
        match self {
            ShiftType::Morning => (SEVEN_AM, NOON),
            ShiftType::Afternoon => (NOON, FIVE_PM),
            ShiftType::Night => (FIVE_PM, TEN_PM),
        }
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftType::Morning => write!(f, "morning"),
            ShiftType::Afternoon => write!(f, "afternoon"),
            ShiftType::Night => write!(f, "night"),
        }
    }
}

impl FromStr for ShiftType {
    type Err = ShiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "morning" => Ok(ShiftType::Morning),
            "afternoon" => Ok(ShiftType::Afternoon),
            "night" => Ok(ShiftType::Night),
            other => Err(ShiftError::ValidationError(format!("Invalid shift type: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Registered,
    Cancelled,
}

impl fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftStatus::Registered => write!(f, "registered"),
            ShiftStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorShift {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub shift_date: NaiveDate,
    pub shift_type: ShiftType,
    pub status: ShiftStatus,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShiftCapacity {
    pub shift_date: NaiveDate,
    pub shift_type: ShiftType,
    pub doctor_count: i64,
    pub max_doctors: i64,
    pub is_full: bool,
}

impl ShiftCapacity {
    pub fn new(shift_date: NaiveDate, shift_type: ShiftType, doctor_count: i64, max_doctors: i64) -> Self {
        Self {
            shift_date,
            shift_type,
            doctor_count,
            max_doctors,
            is_full: doctor_count >= max_doctors,
        }
    }
}

// Requests and query parameters

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterShiftRequest {
    pub shift_date: NaiveDate,
    pub shift_type: ShiftType,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftListQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<ShiftStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShiftCapacityQuery {
    pub date: NaiveDate,
    pub shift_type: ShiftType,
}

/// Either a shift id, or a date and shift type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShiftBookingsQuery {
    pub shift_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub shift_type: Option<ShiftType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteBookingRequest {
    pub batch_number: String,
    pub side_effects: Option<String>,
    pub notes: Option<String>,
}

/// Result of the `register_doctor_shift` database function.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegisterShiftRpcResult {
    Registered { shift: DoctorShift },
    Full { doctor_count: i64, max_doctors: i64 },
    Duplicate,
}

// Error types specific to shift operations
#[derive(Debug, Clone)]
pub enum ShiftError {
    NotFound,
    ShiftFull,
    AlreadyRegistered,
    NotRegistered,
    DateInPast,
    NotYourShift,
    ValidationError(String),
    Booking(BookingError),
    DatabaseError(String),
}

impl fmt::Display for ShiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftError::NotFound => write!(f, "Shift not found"),
            ShiftError::ShiftFull => write!(f, "Shift is full"),
            ShiftError::AlreadyRegistered => write!(f, "Already registered for this shift"),
            ShiftError::NotRegistered => write!(f, "Shift is not registered"),
            ShiftError::DateInPast => write!(f, "Shift date is in the past"),
            ShiftError::NotYourShift => write!(f, "Shift belongs to another doctor"),
            ShiftError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ShiftError::Booking(err) => write!(f, "{}", err),
            ShiftError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ShiftError {}

impl From<BookingError> for ShiftError {
    fn from(err: BookingError) -> Self {
        ShiftError::Booking(err)
    }
}

impl From<ShiftError> for AppError {
    fn from(err: ShiftError) -> Self {
        let message = err.to_string();
        match err {
            ShiftError::NotFound => AppError::NotFound(message),
            ShiftError::ShiftFull
            | ShiftError::AlreadyRegistered
            | ShiftError::NotRegistered => AppError::Conflict(message),
            ShiftError::DateInPast => AppError::BadRequest(message),
            ShiftError::NotYourShift => AppError::Forbidden(message),
            ShiftError::ValidationError(_) => AppError::ValidationError(message),
            ShiftError::Booking(inner) => AppError::from(inner),
            ShiftError::DatabaseError(_) => AppError::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        s.parse().unwrap()
    }

    #[test]
    fn test_shift_windows() {
        assert_eq!(ShiftType::Morning.window(), (t("07:00"), t("12:00")));
        assert_eq!(ShiftType::Afternoon.window(), (t("12:00"), t("17:00")));
        assert_eq!(ShiftType::Night.window(), (t("17:00"), t("22:00")));
    }

    #[test]
    fn test_windows_are_back_to_back() {
        assert_eq!(ShiftType::Morning.window().1, ShiftType::Afternoon.window().0);
        assert_eq!(ShiftType::Afternoon.window().1, ShiftType::Night.window().0);
    }

    #[test]
    fn test_capacity_is_full_at_max() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(!ShiftCapacity::new(date, ShiftType::Night, 2, 3).is_full);
        assert!(ShiftCapacity::new(date, ShiftType::Night, 3, 3).is_full);
    }

    #[test]
    fn test_register_rpc_result_shapes() {
        let full: RegisterShiftRpcResult = serde_json::from_value(serde_json::json!({
            "status": "full", "doctor_count": 3, "max_doctors": 3
        }))
        .unwrap();
        assert!(matches!(full, RegisterShiftRpcResult::Full { doctor_count: 3, .. }));

        let duplicate: RegisterShiftRpcResult =
            serde_json::from_value(serde_json::json!({ "status": "duplicate" })).unwrap();
        assert!(matches!(duplicate, RegisterShiftRpcResult::Duplicate));
    }

    #[test]
    fn test_booking_errors_keep_their_status() {
        let err = AppError::from(ShiftError::from(BookingError::NotFound));
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
