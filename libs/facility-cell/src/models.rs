use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub operating_hours: OperatingHours,
    pub location: Location,
    pub max_bookings_per_day: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Facility {
    pub fn is_open_at(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.operating_hours.is_open_at(date, time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl DayHours {
    /// Opening time is inclusive, closing time exclusive.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.open <= time && time < self.close
    }
}

/// Weekly opening hours. A missing day means the facility is closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingHours {
    #[serde(default)]
    pub monday: Option<DayHours>,
    #[serde(default)]
    pub tuesday: Option<DayHours>,
    #[serde(default)]
    pub wednesday: Option<DayHours>,
    #[serde(default)]
    pub thursday: Option<DayHours>,
    #[serde(default)]
    pub friday: Option<DayHours>,
    #[serde(default)]
    pub saturday: Option<DayHours>,
    #[serde(default)]
    pub sunday: Option<DayHours>,
}

impl OperatingHours {
    pub fn for_weekday(&self, weekday: Weekday) -> Option<&DayHours> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }

    pub fn is_open_at(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.for_weekday(date.weekday())
            .map(|hours| hours.contains(time))
            .unwrap_or(false)
    }

    pub fn days(&self) -> [(Weekday, Option<&DayHours>); 7] {
        [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .map(|day| (day, self.for_weekday(day)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFacilityRequest {
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub operating_hours: OperatingHours,
    pub location: Location,
    pub max_bookings_per_day: i32,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFacilityRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub operating_hours: Option<OperatingHours>,
    pub location: Option<Location>,
    pub max_bookings_per_day: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FacilitySearchQuery {
    pub active: Option<bool>,
    pub search: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// A facility as returned by listings; `distance_km` is set for nearby searches.
#[derive(Debug, Clone, Serialize)]
pub struct FacilityListing {
    #[serde(flatten)]
    pub facility: Facility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FacilityError {
    #[error("Facility not found")]
    NotFound,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Facility has bookings and cannot be deleted")]
    InUse,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<FacilityError> for AppError {
    fn from(err: FacilityError) -> Self {
        match err {
            FacilityError::NotFound => AppError::NotFound(err.to_string()),
            FacilityError::ValidationError(msg) => AppError::ValidationError(msg),
            FacilityError::InUse => AppError::Conflict(err.to_string()),
            FacilityError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
