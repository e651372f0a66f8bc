use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use facility_cell::{FacilityError, FacilityService};
use shared_config::AppConfig;
use shared_database::supabase::{is_conflict, SupabaseClient};
use shared_models::auth::User;
use vaccine_cell::{VaccineError, VaccineService};

use crate::models::{
    Booking, BookingError, BookingListQuery, BookingStatus, CompletionDetails,
    CreateBookingRequest, PaymentStatus,
};
use crate::services::completion::CompletionService;
use crate::services::lifecycle::BookingLifecycleService;

const BOOKINGS_TABLE: &str = "bookings";

pub struct BookingService {
    supabase: SupabaseClient,
    vaccines: VaccineService,
    facilities: FacilityService,
    completion: CompletionService,
    lifecycle: BookingLifecycleService,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            vaccines: VaccineService::new(config),
            facilities: FacilityService::new(config),
            completion: CompletionService::new(config),
            lifecycle: BookingLifecycleService::new(),
        }
    }

    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
        requester: &User,
    ) -> Result<Booking, BookingError> {
        let user_id = request.user_id.unwrap_or(requester.id);
        if user_id != requester.id && !requester.is_admin() {
            return Err(BookingError::Forbidden(
                "Only admins can book on behalf of another user".to_string(),
            ));
        }

        debug!("Creating booking for user {} at facility {}", user_id, request.facility_id);

        if request.date < Utc::now().date_naive() {
            return Err(BookingError::DateInPast);
        }

        let vaccine = self.vaccines
            .get_vaccine(&request.vaccine_id)
            .await
            .map_err(|e| match e {
                VaccineError::NotFound => BookingError::VaccineNotFound,
                other => BookingError::DatabaseError(other.to_string()),
            })?;
        if !vaccine.is_bookable() {
            return Err(BookingError::VaccineUnavailable);
        }

        let facility = self.facilities
            .get_facility(&request.facility_id)
            .await
            .map_err(|e| match e {
                FacilityError::NotFound => BookingError::FacilityNotFound,
                other => BookingError::DatabaseError(other.to_string()),
            })?;
        if !facility.is_active {
            return Err(BookingError::FacilityUnavailable);
        }
        if !facility.is_open_at(request.date, request.time) {
            return Err(BookingError::FacilityClosed);
        }

        let dose_number = request.dose_number.unwrap_or(1);
        if !(1..=vaccine.doses_required).contains(&dose_number) {
            return Err(BookingError::InvalidDose(format!(
                "{} requires dose 1 to {}, got {}",
                vaccine.name, vaccine.doses_required, dose_number
            )));
        }

        // Count-then-insert: a concurrent booking can still take the last slot.
        let booked = self.count_active_bookings(&facility.id, request.date).await?;
        if booked >= facility.max_bookings_per_day as usize {
            warn!("Facility {} is full on {}", facility.id, request.date);
            return Err(BookingError::FacilityFull(request.date));
        }

        let now = Utc::now().to_rfc3339();
        let booking: Booking = self.supabase
            .insert(
                BOOKINGS_TABLE,
                json!({
                    "user_id": user_id,
                    "vaccine_id": vaccine.id,
                    "facility_id": facility.id,
                    "date": request.date,
                    "time": request.time,
                    "status": BookingStatus::Pending,
                    "dose_number": dose_number,
                    "price": vaccine.price,
                    "payment_status": PaymentStatus::Pending,
                    "notes": request.notes,
                    "created_at": now,
                    "updated_at": now
                }),
            )
            .await
            .map_err(|e| {
                // Vaccine and facility were read above; a foreign-key miss here is the user.
                if is_conflict(&e) {
                    BookingError::ValidationError(format!("User {} does not exist", user_id))
                } else {
                    BookingError::DatabaseError(e.to_string())
                }
            })?;

        info!("Created booking {} for user {}", booking.id, user_id);
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: &Uuid, requester: &User) -> Result<Booking, BookingError> {
        let booking = self.find_booking(booking_id).await?;

        if !requester.can_access_user(&booking.user_id) {
            return Err(BookingError::Forbidden(
                "Not authorized to view this booking".to_string(),
            ));
        }

        Ok(booking)
    }

    /// A user's bookings, latest date first.
    pub async fn list_user_bookings(
        &self,
        user_id: &Uuid,
        status: Option<BookingStatus>,
        requester: &User,
    ) -> Result<Vec<Booking>, BookingError> {
        if !requester.can_access_user(user_id) {
            return Err(BookingError::Forbidden(
                "Not authorized to view these bookings".to_string(),
            ));
        }

        let mut query_parts = vec![format!("user_id=eq.{}", user_id)];
        if let Some(status) = status {
            query_parts.push(format!("status=eq.{}", status));
        }
        query_parts.push("order=date.desc,time.desc".to_string());

        self.select_bookings(&query_parts.join("&")).await
    }

    pub async fn list_bookings(
        &self,
        query: BookingListQuery,
        requester: &User,
    ) -> Result<Vec<Booking>, BookingError> {
        if !requester.is_staff() {
            return Err(BookingError::Forbidden(
                "Only doctors and admins can list all bookings".to_string(),
            ));
        }

        let mut query_parts = Vec::new();

        if let Some(status) = query.status.as_deref() {
            let status: BookingStatus = status.parse()?;
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(facility_id) = query.facility_id {
            query_parts.push(format!("facility_id=eq.{}", facility_id));
        }
        if let Some(vaccine_id) = query.vaccine_id {
            query_parts.push(format!("vaccine_id=eq.{}", vaccine_id));
        }
        if let Some(date) = query.date {
            query_parts.push(format!("date=eq.{}", date));
        }
        if let Some(from) = query.from {
            query_parts.push(format!("date=gte.{}", from));
        }
        if let Some(to) = query.to {
            query_parts.push(format!("date=lte.{}", to));
        }

        query_parts.push("order=date.asc,time.asc".to_string());
        query_parts.push(format!("limit={}", query.limit.unwrap_or(50)));
        query_parts.push(format!("offset={}", query.offset.unwrap_or(0)));

        self.select_bookings(&query_parts.join("&")).await
    }

    /// Non-cancelled bookings on `date` with `start <= time < end`.
    pub async fn list_bookings_in_window(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Vec<Booking>, BookingError> {
        let query = format!(
            "date=eq.{}&time=gte.{}&time=lt.{}&status=neq.cancelled&order=time.asc",
            date,
            start.format("%H:%M:%S"),
            end.format("%H:%M:%S")
        );

        self.select_bookings(&query).await
    }

    /// Moves a booking to `new_status`, enforcing the lifecycle and the
    /// caller's role. The write only lands if the status is still the one
    /// that was read.
    pub async fn update_status(
        &self,
        booking_id: &Uuid,
        new_status: BookingStatus,
        requester: &User,
    ) -> Result<Booking, BookingError> {
        let booking = self.find_booking(booking_id).await?;

        self.lifecycle.authorize_transition(requester, &booking, new_status)?;
        self.lifecycle.validate_status_transition(booking.status, new_status)?;

        if new_status == BookingStatus::Completed {
            let outcome = self.completion
                .complete_booking(booking_id, CompletionDetails::default(), requester)
                .await?;
            return Ok(outcome.booking);
        }

        let now = Utc::now().to_rfc3339();
        let mut update_data = Map::new();
        update_data.insert("status".to_string(), json!(new_status));
        update_data.insert("updated_at".to_string(), json!(now));

        match new_status {
            BookingStatus::Cancelled => {
                update_data.insert("cancelled_at".to_string(), json!(now));
            }
            BookingStatus::Confirmed if requester.is_doctor() => {
                update_data.insert("doctor_id".to_string(), json!(requester.id));
            }
            _ => {}
        }

        let updated: Vec<Booking> = self.supabase
            .update(
                BOOKINGS_TABLE,
                &format!("id=eq.{}&status=eq.{}", booking_id, booking.status),
                Value::Object(update_data),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let booking = updated.into_iter().next().ok_or_else(|| {
            warn!("Booking {} changed status concurrently", booking_id);
            BookingError::StatusChanged
        })?;

        info!("Booking {} is now {}", booking.id, booking.status);
        Ok(booking)
    }

    pub async fn cancel_booking(&self, booking_id: &Uuid, requester: &User) -> Result<Booking, BookingError> {
        self.update_status(booking_id, BookingStatus::Cancelled, requester).await
    }

    pub async fn update_payment_status(
        &self,
        booking_id: &Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Booking, BookingError> {
        let updated: Vec<Booking> = self.supabase
            .update(
                BOOKINGS_TABLE,
                &format!("id=eq.{}", booking_id),
                json!({
                    "payment_status": payment_status,
                    "updated_at": Utc::now().to_rfc3339()
                }),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let booking = updated.into_iter().next().ok_or(BookingError::NotFound)?;
        info!("Booking {} payment is now {}", booking.id, booking.payment_status);
        Ok(booking)
    }

    async fn find_booking(&self, booking_id: &Uuid) -> Result<Booking, BookingError> {
        self.supabase
            .select_one(BOOKINGS_TABLE, &format!("id=eq.{}", booking_id))
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?
            .ok_or(BookingError::NotFound)
    }

    async fn select_bookings(&self, query: &str) -> Result<Vec<Booking>, BookingError> {
        debug!("Fetching bookings with query: {}", query);

        self.supabase
            .select(BOOKINGS_TABLE, query)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))
    }

    async fn count_active_bookings(&self, facility_id: &Uuid, date: NaiveDate) -> Result<usize, BookingError> {
        let rows: Vec<Value> = self.supabase
            .select(
                BOOKINGS_TABLE,
                &format!(
                    "select=id&facility_id=eq.{}&date=eq.{}&status=neq.cancelled",
                    facility_id, date
                ),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        Ok(rows.len())
    }
}
