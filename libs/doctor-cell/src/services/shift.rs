use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use booking_cell::models::{Booking, BookingStatus, CompletionDetails, CompletionOutcome};
use booking_cell::services::{BookingService, CompletionService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    CompleteBookingRequest, DoctorShift, RegisterShiftRequest, RegisterShiftRpcResult,
    ShiftBookingsQuery, ShiftCapacity, ShiftError, ShiftListQuery, ShiftStatus, ShiftType,
};

const SHIFTS_TABLE: &str = "doctor_shifts";
const REGISTER_SHIFT_FN: &str = "register_doctor_shift";

pub struct ShiftService {
    supabase: SupabaseClient,
    bookings: BookingService,
    completion: CompletionService,
    max_doctors: i64,
}

impl ShiftService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bookings: BookingService::new(config),
            completion: CompletionService::new(config),
            max_doctors: config.max_doctors_per_shift,
        }
    }

    /// Registers `doctor` for a shift. Counting and inserting happen in one
    /// database transaction, so a slot never exceeds `max_doctors`.
    pub async fn register_shift(
        &self,
        request: RegisterShiftRequest,
        doctor: &User,
    ) -> Result<DoctorShift, ShiftError> {
        if request.shift_date < Utc::now().date_naive() {
            return Err(ShiftError::DateInPast);
        }

        debug!(
            "Doctor {} registering for {} shift on {}",
            doctor.id, request.shift_type, request.shift_date
        );

        let (start_time, end_time) = request.shift_type.window();
        let result: RegisterShiftRpcResult = self.supabase
            .rpc(
                REGISTER_SHIFT_FN,
                json!({
                    "p_doctor_id": doctor.id,
                    "p_shift_date": request.shift_date,
                    "p_shift_type": request.shift_type,
                    "p_start_time": start_time,
                    "p_end_time": end_time,
                    "p_max_doctors": self.max_doctors
                }),
            )
            .await
            .map_err(|e| ShiftError::DatabaseError(e.to_string()))?;

        match result {
            RegisterShiftRpcResult::Registered { shift } => {
                info!("Doctor {} registered for shift {}", doctor.id, shift.id);
                Ok(shift)
            }
            RegisterShiftRpcResult::Full { doctor_count, max_doctors } => {
                warn!(
                    "{} shift on {} is full ({}/{})",
                    request.shift_type, request.shift_date, doctor_count, max_doctors
                );
                Err(ShiftError::ShiftFull)
            }
            RegisterShiftRpcResult::Duplicate => Err(ShiftError::AlreadyRegistered),
        }
    }

    pub async fn list_shifts(
        &self,
        doctor_id: &Uuid,
        query: ShiftListQuery,
    ) -> Result<Vec<DoctorShift>, ShiftError> {
        let mut query_parts = vec![format!("doctor_id=eq.{}", doctor_id)];

        if let Some(from) = query.from {
            query_parts.push(format!("shift_date=gte.{}", from));
        }
        if let Some(to) = query.to {
            query_parts.push(format!("shift_date=lte.{}", to));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        query_parts.push("order=shift_date.asc,start_time.asc".to_string());

        self.supabase
            .select(SHIFTS_TABLE, &query_parts.join("&"))
            .await
            .map_err(|e| ShiftError::DatabaseError(e.to_string()))
    }

    pub async fn cancel_shift(&self, shift_id: &Uuid, requester: &User) -> Result<DoctorShift, ShiftError> {
        let shift = self.find_shift(shift_id).await?;

        if shift.doctor_id != requester.id && !requester.is_admin() {
            return Err(ShiftError::NotYourShift);
        }
        if shift.shift_date < Utc::now().date_naive() {
            return Err(ShiftError::DateInPast);
        }

        let updated: Vec<DoctorShift> = self.supabase
            .update(
                SHIFTS_TABLE,
                &format!("id=eq.{}&status=eq.{}", shift_id, ShiftStatus::Registered),
                json!({
                    "status": ShiftStatus::Cancelled,
                    "updated_at": Utc::now().to_rfc3339()
                }),
            )
            .await
            .map_err(|e| ShiftError::DatabaseError(e.to_string()))?;

        let shift = updated.into_iter().next().ok_or(ShiftError::NotRegistered)?;
        info!("Shift {} cancelled", shift.id);
        Ok(shift)
    }

    /// How many doctors hold a registered slot for the shift.
    pub async fn get_capacity(
        &self,
        shift_date: NaiveDate,
        shift_type: ShiftType,
    ) -> Result<ShiftCapacity, ShiftError> {
        let rows: Vec<Value> = self.supabase
            .select(
                SHIFTS_TABLE,
                &format!(
                    "select=id&shift_date=eq.{}&shift_type=eq.{}&status=eq.{}",
                    shift_date, shift_type, ShiftStatus::Registered
                ),
            )
            .await
            .map_err(|e| ShiftError::DatabaseError(e.to_string()))?;

        Ok(ShiftCapacity::new(shift_date, shift_type, rows.len() as i64, self.max_doctors))
    }

    /// Bookings falling inside a shift, addressed by id or by date and type.
    pub async fn get_shift_bookings(
        &self,
        query: ShiftBookingsQuery,
        requester: &User,
    ) -> Result<Vec<Booking>, ShiftError> {
        let (date, shift_type) = match (query.shift_id, query.date, query.shift_type) {
            (Some(shift_id), _, _) => {
                let shift = self.find_shift(&shift_id).await?;
                if shift.doctor_id != requester.id && !requester.is_admin() {
                    return Err(ShiftError::NotYourShift);
                }
                (shift.shift_date, shift.shift_type)
            }
            (None, Some(date), Some(shift_type)) => (date, shift_type),
            _ => {
                return Err(ShiftError::ValidationError(
                    "Provide shift_id, or date and shift_type".to_string(),
                ))
            }
        };

        let (start, end) = shift_type.window();
        debug!("Fetching bookings for {} shift on {}", shift_type, date);

        Ok(self.bookings.list_bookings_in_window(date, start, end).await?)
    }

    pub async fn confirm_booking(&self, booking_id: &Uuid, doctor: &User) -> Result<Booking, ShiftError> {
        Ok(self.bookings
            .update_status(booking_id, BookingStatus::Confirmed, doctor)
            .await?)
    }

    pub async fn complete_booking(
        &self,
        booking_id: &Uuid,
        request: CompleteBookingRequest,
        doctor: &User,
    ) -> Result<CompletionOutcome, ShiftError> {
        let batch_number = request.batch_number.trim();
        if batch_number.is_empty() {
            return Err(ShiftError::ValidationError("batch_number is required".to_string()));
        }

        let details = CompletionDetails {
            batch_number: Some(batch_number.to_string()),
            side_effects: request.side_effects,
            notes: request.notes,
        };

        Ok(self.completion
            .complete_booking(booking_id, details, doctor)
            .await?)
    }

    async fn find_shift(&self, shift_id: &Uuid) -> Result<DoctorShift, ShiftError> {
        self.supabase
            .select_one(SHIFTS_TABLE, &format!("id=eq.{}", shift_id))
            .await
            .map_err(|e| ShiftError::DatabaseError(e.to_string()))?
            .ok_or(ShiftError::NotFound)
    }
}
