use tracing::{debug, info, warn};

use shared_models::auth::User;

use crate::models::{Booking, BookingError, BookingStatus};

pub struct BookingLifecycleService;

impl Default for BookingLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: BookingStatus) -> Vec<BookingStatus> {
        match current_status {
            BookingStatus::Pending => vec![
                BookingStatus::Confirmed,
                BookingStatus::Cancelled,
            ],
            BookingStatus::Confirmed => vec![
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ],
            // Terminal states
            BookingStatus::Completed => vec![],
            BookingStatus::Cancelled => vec![],
        }
    }

    /// Who may move a booking where: admins anything, doctors confirm,
    /// complete and cancel, the owner only cancel.
    pub fn authorize_transition(
        &self,
        user: &User,
        booking: &Booking,
        new_status: BookingStatus,
    ) -> Result<(), BookingError> {
        if user.is_admin() {
            return Ok(());
        }

        let allowed = if user.is_doctor() {
            matches!(
                new_status,
                BookingStatus::Confirmed | BookingStatus::Completed | BookingStatus::Cancelled
            )
        } else {
            booking.user_id == user.id && new_status == BookingStatus::Cancelled
        };

        if allowed {
            Ok(())
        } else {
            Err(BookingError::Forbidden(format!(
                "Not allowed to mark this booking as {}",
                new_status
            )))
        }
    }
}
