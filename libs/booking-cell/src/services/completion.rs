use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    BookingError, BookingStatus, CompletionDetails, CompletionOutcome, CompletionRpcResult,
};

const COMPLETE_BOOKING_FN: &str = "complete_booking";

/// Marks a confirmed booking completed and appends the history record in one
/// database transaction.
pub struct CompletionService {
    supabase: SupabaseClient,
}

impl CompletionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn complete_booking(
        &self,
        booking_id: &Uuid,
        details: CompletionDetails,
        completed_by: &User,
    ) -> Result<CompletionOutcome, BookingError> {
        if !completed_by.is_staff() {
            return Err(BookingError::Forbidden(
                "Only doctors can complete a vaccination".to_string(),
            ));
        }

        debug!("Completing booking {} by {}", booking_id, completed_by.id);

        let result: CompletionRpcResult = self.supabase
            .rpc(
                COMPLETE_BOOKING_FN,
                json!({
                    "p_booking_id": booking_id,
                    "p_doctor_id": completed_by.id,
                    "p_batch_number": details.batch_number,
                    "p_side_effects": details.side_effects,
                    "p_notes": details.notes
                }),
            )
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        match result {
            CompletionRpcResult::Completed { booking, history } => {
                info!("Booking {} completed, history record {}", booking.id, history.id);
                Ok(CompletionOutcome { booking, history })
            }
            CompletionRpcResult::NotFound => Err(BookingError::NotFound),
            CompletionRpcResult::InvalidStatus { current_status } => {
                warn!("Booking {} cannot be completed from {}", booking_id, current_status);
                Err(BookingError::InvalidTransition {
                    from: current_status,
                    to: BookingStatus::Completed,
                })
            }
        }
    }
}
