use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{is_conflict, SupabaseClient};
use shared_models::auth::User;

use crate::models::{CreateHistoryRequest, HistoryError, HistoryQuery, VaccinationHistory};

const HISTORY_TABLE: &str = "vaccination_history";

pub struct HistoryService {
    supabase: SupabaseClient,
}

impl HistoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Newest dose first.
    pub async fn list_for_user(
        &self,
        user_id: &Uuid,
        query: HistoryQuery,
        requester: &User,
    ) -> Result<Vec<VaccinationHistory>, HistoryError> {
        if !requester.can_access_user(user_id) {
            return Err(HistoryError::Forbidden);
        }

        let mut query_parts = vec![format!("user_id=eq.{}", user_id)];
        if let Some(vaccine_id) = query.vaccine_id {
            query_parts.push(format!("vaccine_id=eq.{}", vaccine_id));
        }
        query_parts.push("order=date.desc,created_at.desc".to_string());
        if let Some(limit) = query.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = query.offset {
            query_parts.push(format!("offset={}", offset));
        }

        debug!("Fetching vaccination history for user {}", user_id);

        self.supabase
            .select(HISTORY_TABLE, &query_parts.join("&"))
            .await
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))
    }

    pub async fn get_record(
        &self,
        record_id: &Uuid,
        requester: &User,
    ) -> Result<VaccinationHistory, HistoryError> {
        let record: VaccinationHistory = self.supabase
            .select_one(HISTORY_TABLE, &format!("id=eq.{}", record_id))
            .await
            .map_err(|e| HistoryError::DatabaseError(e.to_string()))?
            .ok_or(HistoryError::NotFound)?;

        if !requester.can_access_user(&record.user_id) {
            return Err(HistoryError::Forbidden);
        }

        Ok(record)
    }

    /// Records a dose given outside the booking flow.
    pub async fn create_record(
        &self,
        request: CreateHistoryRequest,
        recorded_by: &User,
    ) -> Result<VaccinationHistory, HistoryError> {
        if request.dose_number < 1 {
            return Err(HistoryError::ValidationError(
                "dose_number must be at least 1".to_string(),
            ));
        }
        if request.location.trim().is_empty() {
            return Err(HistoryError::ValidationError("location is required".to_string()));
        }
        if request.date > Utc::now().date_naive() {
            return Err(HistoryError::ValidationError(
                "Cannot record a vaccination in the future".to_string(),
            ));
        }

        let record: VaccinationHistory = self.supabase
            .insert(
                HISTORY_TABLE,
                json!({
                    "user_id": request.user_id,
                    "vaccine_id": request.vaccine_id,
                    "booking_id": null,
                    "dose_number": request.dose_number,
                    "date": request.date,
                    "location": request.location.trim(),
                    "doctor_id": recorded_by.id,
                    "batch_number": request.batch_number,
                    "side_effects": request.side_effects,
                    "notes": request.notes,
                    "created_at": Utc::now().to_rfc3339()
                }),
            )
            .await
            .map_err(|e| {
                if is_conflict(&e) {
                    HistoryError::UnknownReference
                } else {
                    HistoryError::DatabaseError(e.to_string())
                }
            })?;

        info!("Recorded dose {} for user {} by {}", record.dose_number, record.user_id, recorded_by.id);
        Ok(record)
    }
}
