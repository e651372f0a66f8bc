use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{filter_value, is_conflict, SupabaseClient};

use crate::models::{
    CreateVaccineRequest, UpdateVaccineRequest, Vaccine, VaccineError, VaccineSearchQuery,
};

const VACCINES_TABLE: &str = "vaccines";

pub struct VaccineService {
    supabase: SupabaseClient,
}

impl VaccineService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_vaccines(&self, query: VaccineSearchQuery) -> Result<Vec<Vaccine>, VaccineError> {
        let mut query_parts = Vec::new();

        if let Some(active) = query.active {
            query_parts.push(format!("is_active=eq.{}", active));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query_parts.push(format!("name=ilike.*{}*", filter_value(search)));
        }

        query_parts.push("order=name.asc".to_string());
        if let Some(limit) = query.limit {
            query_parts.push(format!("limit={}", limit));
        }
        if let Some(offset) = query.offset {
            query_parts.push(format!("offset={}", offset));
        }

        debug!("Listing vaccines with query: {}", query_parts.join("&"));

        self.supabase
            .select(VACCINES_TABLE, &query_parts.join("&"))
            .await
            .map_err(|e| VaccineError::DatabaseError(e.to_string()))
    }

    pub async fn get_vaccine(&self, vaccine_id: &Uuid) -> Result<Vaccine, VaccineError> {
        debug!("Fetching vaccine {}", vaccine_id);

        self.supabase
            .select_one(VACCINES_TABLE, &format!("id=eq.{}", vaccine_id))
            .await
            .map_err(|e| VaccineError::DatabaseError(e.to_string()))?
            .ok_or(VaccineError::NotFound)
    }

    pub async fn create_vaccine(&self, request: CreateVaccineRequest) -> Result<Vaccine, VaccineError> {
        validate_create(&request)?;

        let now = Utc::now().to_rfc3339();
        let vaccine: Vaccine = self.supabase
            .insert(
                VACCINES_TABLE,
                json!({
                    "name": request.name.trim(),
                    "manufacturer": request.manufacturer.trim(),
                    "description": request.description,
                    "dosage": request.dosage,
                    "doses_required": request.doses_required.unwrap_or(1),
                    "storage_temperature": request.storage_temperature,
                    "shelf_life": request.shelf_life,
                    "quantity": request.quantity,
                    "price": request.price,
                    "is_active": request.is_active.unwrap_or(true),
                    "created_at": now,
                    "updated_at": now
                }),
            )
            .await
            .map_err(|e| VaccineError::DatabaseError(e.to_string()))?;

        info!("Created vaccine {} ({})", vaccine.id, vaccine.name);
        Ok(vaccine)
    }

    pub async fn update_vaccine(
        &self,
        vaccine_id: &Uuid,
        request: UpdateVaccineRequest,
    ) -> Result<Vaccine, VaccineError> {
        let update_data = update_body(request)?;

        let updated: Vec<Vaccine> = self.supabase
            .update(VACCINES_TABLE, &format!("id=eq.{}", vaccine_id), Value::Object(update_data))
            .await
            .map_err(|e| VaccineError::DatabaseError(e.to_string()))?;

        let vaccine = updated.into_iter().next().ok_or(VaccineError::NotFound)?;
        info!("Updated vaccine {}", vaccine.id);
        Ok(vaccine)
    }

    pub async fn delete_vaccine(&self, vaccine_id: &Uuid) -> Result<(), VaccineError> {
        let deleted: Vec<Vaccine> = self.supabase
            .delete(VACCINES_TABLE, &format!("id=eq.{}", vaccine_id))
            .await
            .map_err(|e| {
                // Bookings and history rows keep a foreign key to the vaccine.
                if is_conflict(&e) {
                    VaccineError::InUse
                } else {
                    VaccineError::DatabaseError(e.to_string())
                }
            })?;

        if deleted.is_empty() {
            return Err(VaccineError::NotFound);
        }

        info!("Deleted vaccine {}", vaccine_id);
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<(), VaccineError> {
    if value.trim().is_empty() {
        return Err(VaccineError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_numbers(
    doses_required: Option<i32>,
    quantity: Option<i32>,
    price: Option<f64>,
) -> Result<(), VaccineError> {
    if doses_required.is_some_and(|d| d < 1) {
        return Err(VaccineError::ValidationError(
            "doses_required must be at least 1".to_string(),
        ));
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err(VaccineError::ValidationError(
            "quantity cannot be negative".to_string(),
        ));
    }
    if price.is_some_and(|p| !p.is_finite() || p < 0.0) {
        return Err(VaccineError::ValidationError(
            "price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_create(request: &CreateVaccineRequest) -> Result<(), VaccineError> {
    require_text("name", &request.name)?;
    require_text("manufacturer", &request.manufacturer)?;
    validate_numbers(request.doses_required, Some(request.quantity), Some(request.price))
}

/// Builds the PATCH body from the fields that were supplied.
fn update_body(request: UpdateVaccineRequest) -> Result<Map<String, Value>, VaccineError> {
    validate_numbers(request.doses_required, request.quantity, request.price)?;

    let mut update_data = Map::new();

    if let Some(name) = request.name {
        require_text("name", &name)?;
        update_data.insert("name".to_string(), json!(name.trim()));
    }
    if let Some(manufacturer) = request.manufacturer {
        require_text("manufacturer", &manufacturer)?;
        update_data.insert("manufacturer".to_string(), json!(manufacturer.trim()));
    }
    if let Some(description) = request.description {
        update_data.insert("description".to_string(), json!(description));
    }
    if let Some(dosage) = request.dosage {
        update_data.insert("dosage".to_string(), json!(dosage));
    }
    if let Some(doses) = request.doses_required {
        update_data.insert("doses_required".to_string(), json!(doses));
    }
    if let Some(temperature) = request.storage_temperature {
        update_data.insert("storage_temperature".to_string(), json!(temperature));
    }
    if let Some(shelf_life) = request.shelf_life {
        update_data.insert("shelf_life".to_string(), json!(shelf_life));
    }
    if let Some(quantity) = request.quantity {
        update_data.insert("quantity".to_string(), json!(quantity));
    }
    if let Some(price) = request.price {
        update_data.insert("price".to_string(), json!(price));
    }
    if let Some(is_active) = request.is_active {
        update_data.insert("is_active".to_string(), json!(is_active));
    }

    if update_data.is_empty() {
        return Err(VaccineError::ValidationError("No fields to update".to_string()));
    }

    update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    Ok(update_data)
}
