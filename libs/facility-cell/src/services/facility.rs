use std::cmp::Ordering;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{filter_value, is_conflict, SupabaseClient};

use crate::models::{
    CreateFacilityRequest, Facility, FacilityError, FacilityListing, FacilitySearchQuery,
    Location, OperatingHours, UpdateFacilityRequest,
};
use crate::services::geo::haversine_km;

const FACILITIES_TABLE: &str = "facilities";

pub const DEFAULT_RADIUS_KM: f64 = 10.0;

pub struct FacilityService {
    supabase: SupabaseClient,
}

impl FacilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub async fn list_facilities(
        &self,
        query: FacilitySearchQuery,
    ) -> Result<Vec<FacilityListing>, FacilityError> {
        let origin = nearby_origin(&query)?;

        let mut query_parts = Vec::new();
        if let Some(active) = query.active {
            query_parts.push(format!("is_active=eq.{}", active));
        }
        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query_parts.push(format!("name=ilike.*{}*", filter_value(search)));
        }
        query_parts.push("order=name.asc".to_string());

        debug!("Listing facilities with query: {}", query_parts.join("&"));

        let facilities: Vec<Facility> = self.supabase
            .select(FACILITIES_TABLE, &query_parts.join("&"))
            .await
            .map_err(|e| FacilityError::DatabaseError(e.to_string()))?;

        let listings = match origin {
            Some((center, radius_km)) => within_radius(facilities, center, radius_km),
            None => facilities
                .into_iter()
                .map(|facility| FacilityListing { facility, distance_km: None })
                .collect(),
        };

        Ok(listings
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    pub async fn get_facility(&self, facility_id: &Uuid) -> Result<Facility, FacilityError> {
        debug!("Fetching facility {}", facility_id);

        self.supabase
            .select_one(FACILITIES_TABLE, &format!("id=eq.{}", facility_id))
            .await
            .map_err(|e| FacilityError::DatabaseError(e.to_string()))?
            .ok_or(FacilityError::NotFound)
    }

    pub async fn create_facility(&self, request: CreateFacilityRequest) -> Result<Facility, FacilityError> {
        require_text("name", &request.name)?;
        require_text("address", &request.address)?;
        validate_capacity(request.max_bookings_per_day)?;
        validate_location(&request.location)?;
        validate_hours(&request.operating_hours)?;

        let now = Utc::now().to_rfc3339();
        let facility: Facility = self.supabase
            .insert(
                FACILITIES_TABLE,
                json!({
                    "name": request.name.trim(),
                    "address": request.address.trim(),
                    "phone": request.phone,
                    "operating_hours": request.operating_hours,
                    "location": request.location,
                    "max_bookings_per_day": request.max_bookings_per_day,
                    "is_active": request.is_active.unwrap_or(true),
                    "created_at": now,
                    "updated_at": now
                }),
            )
            .await
            .map_err(|e| FacilityError::DatabaseError(e.to_string()))?;

        info!("Created facility {} ({})", facility.id, facility.name);
        Ok(facility)
    }

    pub async fn update_facility(
        &self,
        facility_id: &Uuid,
        request: UpdateFacilityRequest,
    ) -> Result<Facility, FacilityError> {
        let update_data = update_body(request)?;

        let updated: Vec<Facility> = self.supabase
            .update(FACILITIES_TABLE, &format!("id=eq.{}", facility_id), Value::Object(update_data))
            .await
            .map_err(|e| FacilityError::DatabaseError(e.to_string()))?;

        let facility = updated.into_iter().next().ok_or(FacilityError::NotFound)?;
        info!("Updated facility {}", facility.id);
        Ok(facility)
    }

    pub async fn delete_facility(&self, facility_id: &Uuid) -> Result<(), FacilityError> {
        let deleted: Vec<Facility> = self.supabase
            .delete(FACILITIES_TABLE, &format!("id=eq.{}", facility_id))
            .await
            .map_err(|e| {
                if is_conflict(&e) {
                    FacilityError::InUse
                } else {
                    FacilityError::DatabaseError(e.to_string())
                }
            })?;

        if deleted.is_empty() {
            return Err(FacilityError::NotFound);
        }

        info!("Deleted facility {}", facility_id);
        Ok(())
    }
}

/// Center and radius of a nearby search, if one was requested.
fn nearby_origin(query: &FacilitySearchQuery) -> Result<Option<(Location, f64)>, FacilityError> {
    match (query.lat, query.lng) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => {
            let center = Location { latitude, longitude };
            validate_location(&center)?;

            let radius_km = query.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
            if !radius_km.is_finite() || radius_km <= 0.0 {
                return Err(FacilityError::ValidationError(
                    "radius_km must be positive".to_string(),
                ));
            }
            Ok(Some((center, radius_km)))
        }
        _ => Err(FacilityError::ValidationError(
            "lat and lng must be given together".to_string(),
        )),
    }
}

/// Facilities within `radius_km` of `center`, nearest first.
pub fn within_radius(facilities: Vec<Facility>, center: Location, radius_km: f64) -> Vec<FacilityListing> {
    let mut listings: Vec<FacilityListing> = facilities
        .into_iter()
        .filter_map(|facility| {
            let distance = haversine_km(
                center.latitude,
                center.longitude,
                facility.location.latitude,
                facility.location.longitude,
            );
            (distance <= radius_km).then_some(FacilityListing {
                facility,
                distance_km: Some(distance),
            })
        })
        .collect();

    listings.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    listings
}

fn require_text(field: &str, value: &str) -> Result<(), FacilityError> {
    if value.trim().is_empty() {
        return Err(FacilityError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_capacity(max_bookings_per_day: i32) -> Result<(), FacilityError> {
    if max_bookings_per_day < 1 {
        return Err(FacilityError::ValidationError(
            "max_bookings_per_day must be at least 1".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_location(location: &Location) -> Result<(), FacilityError> {
    if !(-90.0..=90.0).contains(&location.latitude) {
        return Err(FacilityError::ValidationError(
            "latitude must be between -90 and 90".to_string(),
        ));
    }
    if !(-180.0..=180.0).contains(&location.longitude) {
        return Err(FacilityError::ValidationError(
            "longitude must be between -180 and 180".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_hours(hours: &OperatingHours) -> Result<(), FacilityError> {
    for (day, day_hours) in hours.days() {
        if let Some(day_hours) = day_hours {
            if day_hours.open >= day_hours.close {
                return Err(FacilityError::ValidationError(format!(
                    "Opening time must be before closing time on {}",
                    day
                )));
            }
        }
    }
    Ok(())
}

fn update_body(request: UpdateFacilityRequest) -> Result<Map<String, Value>, FacilityError> {
    let mut update_data = Map::new();

    if let Some(name) = request.name {
        require_text("name", &name)?;
        update_data.insert("name".to_string(), json!(name.trim()));
    }
    if let Some(address) = request.address {
        require_text("address", &address)?;
        update_data.insert("address".to_string(), json!(address.trim()));
    }
    if let Some(phone) = request.phone {
        update_data.insert("phone".to_string(), json!(phone));
    }
    if let Some(hours) = request.operating_hours {
        validate_hours(&hours)?;
        update_data.insert("operating_hours".to_string(), json!(hours));
    }
    if let Some(location) = request.location {
        validate_location(&location)?;
        update_data.insert("location".to_string(), json!(location));
    }
    if let Some(max) = request.max_bookings_per_day {
        validate_capacity(max)?;
        update_data.insert("max_bookings_per_day".to_string(), json!(max));
    }
    if let Some(is_active) = request.is_active {
        update_data.insert("is_active".to_string(), json!(is_active));
    }

    if update_data.is_empty() {
        return Err(FacilityError::ValidationError("No fields to update".to_string()));
    }

    update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
    Ok(update_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::models::DayHours;

    fn facility_at(name: &str, latitude: f64, longitude: f64) -> Facility {
        Facility {
            id: Uuid::new_v4(),
            name: name.to_string(),
            address: "Somewhere".to_string(),
            phone: None,
            operating_hours: OperatingHours::default(),
            location: Location { latitude, longitude },
            max_bookings_per_day: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_within_radius_filters_and_orders_by_distance() {
        let center = Location { latitude: 53.3498, longitude: -6.2603 };
        let facilities = vec![
            facility_at("far", 53.2707, -9.0568),
            facility_at("near", 53.3440, -6.2672),
            facility_at("nearer", 53.3490, -6.2600),
        ];

        let listings = within_radius(facilities, center, 10.0);
        let names: Vec<&str> = listings.iter().map(|l| l.facility.name.as_str()).collect();

        assert_eq!(names, vec!["nearer", "near"]);
        assert!(listings[0].distance_km.unwrap() < listings[1].distance_km.unwrap());
    }

    #[test]
    fn test_location_bounds() {
        assert!(validate_location(&Location { latitude: 90.0, longitude: -180.0 }).is_ok());
        assert_matches!(
            validate_location(&Location { latitude: 90.5, longitude: 0.0 }),
            Err(FacilityError::ValidationError(_))
        );
        assert_matches!(
            validate_location(&Location { latitude: 0.0, longitude: 181.0 }),
            Err(FacilityError::ValidationError(_))
        );
    }

    #[test]
    fn test_hours_must_open_before_closing() {
        let hours = OperatingHours {
            friday: Some(DayHours {
                open: "18:00:00".parse().unwrap(),
                close: "09:00:00".parse().unwrap(),
            }),
            ..Default::default()
        };
        assert_matches!(validate_hours(&hours), Err(FacilityError::ValidationError(_)));
    }

    #[test]
    fn test_nearby_needs_both_coordinates() {
        let query = FacilitySearchQuery { lat: Some(1.0), ..Default::default() };
        assert_matches!(nearby_origin(&query), Err(FacilityError::ValidationError(_)));

        let query = FacilitySearchQuery { lat: Some(1.0), lng: Some(2.0), ..Default::default() };
        assert_matches!(nearby_origin(&query), Ok(Some((_, r))) if r == DEFAULT_RADIUS_KM);
    }
}
