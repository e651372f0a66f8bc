pub mod facility;
pub mod geo;

pub use facility::FacilityService;
pub use geo::haversine_km;
