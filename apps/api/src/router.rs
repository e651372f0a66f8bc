use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use auth_cell::router::auth_routes;
use booking_cell::router::booking_routes;
use doctor_cell::router::doctor_routes;
use facility_cell::router::facility_routes;
use history_cell::router::history_routes;
use shared_config::AppConfig;
use vaccine_cell::router::vaccine_routes;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let api = Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/vaccines", vaccine_routes(state.clone()))
        .nest("/facilities", facility_routes(state.clone()))
        .nest("/booking", booking_routes(state.clone()))
        .nest("/doctor", doctor_routes(state.clone()))
        .nest("/history", history_routes(state));

    Router::new()
        .route("/", get(|| async { "VaxTrack API is running!" }))
        .nest("/api", api)
}
