use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        // Shift registration and capacity
        .route("/shifts", post(handlers::register_shift).get(handlers::list_my_shifts))
        .route("/shifts/capacity", get(handlers::get_shift_capacity))
        .route("/shifts/bookings", get(handlers::get_shift_bookings))
        .route("/shifts/{shift_id}", delete(handlers::cancel_shift))

        // Work on bookings inside a shift
        .route("/bookings/{booking_id}/confirm", post(handlers::confirm_booking))
        .route("/bookings/{booking_id}/complete", post(handlers::complete_booking))

        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
