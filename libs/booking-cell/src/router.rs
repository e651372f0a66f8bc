use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_booking).get(handlers::list_bookings))
        .route("/user/{user_id}", get(handlers::get_user_bookings))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/status", put(handlers::update_booking_status))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .route("/{booking_id}/payment", put(handlers::update_payment_status))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
