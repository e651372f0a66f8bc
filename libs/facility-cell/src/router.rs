use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn facility_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_facilities))
        .route("/{facility_id}", get(handlers::get_facility));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_facility))
        .route("/{facility_id}", put(handlers::update_facility).delete(handlers::delete_facility))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
