use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn vaccine_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", get(handlers::list_vaccines))
        .route("/{vaccine_id}", get(handlers::get_vaccine));

    let protected_routes = Router::new()
        .route("/", post(handlers::create_vaccine))
        .route("/{vaccine_id}", put(handlers::update_vaccine).delete(handlers::delete_vaccine))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
