use std::sync::Arc;
use axum::{middleware, routing::{get, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn history_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_history_record))
        .route("/user/{user_id}", get(get_user_history))
        .route("/{record_id}", get(get_history_record))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
