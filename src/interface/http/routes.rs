use std::sync::Arc;

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::application::HostService;

use super::handlers::{
    add_host_handler, data_handler, health_handler, list_hosts_handler, remove_host_handler,
    AppState,
};

pub fn create_router(host_service: Arc<HostService>) -> Router {
    let state = AppState { host_service };

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/data", get(data_handler))
        .route("/api/hosts", get(list_hosts_handler).post(add_host_handler))
        .route("/api/hosts/{ip}", delete(remove_host_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
