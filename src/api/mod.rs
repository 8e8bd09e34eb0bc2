//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/devices", get(list_devices_handler).post(create_device_handler))
        .route(
            "/devices/:key",
            get(get_device_handler)
                .patch(update_device_handler)
                .delete(delete_device_handler),
        )
        .route("/devices/:key/heartbeat", post(heartbeat_handler))
        .route("/devices/:key/timer", get(timer_status_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
