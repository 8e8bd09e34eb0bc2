//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use tracing::info;

use super::responses::{
    ApiError, CreateDeviceRequest, HealthResponse, ListQuery, StatusResponse,
};
use crate::state::{AppState, DevicePage, DevicePatch, DeviceRecord, TimerStatus};

const DEFAULT_PAGE_SIZE: usize = 10;

/// Handle GET /devices - List devices page by page
pub async fn list_devices_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DevicePage>, ApiError> {
    let page = state
        .list_devices(query.page.unwrap_or(1), query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
        .await?;
    Ok(Json(page))
}

/// Handle POST /devices - Register a device
pub async fn create_device_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceRecord>), ApiError> {
    let record = state.create_device(&request.key).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Handle GET /devices/:key
pub async fn get_device_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<DeviceRecord>, ApiError> {
    Ok(Json(state.get_device(&key).await?))
}

/// Handle PATCH /devices/:key - Apply a partial update, possibly arming the timer
pub async fn update_device_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(patch): Json<DevicePatch>,
) -> Result<Json<DeviceRecord>, ApiError> {
    let record = state.reconcile(&key, patch).await?;
    Ok(Json(record))
}

/// Handle DELETE /devices/:key - Remove a device and stop its timer
pub async fn delete_device_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.delete_device(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /devices/:key/heartbeat
pub async fn heartbeat_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<DeviceRecord>, ApiError> {
    Ok(Json(state.heartbeat(&key).await?))
}

/// Handle GET /devices/:key/timer - Live countdown state
pub async fn timer_status_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<TimerStatus>, ApiError> {
    Ok(Json(state.timer_status(&key).await?))
}

/// Handle GET /status - Return server status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let active_timers = state.active_timers();
    info!("Status requested: {} active timers", active_timers);
    Json(StatusResponse {
        active_timers,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        timestamp: Utc::now(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
