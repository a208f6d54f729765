use axum::Json;
use crate::{db::dbtables, models::HealthResponse};
use tracing::debug;

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    })
}

/// Readiness check endpoint
pub async fn ready_check() -> Json<HealthResponse> {
    debug!("Readiness check requested");
    let message = match dbtables::get_db() {
        Some(_) => "Service is ready",
        None => "Service is ready (no table database, tables start empty)",
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        message: message.to_string(),
    })
}
