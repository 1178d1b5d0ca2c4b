//! WebAPI - HTTP endpoints
//!
//! ## Responsibilities
//!
//! - Webhook ingestion route
//! - Service info and health endpoints
//! - Response formatting

mod routes;

pub use routes::create_router;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint; degraded (503) when the state store is
/// unreachable
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.store.health_check().await;

    let status_text = if store_ok { "healthy" } else { "degraded" };
    let response = HealthResponse {
        status: status_text.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_sec: state.uptime_sec(),
        store_connected: store_ok,
    };

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

/// Service info endpoint for quick manual verification
pub async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "running",
        "service": "Camera Webhook Analytics Processor",
        "version": env!("CARGO_PKG_VERSION"),
        "listening_on": format!("{}:{}", state.config.host, state.config.port),
        "store_url": state.store.base_url(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
