//! Health check endpoint

use axum::{routing::get, Json, Router};
use chrono::Local;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub module: String,
    pub version: String,
    /// Local time, RFC 3339
    pub timestamp: String,
}

/// GET /api/health
///
/// Does not touch the store, so it answers even when no profile is reachable.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "IMD server running".to_string(),
        module: "imd-mc".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Local::now().to_rfc3339(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health", get(health_check))
}
