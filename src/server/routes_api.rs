//! Health and status routes.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::AppContext;

/// Version reported to clients; part of the wire contract, independent of
/// the crate version.
pub const API_VERSION: &str = "1.0";

pub fn api_routes() -> Router<AppContext> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Milliseconds since the Unix epoch.
    pub server_time: i64,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: API_VERSION,
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}
