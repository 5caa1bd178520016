//! Liveness endpoints.

use axum::{response::IntoResponse, Json};

/// Plain-text liveness check.
pub async fn index() -> impl IntoResponse {
    "Ghostflow backend OK"
}

/// Health check endpoint for container orchestration.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
