//! Health check endpoint.

use axum::{Json, response::IntoResponse};
use serde_json::json;

/// Liveness check.
///
/// Always returns a fixed body; deliberately outside the authentication
/// and authorization pipeline so probes work without credentials.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
