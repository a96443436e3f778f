//! Health check endpoint

use axum::Json;
use chrono::Utc;

use crate::api::types::HealthResponse;

/// GET /api/v1/health
///
/// Answers without authentication so load balancers can probe the hub.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
