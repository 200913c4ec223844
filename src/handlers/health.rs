//! # Health Check Handler
//!
//! Liveness endpoint for load balancers and uptime monitors. It does not touch
//! the session provider, so a provider outage never marks the portal unhealthy.

use axum::Json;
use serde_json::{json, Value};

/// Health check endpoint
///
/// ## Route
/// GET /health
///
/// ## Response
/// ```json
/// {
///   "status": "healthy",
///   "service": "choir-portal"
/// }
/// ```
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "choir-portal"
    }))
}
