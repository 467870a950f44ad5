use crate::types::HealthResponse;
use axum::Json;
use serde_json::{json, Value};

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn hello() -> Json<Value> {
    Json(json!({ "message": "Hello World" }))
}
