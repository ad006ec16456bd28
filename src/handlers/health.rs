use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

/// Liveness of the exporter itself; the device is not contacted.
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
