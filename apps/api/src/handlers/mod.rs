//! HTTP handlers.

pub mod directory;
pub mod geo;
pub mod perm;

use axum::Json;
use serde_json::{Value, json};

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
