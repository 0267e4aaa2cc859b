use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub mod auth;
pub mod dashboard;
pub mod resources;
pub mod uploads;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
