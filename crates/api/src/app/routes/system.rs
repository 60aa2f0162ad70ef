use axum::{response::IntoResponse, Json};

pub async fn health() -> axum::response::Response {
    Json(serde_json::json!({"status": "ok"})).into_response()
}
