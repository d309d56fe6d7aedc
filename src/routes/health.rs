use crate::config::StorageMode;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let storage = match state.config.storage_mode {
        StorageMode::Postgres => "postgres",
        StorageMode::Memory => "memory",
    };
    (StatusCode::OK, Json(json!({ "status": "ok", "storage": storage })))
}
