use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let name = body
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::invalid_argument("name is required"))?;

    let created_at = chrono::Utc::now().to_rfc3339();
    state.store.lock().snapshot_create(name, created_at);
    Ok(Json(json!({ "success": true, "name": name })))
}

pub async fn list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshots = state.store.lock().snapshot_list();
    Json(json!({ "success": true, "snapshots": snapshots }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store.lock();
    let snapshot = store.snapshot_get(&name)?;
    Ok(Json(json!({
        "success": true,
        "name": snapshot.name,
        "elements": snapshot.elements,
        "createdAt": snapshot.created_at,
    })))
}
