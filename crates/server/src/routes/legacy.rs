//! The legacy, pre-`/api` surface. Kept verbatim for backward compatibility
//! (spec §4.6): responses here are NOT wrapped in the `{success, ...}`
//! envelope the primary surface uses.

use axum::extract::{Path, State};
use axum::Json;
use canvas_core::ElementDraft;
use serde_json::json;

use crate::error::ApiError;
use crate::mutate;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "clients": state.bus.count(),
        "pendingRequests": state.correlator.pending_count(),
        "supervisor": format!("{:?}", state.supervisor.state()).to_lowercase(),
    }))
}

pub async fn get_canvas(State(state): State<AppState>) -> Json<serde_json::Value> {
    let scene = state.store.lock().scene();
    Json(serde_json::to_value(scene).unwrap())
}

pub async fn post_canvas(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let elements = body
        .get("elements")
        .cloned()
        .ok_or_else(|| ApiError::invalid_argument("body must carry an 'elements' array"))?;
    let drafts: Vec<ElementDraft> = serde_json::from_value(elements)
        .map_err(|e| ApiError::invalid_argument(format!("malformed elements: {e}")))?;
    let elements = mutate::normalize_full_sync(drafts)?;

    let scene = {
        let mut store = state.store.lock();
        store.replace(elements);
        store.scene()
    };
    state
        .bus
        .broadcast(&json!({ "type": "canvas_sync", "data": &scene }), None);
    Ok(Json(serde_json::to_value(scene).unwrap()))
}

pub async fn list_elements(State(state): State<AppState>) -> Json<serde_json::Value> {
    let elements = state.store.lock().list().to_vec();
    Json(serde_json::to_value(elements).unwrap())
}

pub async fn create_element(
    State(state): State<AppState>,
    Json(draft): Json<ElementDraft>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let element = {
        let mut store = state.store.lock();
        mutate::create_one(&mut store, draft)?
    };
    state.bus.broadcast(
        &json!({ "type": "element_created", "element": &element }),
        None,
    );
    broadcast_sync(&state);
    Ok(Json(serde_json::to_value(element).unwrap()))
}

pub async fn get_element(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store.lock();
    let element = store.get(&id)?.clone();
    Ok(Json(serde_json::to_value(element).unwrap()))
}

pub async fn update_element(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(delta): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let element = state.store.lock().patch(&id, delta)?;
    state.bus.broadcast(
        &json!({ "type": "element_updated", "element": &element }),
        None,
    );
    broadcast_sync(&state);
    Ok(Json(serde_json::to_value(element).unwrap()))
}

pub async fn delete_element(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let removed = state.store.lock().delete(&id);
    if removed {
        state
            .bus
            .broadcast(&json!({ "type": "element_deleted", "id": &id }), None);
        broadcast_sync(&state);
    }
    Json(json!({ "deleted": removed }))
}

pub async fn clear(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.store.lock().clear();
    state.bus.broadcast(&json!({ "type": "canvas_cleared" }), None);
    broadcast_sync(&state);
    Json(json!({ "cleared": true }))
}

pub async fn snapshot(State(state): State<AppState>) -> Json<serde_json::Value> {
    let scene = state.store.lock().scene();
    Json(serde_json::to_value(scene).unwrap())
}

/// Every mutation ends in a `canvas_sync` broadcast (Invariant 5).
pub(crate) fn broadcast_sync(state: &AppState) {
    let scene = state.store.lock().scene();
    state
        .bus
        .broadcast(&json!({ "type": "canvas_sync", "data": scene }), None);
}
