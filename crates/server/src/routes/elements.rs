//! The primary `/api/elements...` surface (spec §4.6): list/create/search/
//! batch/sync/get/update/delete, each wrapped in the `{success, ...}`
//! envelope and ending in a `canvas_sync` broadcast.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use canvas_core::{ElementDraft, SearchQuery};
use serde_json::json;

use crate::error::ApiError;
use crate::mutate;
use crate::routes::legacy::broadcast_sync;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> Json<serde_json::Value> {
    let elements = state.store.lock().list().to_vec();
    let count = elements.len();
    Json(json!({ "success": true, "elements": elements, "count": count }))
}

pub async fn create(
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
    Ok(Json(json!({ "success": true, "element": element })))
}

/// Conjunctive filter over the live scene (spec §4.6). Unknown query keys
/// that aren't recognized filter names are treated as arbitrary field
/// equality checks.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    const RESERVED: &[&str] = &[
        "type",
        "types",
        "minWidth",
        "maxWidth",
        "minHeight",
        "maxHeight",
        "textContains",
    ];

    let mut query = SearchQuery::default();
    if let Some(t) = params.get("type") {
        query.types.push(t.clone());
    }
    if let Some(ts) = params.get("types") {
        query.types.extend(ts.split(',').map(|s| s.to_string()));
    }
    query.min_width = params.get("minWidth").and_then(|v| v.parse().ok());
    query.max_width = params.get("maxWidth").and_then(|v| v.parse().ok());
    query.min_height = params.get("minHeight").and_then(|v| v.parse().ok());
    query.max_height = params.get("maxHeight").and_then(|v| v.parse().ok());
    query.text_contains = params.get("textContains").cloned();
    for (key, value) in params.iter() {
        if !RESERVED.contains(&key.as_str()) {
            query.field_equals.push((key.clone(), value.clone()));
        }
    }

    let store = state.store.lock();
    let matches: Vec<_> = store.search(&query).into_iter().cloned().collect();
    Json(json!({ "success": true, "elements": &matches, "count": matches.len() }))
}

pub async fn batch(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let drafts: Vec<ElementDraft> = body
        .get("elements")
        .cloned()
        .ok_or_else(|| ApiError::invalid_argument("body must carry an 'elements' array"))
        .and_then(|v| {
            serde_json::from_value(v).map_err(|e| ApiError::invalid_argument(e.to_string()))
        })?;

    let elements = {
        let mut store = state.store.lock();
        mutate::create_batch(&mut store, drafts)?
    };
    state.bus.broadcast(
        &json!({ "type": "elements_batch_created", "elements": &elements }),
        None,
    );
    broadcast_sync(&state);
    Ok(Json(json!({ "success": true, "elements": &elements, "count": elements.len() })))
}

pub async fn sync(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let drafts: Vec<ElementDraft> = body
        .get("elements")
        .cloned()
        .ok_or_else(|| ApiError::invalid_argument("body must carry an 'elements' array"))
        .and_then(|v| {
            serde_json::from_value(v).map_err(|e| ApiError::invalid_argument(e.to_string()))
        })?;

    let elements = mutate::normalize_full_sync(drafts)?;
    let after_count = elements.len();
    let before_count = {
        let mut store = state.store.lock();
        let before = store.list().len();
        store.replace(elements);
        before
    };

    let synced_at = chrono::Utc::now().to_rfc3339();
    state.bus.broadcast(
        &json!({ "type": "elements_synced", "beforeCount": before_count, "afterCount": after_count }),
        None,
    );
    broadcast_sync(&state);
    Ok(Json(json!({
        "success": true,
        "beforeCount": before_count,
        "afterCount": after_count,
        "syncedAt": synced_at,
    })))
}

pub async fn clear(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.store.lock().clear();
    state.bus.broadcast(&json!({ "type": "canvas_cleared" }), None);
    broadcast_sync(&state);
    Json(json!({ "success": true }))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.store.lock();
    let element = store.get(&id)?.clone();
    Ok(Json(json!({ "success": true, "element": element })))
}

pub async fn update(
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
    Ok(Json(json!({ "success": true, "element": element })))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.store.lock().delete(&id);
    if !removed {
        return Err(ApiError::not_found(format!("element not found: {id}")));
    }
    state
        .bus
        .broadcast(&json!({ "type": "element_deleted", "id": &id }), None);
    broadcast_sync(&state);
    Ok(Json(json!({ "success": true, "deleted": true })))
}

pub async fn sync_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "clients": state.bus.count() }))
}
