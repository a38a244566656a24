//! The correlated endpoints (spec §4.5/§4.6): each blocks an HTTP caller on
//! an out-of-band WebSocket peer response, bridged through the Correlator.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::correlator::RequestKind;
use crate::error::ApiError;
use crate::state::AppState;

fn require_peer(state: &AppState) -> Result<(), ApiError> {
    if state.bus.count() == 0 {
        return Err(ApiError::unavailable(
            "frontend client not connected".to_string(),
        ));
    }
    Ok(())
}

pub async fn from_mermaid(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_peer(&state)?;
    let (id, rx) = state.correlator.issue(RequestKind::Mermaid);
    state.bus.broadcast(
        &json!({
            "type": "mermaid_convert",
            "requestId": &id,
            "mermaidDiagram": body.get("mermaidDiagram"),
            "config": body.get("config"),
        }),
        None,
    );
    let payload = state.correlator.wait(&id, RequestKind::Mermaid, rx).await?;
    let elements = payload.get("elements").cloned().unwrap_or(json!([]));
    let count = elements.as_array().map(|a| a.len()).unwrap_or(0);
    Ok(Json(json!({ "success": true, "elements": elements, "count": count })))
}

pub async fn from_mermaid_result(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = body
        .get("requestId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::invalid_argument("requestId is required"))?;

    if let Some(err) = body.get("error").and_then(|v| v.as_str()) {
        state.correlator.fail(request_id, err.to_string());
    } else {
        let elements = body.get("elements").cloned().unwrap_or(json!([]));
        state.correlator.resolve(request_id, json!({ "elements": elements }));
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn export_image(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let format = body
        .get("format")
        .and_then(|v| v.as_str())
        .filter(|f| *f == "png" || *f == "svg")
        .ok_or_else(|| ApiError::invalid_argument("format must be 'png' or 'svg'"))?
        .to_string();
    require_peer(&state)?;

    let (id, rx) = state.correlator.issue(RequestKind::ExportImage);
    state.bus.broadcast(
        &json!({
            "type": "export_image_request",
            "requestId": &id,
            "format": &format,
            "background": body.get("background"),
        }),
        None,
    );
    let payload = state
        .correlator
        .wait(&id, RequestKind::ExportImage, rx)
        .await?;
    Ok(Json(json!({
        "success": true,
        "format": payload.get("format").cloned().unwrap_or(json!(format)),
        "data": payload.get("data").cloned().unwrap_or(json!("")),
    })))
}

pub async fn export_image_result(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = body
        .get("requestId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::invalid_argument("requestId is required"))?;

    if let Some(err) = body.get("error").and_then(|v| v.as_str()) {
        state.correlator.fail(request_id, err.to_string());
    } else {
        let format = body.get("format").cloned().unwrap_or(json!(""));
        let data = body.get("data").cloned().unwrap_or(json!(""));
        state
            .correlator
            .resolve(request_id, json!({ "format": format, "data": data }));
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn viewport(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_peer(&state)?;
    let (id, rx) = state.correlator.issue(RequestKind::Viewport);
    state.bus.broadcast(
        &json!({
            "type": "set_viewport",
            "requestId": &id,
            "scrollToContent": body.get("scrollToContent"),
            "scrollToElementId": body.get("scrollToElementId"),
            "zoom": body.get("zoom"),
            "offsetX": body.get("offsetX"),
            "offsetY": body.get("offsetY"),
        }),
        None,
    );
    let payload = state.correlator.wait(&id, RequestKind::Viewport, rx).await?;
    Ok(Json(json!({
        "success": true,
        "message": payload.get("message").cloned().unwrap_or(json!(null)),
    })))
}

pub async fn viewport_result(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = body
        .get("requestId")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::invalid_argument("requestId is required"))?;

    if let Some(err) = body.get("error").and_then(|v| v.as_str()) {
        state.correlator.fail(request_id, err.to_string());
    } else {
        let message = body.get("message").cloned().unwrap_or(json!(null));
        state
            .correlator
            .resolve(request_id, json!({ "message": message }));
    }
    Ok(Json(json!({ "success": true })))
}
