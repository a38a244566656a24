//! The Tool Gateway (C8): a single stateless JSON-RPC 2.0 endpoint exposing
//! the closed diagram-operation catalogue (spec §4.8). Grounded on the
//! `JsonRpcRequest`/`JsonRpcResponse`/`Tool` envelope shape used by the
//! canvas MCP server in the retrieval pack, adapted from its session-scoped
//! catalogue to this crate's Scene Store + Correlator + Broadcast Bus.

use axum::extract::State;
use axum::Json;
use base64::Engine;
use canvas_core::{normalize, Element, ElementDraft, SearchQuery};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::correlator::RequestKind;
use crate::error::ApiError;
use crate::mutate;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: serde_json::Value,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl JsonRpcResponse {
    fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: serde_json::Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

fn object_schema(properties: serde_json::Value, required: &[&str]) -> serde_json::Value {
    json!({ "type": "object", "properties": properties, "required": required })
}

/// The closed tool catalogue (spec §4.8).
fn tool_catalogue() -> Vec<Tool> {
    vec![
        Tool {
            name: "create_element",
            description: "Create a single diagram element.",
            input_schema: object_schema(json!({ "type": { "type": "string" } }), &["type"]),
        },
        Tool {
            name: "batch_create_elements",
            description: "Create a batch of elements, resolving arrow bindings within the batch.",
            input_schema: object_schema(json!({ "elements": { "type": "array" } }), &["elements"]),
        },
        Tool {
            name: "update_element",
            description: "Patch an existing element by id.",
            input_schema: object_schema(
                json!({ "id": { "type": "string" }, "updates": { "type": "object" } }),
                &["id", "updates"],
            ),
        },
        Tool {
            name: "delete_element",
            description: "Delete an element by id.",
            input_schema: object_schema(json!({ "id": { "type": "string" } }), &["id"]),
        },
        Tool {
            name: "clear_canvas",
            description: "Remove every element from the scene.",
            input_schema: object_schema(json!({}), &[]),
        },
        Tool {
            name: "duplicate_elements",
            description: "Deep-copy elements with new ids, shifted by an offset.",
            input_schema: object_schema(
                json!({ "ids": { "type": "array" }, "offsetX": { "type": "number" }, "offsetY": { "type": "number" } }),
                &["ids"],
            ),
        },
        Tool {
            name: "query_elements",
            description: "Run a composite filter over the live scene.",
            input_schema: object_schema(json!({ "type": { "type": "string" } }), &[]),
        },
        Tool {
            name: "get_element",
            description: "Fetch a single element by id.",
            input_schema: object_schema(json!({ "id": { "type": "string" } }), &["id"]),
        },
        Tool {
            name: "describe_scene",
            description: "Render a human-readable summary of the scene.",
            input_schema: object_schema(json!({}), &[]),
        },
        Tool {
            name: "group_elements",
            description: "Assign a shared group id to a set of elements.",
            input_schema: object_schema(json!({ "ids": { "type": "array" } }), &["ids"]),
        },
        Tool {
            name: "ungroup_elements",
            description: "Remove the most recent group id from a set of elements.",
            input_schema: object_schema(json!({ "ids": { "type": "array" } }), &["ids"]),
        },
        Tool {
            name: "lock_elements",
            description: "Lock a set of elements against further edits.",
            input_schema: object_schema(json!({ "ids": { "type": "array" } }), &["ids"]),
        },
        Tool {
            name: "unlock_elements",
            description: "Unlock a set of elements.",
            input_schema: object_schema(json!({ "ids": { "type": "array" } }), &["ids"]),
        },
        Tool {
            name: "align_elements",
            description: "Align a set of elements to a common edge or axis.",
            input_schema: object_schema(
                json!({ "ids": { "type": "array" }, "alignment": { "type": "string" } }),
                &["ids", "alignment"],
            ),
        },
        Tool {
            name: "distribute_elements",
            description: "Evenly space a set of elements between their outer bounds.",
            input_schema: object_schema(
                json!({ "ids": { "type": "array" }, "direction": { "type": "string" } }),
                &["ids", "direction"],
            ),
        },
        Tool {
            name: "snapshot_scene",
            description: "Create a named snapshot of the current scene.",
            input_schema: object_schema(json!({ "name": { "type": "string" } }), &["name"]),
        },
        Tool {
            name: "restore_snapshot",
            description: "Restore the scene from a named snapshot.",
            input_schema: object_schema(json!({ "name": { "type": "string" } }), &["name"]),
        },
        Tool {
            name: "import_scene",
            description: "Adopt a supplied scene, merging or replacing the live one.",
            input_schema: object_schema(
                json!({ "elements": { "type": "array" }, "mode": { "type": "string" } }),
                &["elements", "mode"],
            ),
        },
        Tool {
            name: "export_scene",
            description: "Dump the canonical scene as JSON.",
            input_schema: object_schema(json!({ "path": { "type": "string" } }), &[]),
        },
        Tool {
            name: "create_from_mermaid",
            description: "Convert a mermaid diagram into elements via the connected editor peer.",
            input_schema: object_schema(
                json!({ "mermaidDiagram": { "type": "string" } }),
                &["mermaidDiagram"],
            ),
        },
        Tool {
            name: "set_viewport",
            description: "Ask the connected editor peer to adjust its viewport.",
            input_schema: object_schema(json!({}), &[]),
        },
        Tool {
            name: "export_to_image",
            description: "Render the scene to an image via the connected editor peer.",
            input_schema: object_schema(json!({ "format": { "type": "string" } }), &["format"]),
        },
        Tool {
            name: "get_canvas_screenshot",
            description: "Capture a screenshot of the live canvas via the connected editor peer.",
            input_schema: object_schema(json!({}), &[]),
        },
        Tool {
            name: "get_resource",
            description: "Fetch a read-only projection: scene, elements, theme, or library.",
            input_schema: object_schema(json!({ "resource": { "type": "string" } }), &["resource"]),
        },
        Tool {
            name: "read_diagram_guide",
            description: "Return a static design guide for diagram authoring.",
            input_schema: object_schema(json!({}), &[]),
        },
        Tool {
            name: "export_to_excalidraw_url",
            description: "Encode the scene into a shareable URL fragment.",
            input_schema: object_schema(json!({}), &[]),
        },
    ]
}

pub async fn mcp_handler(
    State(state): State<AppState>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    let response = match request.method.as_str() {
        "tools/list" => {
            JsonRpcResponse::success(request.id, json!({ "tools": tool_catalogue() }))
        }
        "tools/call" => handle_tools_call(&state, request.id, request.params).await,
        other => JsonRpcResponse::error(request.id, -32601, format!("method not found: {other}")),
    };
    Json(response)
}

async fn handle_tools_call(
    state: &AppState,
    id: serde_json::Value,
    params: serde_json::Value,
) -> JsonRpcResponse {
    let name = params.get("name").and_then(|v| v.as_str()).unwrap_or_default();
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    match dispatch(state, name, arguments).await {
        Ok(content) => JsonRpcResponse::success(id, json!({ "content": [content] })),
        Err(e) => JsonRpcResponse::error(id, -32000, format!("{e:?}")),
    }
}

fn text_content(value: serde_json::Value) -> serde_json::Value {
    let text = serde_json::to_string_pretty(&value).unwrap_or_default();
    json!({ "type": "text", "text": text })
}

async fn dispatch(
    state: &AppState,
    name: &str,
    args: serde_json::Value,
) -> Result<serde_json::Value, ApiError> {
    match name {
        "create_element" => {
            let draft: ElementDraft = parse(args)?;
            let element = {
                let mut store = state.store.lock();
                mutate::create_one(&mut store, draft)?
            };
            state.bus.broadcast(
                &json!({ "type": "element_created", "element": &element }),
                None,
            );
            crate::routes::legacy::broadcast_sync(state);
            Ok(text_content(json!({ "id": element.id })))
        }
        "batch_create_elements" => {
            let drafts: Vec<ElementDraft> = parse(args.get("elements").cloned().unwrap_or(json!([])))?;
            let elements = {
                let mut store = state.store.lock();
                mutate::create_batch(&mut store, drafts)?
            };
            state.bus.broadcast(
                &json!({ "type": "elements_batch_created", "elements": &elements }),
                None,
            );
            crate::routes::legacy::broadcast_sync(state);
            Ok(text_content(json!({ "count": elements.len(), "elements": elements })))
        }
        "update_element" => {
            let id = required_str(&args, "id")?;
            let updates = args.get("updates").cloned().unwrap_or(json!({}));
            let element = state.store.lock().patch(id, updates)?;
            state.bus.broadcast(
                &json!({ "type": "element_updated", "element": &element }),
                None,
            );
            crate::routes::legacy::broadcast_sync(state);
            Ok(text_content(serde_json::to_value(element).unwrap()))
        }
        "delete_element" => {
            let id = required_str(&args, "id")?;
            let removed = state.store.lock().delete(id);
            if !removed {
                return Err(ApiError::not_found(format!("element not found: {id}")));
            }
            state
                .bus
                .broadcast(&json!({ "type": "element_deleted", "id": id }), None);
            crate::routes::legacy::broadcast_sync(state);
            Ok(text_content(json!({ "deleted": true })))
        }
        "clear_canvas" => {
            state.store.lock().clear();
            state.bus.broadcast(&json!({ "type": "canvas_cleared" }), None);
            crate::routes::legacy::broadcast_sync(state);
            Ok(text_content(json!({ "cleared": true })))
        }
        "duplicate_elements" => duplicate_elements(state, args),
        "query_elements" => query_elements(state, args),
        "get_element" => {
            let id = required_str(&args, "id")?;
            let store = state.store.lock();
            let element = store.get(id)?.clone();
            Ok(text_content(serde_json::to_value(element).unwrap()))
        }
        "describe_scene" => describe_scene(state),
        "group_elements" => group_elements(state, args, true),
        "ungroup_elements" => group_elements(state, args, false),
        "lock_elements" => lock_elements(state, args, true),
        "unlock_elements" => lock_elements(state, args, false),
        "align_elements" => align_elements(state, args),
        "distribute_elements" => distribute_elements(state, args),
        "snapshot_scene" => {
            let name = required_str(&args, "name")?;
            let created_at = chrono::Utc::now().to_rfc3339();
            state.store.lock().snapshot_create(name, created_at);
            Ok(text_content(json!({ "name": name })))
        }
        "restore_snapshot" => {
            let name = required_str(&args, "name")?;
            state.store.lock().snapshot_restore(name)?;
            crate::routes::legacy::broadcast_sync(state);
            Ok(text_content(json!({ "restored": name })))
        }
        "import_scene" => import_scene(state, args),
        "export_scene" => export_scene(state, args).await,
        "create_from_mermaid" => correlated_mermaid(state, args).await,
        "set_viewport" => correlated_viewport(state, args).await,
        "export_to_image" | "get_canvas_screenshot" => correlated_export_image(state, args, name).await,
        "get_resource" => get_resource(state, args),
        "read_diagram_guide" => Ok(text_content(json!({ "guide": DIAGRAM_GUIDE }))),
        "export_to_excalidraw_url" => export_to_excalidraw_url(state),
        other => Err(ApiError::invalid_argument(format!("unknown tool: {other}"))),
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::invalid_argument(e.to_string()))
}

fn required_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str, ApiError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ApiError::invalid_argument(format!("{key} is required")))
}

fn required_ids(args: &serde_json::Value) -> Result<Vec<String>, ApiError> {
    let ids: Vec<String> = args
        .get("ids")
        .cloned()
        .ok_or_else(|| ApiError::invalid_argument("ids is required"))
        .and_then(|v| serde_json::from_value(v).map_err(|e| ApiError::invalid_argument(e.to_string())))?;
    if ids.is_empty() {
        return Err(ApiError::invalid_argument("ids must not be empty"));
    }
    Ok(ids)
}

fn duplicate_elements(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let ids = required_ids(&args)?;
    let offset_x = args.get("offsetX").and_then(|v| v.as_f64()).unwrap_or(20.0);
    let offset_y = args.get("offsetY").and_then(|v| v.as_f64()).unwrap_or(20.0);

    let mut store = state.store.lock();
    let mut duplicates = Vec::new();
    for id in &ids {
        let source = store.get(id)?.clone();
        let mut draft = draft_from_element(&source);
        draft.id = None;
        draft.x = Some(source.x + offset_x);
        draft.y = Some(source.y + offset_y);
        let element = normalize::normalize(draft)?;
        duplicates.push(store.put(element));
    }
    drop(store);
    crate::routes::legacy::broadcast_sync(state);
    Ok(text_content(json!({ "count": duplicates.len(), "elements": duplicates })))
}

fn draft_from_element(element: &Element) -> ElementDraft {
    let mut value = serde_json::to_value(element).unwrap_or(json!({}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("version");
        obj.remove("versionNonce");
        obj.remove("updated");
        obj.remove("createdAt");
        obj.remove("updatedAt");
    }
    serde_json::from_value(value).unwrap_or_default()
}

fn query_elements(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let mut query = SearchQuery::default();
    if let Some(t) = args.get("type").and_then(|v| v.as_str()) {
        query.types.push(t.to_string());
    }
    if let Some(arr) = args.get("types").and_then(|v| v.as_array()) {
        query
            .types
            .extend(arr.iter().filter_map(|v| v.as_str()).map(str::to_string));
    }
    query.min_width = args.get("minWidth").and_then(|v| v.as_f64());
    query.max_width = args.get("maxWidth").and_then(|v| v.as_f64());
    query.min_height = args.get("minHeight").and_then(|v| v.as_f64());
    query.max_height = args.get("maxHeight").and_then(|v| v.as_f64());
    query.text_contains = args.get("textContains").and_then(|v| v.as_str()).map(str::to_string);

    let store = state.store.lock();
    let matches: Vec<_> = store.search(&query).into_iter().cloned().collect();
    Ok(text_content(json!({ "count": matches.len(), "elements": matches })))
}

fn describe_scene(state: &AppState) -> Result<serde_json::Value, ApiError> {
    let store = state.store.lock();
    let elements = store.list();
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for element in elements {
        *counts.entry(element.element_type.as_str()).or_default() += 1;
    }
    let summary = format!(
        "{} element(s): {}",
        elements.len(),
        counts
            .iter()
            .map(|(ty, n)| format!("{n} {ty}"))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(text_content(json!({ "summary": summary })))
}

fn group_elements(state: &AppState, args: serde_json::Value, group: bool) -> Result<serde_json::Value, ApiError> {
    let ids = required_ids(&args)?;
    let group_id = normalize::generate_id();
    let mut store = state.store.lock();
    for id in &ids {
        let mut group_ids = store.get(id)?.group_ids.clone();
        if group {
            group_ids.push(group_id.clone());
        } else {
            group_ids.pop();
        }
        store.patch(id, json!({ "groupIds": group_ids }))?;
    }
    drop(store);
    crate::routes::legacy::broadcast_sync(state);
    Ok(text_content(json!({ "ids": ids, "grouped": group })))
}

fn lock_elements(state: &AppState, args: serde_json::Value, locked: bool) -> Result<serde_json::Value, ApiError> {
    let ids = required_ids(&args)?;
    let mut store = state.store.lock();
    for id in &ids {
        store.patch(id, json!({ "locked": locked }))?;
    }
    drop(store);
    crate::routes::legacy::broadcast_sync(state);
    Ok(text_content(json!({ "ids": ids, "locked": locked })))
}

/// Reference point for `center`/`middle` is the bounding-box midpoint of
/// the selection (Open Question decision, see DESIGN.md).
fn align_elements(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let ids = required_ids(&args)?;
    let alignment = required_str(&args, "alignment")?.to_string();

    let mut store = state.store.lock();
    let selected: Vec<Element> = ids
        .iter()
        .map(|id| store.get(id).cloned())
        .collect::<Result<_, _>>()?;

    let min_x = selected.iter().map(|e| e.x).fold(f64::INFINITY, f64::min);
    let max_x = selected
        .iter()
        .map(|e| e.x + e.width)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_y = selected.iter().map(|e| e.y).fold(f64::INFINITY, f64::min);
    let max_y = selected
        .iter()
        .map(|e| e.y + e.height)
        .fold(f64::NEG_INFINITY, f64::max);
    let mid_x = (min_x + max_x) / 2.0;
    let mid_y = (min_y + max_y) / 2.0;

    for id in &ids {
        let element = store.get(id)?;
        let patch = match alignment.as_str() {
            "left" => json!({ "x": min_x }),
            "right" => json!({ "x": max_x - element.width }),
            "top" => json!({ "y": min_y }),
            "bottom" => json!({ "y": max_y - element.height }),
            "center" => json!({ "x": mid_x - element.width / 2.0 }),
            "middle" => json!({ "y": mid_y - element.height / 2.0 }),
            other => return Err(ApiError::invalid_argument(format!("unknown alignment: {other}"))),
        };
        store.patch(id, patch)?;
    }
    drop(store);
    crate::routes::legacy::broadcast_sync(state);
    Ok(text_content(json!({ "ids": ids, "alignment": alignment })))
}

fn distribute_elements(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let ids = required_ids(&args)?;
    let direction = required_str(&args, "direction")?.to_string();
    if ids.len() < 3 {
        return Err(ApiError::invalid_argument("distribute_elements needs at least 3 elements"));
    }

    let mut store = state.store.lock();
    let mut selected: Vec<Element> = ids
        .iter()
        .map(|id| store.get(id).cloned())
        .collect::<Result<_, _>>()?;

    match direction.as_str() {
        "horizontal" => selected.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap()),
        "vertical" => selected.sort_by(|a, b| a.y.partial_cmp(&b.y).unwrap()),
        other => return Err(ApiError::invalid_argument(format!("unknown direction: {other}"))),
    }

    let first = selected.first().unwrap();
    let last = selected.last().unwrap();
    let (start, end) = match direction.as_str() {
        "horizontal" => (first.x, last.x + last.width),
        _ => (first.y, last.y + last.height),
    };
    let total_size: f64 = match direction.as_str() {
        "horizontal" => selected.iter().map(|e| e.width).sum(),
        _ => selected.iter().map(|e| e.height).sum(),
    };
    let gap = ((end - start) - total_size) / (selected.len() as f64 - 1.0);

    let mut cursor = start;
    for element in &selected {
        let patch = match direction.as_str() {
            "horizontal" => json!({ "x": cursor }),
            _ => json!({ "y": cursor }),
        };
        store.patch(&element.id, patch)?;
        cursor += match direction.as_str() {
            "horizontal" => element.width + gap,
            _ => element.height + gap,
        };
    }
    drop(store);
    crate::routes::legacy::broadcast_sync(state);
    Ok(text_content(json!({ "ids": ids, "direction": direction })))
}

fn import_scene(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let drafts: Vec<ElementDraft> = parse(args.get("elements").cloned().unwrap_or(json!([])))?;
    let mode = required_str(&args, "mode")?;

    let elements = match mode {
        "replace" => {
            let elements = mutate::normalize_full_sync(drafts)?;
            state.store.lock().replace(elements.clone());
            elements
        }
        "merge" => {
            let mut store = state.store.lock();
            mutate::create_batch(&mut store, drafts)?
        }
        other => return Err(ApiError::invalid_argument(format!("unknown import mode: {other}"))),
    };
    crate::routes::legacy::broadcast_sync(state);
    Ok(text_content(json!({ "mode": mode, "count": elements.len() })))
}

async fn export_scene(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let scene = state.store.lock().scene();
    let scene_json = serde_json::to_value(&scene).unwrap();

    if let Some(path) = args.get("path").and_then(|v| v.as_str()) {
        tokio::fs::write(path, serde_json::to_vec_pretty(&scene_json).unwrap())
            .await
            .map_err(|e| ApiError::internal(format!("failed to write {path}: {e}")))?;
        return Ok(text_content(json!({ "path": path, "elementCount": scene.elements.len() })));
    }
    Ok(text_content(scene_json))
}

async fn correlated_mermaid(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    if state.bus.count() == 0 {
        return Err(ApiError::unavailable("frontend client not connected"));
    }
    let mermaid_diagram = required_str(&args, "mermaidDiagram")?;
    let (id, rx) = state.correlator.issue(RequestKind::Mermaid);
    state.bus.broadcast(
        &json!({ "type": "mermaid_convert", "requestId": &id, "mermaidDiagram": mermaid_diagram }),
        None,
    );
    let payload = state.correlator.wait(&id, RequestKind::Mermaid, rx).await?;
    Ok(text_content(payload))
}

async fn correlated_viewport(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    if state.bus.count() == 0 {
        return Err(ApiError::unavailable("frontend client not connected"));
    }
    let (id, rx) = state.correlator.issue(RequestKind::Viewport);
    state
        .bus
        .broadcast(&json!({ "type": "set_viewport", "requestId": &id, "params": args }), None);
    let payload = state.correlator.wait(&id, RequestKind::Viewport, rx).await?;
    Ok(text_content(payload))
}

async fn correlated_export_image(
    state: &AppState,
    args: serde_json::Value,
    tool_name: &str,
) -> Result<serde_json::Value, ApiError> {
    if state.bus.count() == 0 {
        return Err(ApiError::unavailable("frontend client not connected"));
    }
    let format = args.get("format").and_then(|v| v.as_str()).unwrap_or("png").to_string();
    let (id, rx) = state.correlator.issue(RequestKind::ExportImage);
    state.bus.broadcast(
        &json!({ "type": "export_image_request", "requestId": &id, "format": &format }),
        None,
    );
    let payload = state.correlator.wait(&id, RequestKind::ExportImage, rx).await?;

    if tool_name == "get_canvas_screenshot" {
        let data = payload.get("data").and_then(|v| v.as_str()).unwrap_or("");
        return Ok(json!({ "type": "image", "data": data, "mimeType": "image/png" }));
    }
    Ok(text_content(payload))
}

fn get_resource(state: &AppState, args: serde_json::Value) -> Result<serde_json::Value, ApiError> {
    let resource = required_str(&args, "resource")?;
    let store = state.store.lock();
    match resource {
        "scene" => Ok(text_content(serde_json::to_value(store.scene()).unwrap())),
        "elements" => Ok(text_content(json!({ "elements": store.list() }))),
        "theme" => Ok(text_content(json!({
            "strokeColor": "#1e1e2e",
            "backgroundColor": "transparent",
            "fillStyle": "hachure",
            "strokeWidth": 2,
            "strokeStyle": "solid",
            "roughness": 1,
            "opacity": 100,
        }))),
        "library" => Ok(text_content(json!({ "items": [] }))),
        other => Err(ApiError::invalid_argument(format!("unknown resource: {other}"))),
    }
}

const DIAGRAM_GUIDE: &str = "\
Prefer rectangles for processes, diamonds for decisions, and ellipses for \
start/end states. Keep arrow endpoints bound to shapes rather than free \
points so the diagram stays coherent under manual edits.";

fn export_to_excalidraw_url(state: &AppState) -> Result<serde_json::Value, ApiError> {
    let scene = state.store.lock().scene();
    let encoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&scene).unwrap());
    Ok(text_content(json!({ "url": format!("excalidraw://#scene={encoded}") })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_closed_and_named() {
        let tools = tool_catalogue();
        assert!(tools.iter().any(|t| t.name == "create_element"));
        assert!(tools.iter().any(|t| t.name == "get_resource"));
        assert_eq!(tools.len(), 26);
    }
}
