use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use canvas_core::ElementDraft;
use futures::{SinkExt, StreamExt};

use crate::mutate;
use crate::state::AppState;

/// WebSocket Facade (C7): upgrades the connection and delegates attach/detach
/// bookkeeping to the Broadcast Bus.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (peer_id, mut outbox) = state.bus.attach();

    let forward_task = tokio::spawn(async move {
        while let Some(msg) = outbox.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    send_initial_frames(&state, peer_id);

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                    handle_inbound(&state, peer_id, value);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.bus.detach(peer_id);
    forward_task.abort();
}

fn send_initial_frames(state: &AppState, peer_id: crate::broadcast::PeerId) {
    let scene = state.store.lock().scene();
    state.bus.send_to(
        peer_id,
        &serde_json::json!({ "type": "initial_elements", "elements": scene.elements }),
    );
    state.bus.send_to(
        peer_id,
        &serde_json::json!({ "type": "sync_status", "connected": true }),
    );
    state
        .bus
        .send_to(peer_id, &serde_json::json!({ "type": "canvas_sync", "data": scene }));
}

/// Apply an inbound mutation to the store, then re-broadcast it to every
/// other peer (echo suppression, spec §4.7/§5).
fn handle_inbound(state: &AppState, sender: crate::broadcast::PeerId, value: serde_json::Value) {
    let Some(tag) = value.get("type").and_then(|t| t.as_str()) else {
        return;
    };

    match tag {
        "canvas_sync" => {
            let Some(elements) = value.get("elements").cloned() else {
                return;
            };
            let Ok(drafts) = serde_json::from_value::<Vec<ElementDraft>>(elements) else {
                tracing::warn!("inbound canvas_sync carried malformed elements; ignoring");
                return;
            };
            match mutate::normalize_full_sync(drafts) {
                Ok(elements) => {
                    let mut store = state.store.lock();
                    store.replace(elements);
                    let scene = store.scene();
                    drop(store);
                    state.bus.broadcast(
                        &serde_json::json!({ "type": "canvas_sync", "data": scene }),
                        Some(sender),
                    );
                }
                Err(e) => tracing::warn!("inbound canvas_sync rejected: {e:?}"),
            }
        }
        "element_created" => {
            let Some(draft_json) = value.get("element").cloned() else {
                return;
            };
            let Ok(draft) = serde_json::from_value::<ElementDraft>(draft_json) else {
                return;
            };
            let mut store = state.store.lock();
            match mutate::create_one(&mut store, draft) {
                Ok(element) => {
                    drop(store);
                    state.bus.broadcast(
                        &serde_json::json!({ "type": "element_created", "element": element }),
                        Some(sender),
                    );
                }
                Err(e) => tracing::warn!("inbound element_created rejected: {e:?}"),
            }
        }
        "element_updated" => {
            let (Some(id), Some(updates)) = (
                value.get("id").and_then(|v| v.as_str()),
                value.get("updates").cloned(),
            ) else {
                return;
            };
            let mut store = state.store.lock();
            match store.patch(id, updates) {
                Ok(element) => {
                    drop(store);
                    state.bus.broadcast(
                        &serde_json::json!({ "type": "element_updated", "element": element }),
                        Some(sender),
                    );
                }
                Err(e) => tracing::debug!("inbound element_updated for unknown id: {e}"),
            }
        }
        "element_deleted" => {
            let Some(id) = value.get("id").and_then(|v| v.as_str()) else {
                return;
            };
            let removed = state.store.lock().delete(id);
            if removed {
                state.bus.broadcast(
                    &serde_json::json!({ "type": "element_deleted", "id": id }),
                    Some(sender),
                );
            }
        }
        _ => {
            tracing::debug!(tag, "ignoring unsupported inbound frame tag");
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    use crate::state::AppState;

    /// Spec §8 boundary scenario 3: an HTTP caller blocks on
    /// `/api/elements/from-mermaid`, a real WebSocket peer observes the
    /// broadcasted `mermaid_convert` request and answers it via
    /// `/api/elements/from-mermaid/result`, and the original caller's
    /// response carries the converted elements.
    #[tokio::test]
    async fn correlated_mermaid_round_trip_via_real_websocket_peer() {
        let state = AppState::new(0);
        let app = crate::routes::router()
            .route("/ws", axum::routing::get(super::ws_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let (ws_stream, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .unwrap();
        let (_ws_write, mut ws_read) = ws_stream.split();

        // Drain the three initial-sync frames sent on attach.
        for _ in 0..3 {
            ws_read.next().await.unwrap().unwrap();
        }

        let http = reqwest::Client::new();
        let convert = tokio::spawn({
            let http = http.clone();
            async move {
                http.post(format!("http://{addr}/api/elements/from-mermaid"))
                    .json(&serde_json::json!({ "mermaidDiagram": "graph TD; A-->B;" }))
                    .send()
                    .await
                    .unwrap()
                    .json::<serde_json::Value>()
                    .await
                    .unwrap()
            }
        });

        let request_id = loop {
            let msg = ws_read.next().await.unwrap().unwrap();
            if let WsMessage::Text(text) = msg {
                let value: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                if value["type"] == "mermaid_convert" {
                    break value["requestId"].as_str().unwrap().to_string();
                }
            }
        };

        http.post(format!("http://{addr}/api/elements/from-mermaid/result"))
            .json(&serde_json::json!({
                "requestId": request_id,
                "elements": [
                    { "type": "rectangle", "x": 0, "y": 0, "width": 100, "height": 50 },
                ],
            }))
            .send()
            .await
            .unwrap();

        let response = convert.await.unwrap();
        assert_eq!(response["success"], true);
        assert_eq!(response["elements"].as_array().unwrap().len(), 1);
    }
}
