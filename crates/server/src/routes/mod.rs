pub mod correlated;
pub mod elements;
pub mod legacy;
pub mod mcp;
pub mod snapshots;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Assembles the full HTTP surface: legacy verbatim routes, the primary
/// `/api/...` surface, the correlated endpoints, and the Tool Gateway.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(legacy::health))
        .route("/canvas", get(legacy::get_canvas).post(legacy::post_canvas))
        .route("/elements", get(legacy::list_elements).post(legacy::create_element))
        .route(
            "/elements/{id}",
            get(legacy::get_element)
                .put(legacy::update_element)
                .delete(legacy::delete_element),
        )
        .route("/clear", post(legacy::clear))
        .route("/snapshot", get(legacy::snapshot))
        .route("/mcp", post(mcp::mcp_handler))
        .nest("/api", api_router())
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/elements", get(elements::list).post(elements::create))
        .route("/elements/search", get(elements::search))
        .route("/elements/batch", post(elements::batch))
        .route("/elements/sync", post(elements::sync))
        .route("/elements/clear", delete(elements::clear))
        .route(
            "/elements/{id}",
            get(elements::get).put(elements::update).delete(elements::remove),
        )
        .route("/elements/from-mermaid", post(correlated::from_mermaid))
        .route(
            "/elements/from-mermaid/result",
            post(correlated::from_mermaid_result),
        )
        .route("/export/image", post(correlated::export_image))
        .route("/export/image/result", post(correlated::export_image_result))
        .route("/viewport", post(correlated::viewport))
        .route("/viewport/result", post(correlated::viewport_result))
        .route("/snapshots", post(snapshots::create).get(snapshots::list))
        .route("/snapshots/{name}", get(snapshots::get))
        .route("/sync/status", get(elements::sync_status))
}

/// Boundary-scenario tests (spec §8) exercised end-to-end through the real
/// axum `Router`, the way the teacher's own handler tests call into its
/// router rather than unit-testing handlers in isolation.
#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::state::AppState;

    fn app() -> axum::Router {
        super::router().with_state(AppState::new(0))
    }

    async fn call(app: &axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn arrow_binding_batch_resolves_and_clears_endpoints() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/elements/batch",
            json!({ "elements": [
                { "id": "A", "type": "rectangle", "x": 0, "y": 0, "width": 100, "height": 50 },
                { "id": "B", "type": "rectangle", "x": 300, "y": 0, "width": 100, "height": 50 },
                { "type": "arrow", "x": 0, "y": 0, "start": { "id": "A" }, "end": { "id": "B" } },
            ] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let elements = body["elements"].as_array().unwrap();
        let arrow = elements.iter().find(|e| e["type"] == "arrow").unwrap();
        assert_eq!(arrow["startBinding"]["elementId"], "A");
        assert_eq!(arrow["endBinding"]["elementId"], "B");
        assert_eq!(arrow["points"].as_array().unwrap().len(), 2);
        assert!(arrow.get("start").is_none());
        assert!(arrow.get("end").is_none());
    }

    #[tokio::test]
    async fn search_composite_filter_matches_single_element() {
        let app = app();
        let seeds = [
            json!({ "type": "rectangle", "width": 200, "strokeColor": "#ff0000" }),
            json!({ "type": "rectangle", "width": 50, "strokeColor": "#ff0000" }),
            json!({ "type": "ellipse", "width": 200, "strokeColor": "#ff0000" }),
            json!({ "type": "rectangle", "width": 200, "strokeColor": "#00ff00" }),
            json!({ "type": "text", "text": "hello" }),
        ];
        for seed in seeds {
            let (status, _) = call(&app, "POST", "/api/elements", seed).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = call(
            &app,
            "GET",
            "/api/elements/search?type=rectangle&strokeColor=%23ff0000&minWidth=100",
            Value::Null,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["elements"][0]["width"], 200.0);
    }

    #[tokio::test]
    async fn correlated_export_image_with_no_peer_is_503() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/export/image",
            json!({ "format": "png" }),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("not connected"));
    }

    #[tokio::test]
    async fn late_correlated_result_is_accepted_as_200() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/export/image/result",
            json!({ "requestId": "ghost", "format": "png", "data": "" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn patch_without_angle_preserves_existing_angle() {
        let app = app();
        let (status, created) = call(
            &app,
            "POST",
            "/api/elements",
            json!({ "type": "rectangle", "x": 0, "y": 0, "width": 100, "height": 50 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["element"]["id"].as_str().unwrap();
        assert_eq!(created["element"]["angle"], 0.0);

        let (status, updated) = call(
            &app,
            "PUT",
            &format!("/api/elements/{id}"),
            json!({ "x": 200 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["element"]["angle"], 0.0);
        assert_eq!(updated["element"]["x"], 200.0);
    }
}
