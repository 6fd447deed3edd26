//! HTTP transport for the tool server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::dispatch::McpServer;

/// Router with `POST /`, `POST /mcp` and `GET /health`
pub fn router(server: McpServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", post(rpc))
        .route("/mcp", post(rpc))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(server))
}

/// Bind and serve until the process is stopped
pub async fn serve(server: McpServer, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, tools = server.tool_count(), "tool server listening");
    axum::serve(listener, router(server)).await
}

async fn rpc(State(server): State<Arc<McpServer>>, body: Bytes) -> impl IntoResponse {
    Json(server.handle_bytes(&body).await)
}

async fn health(State(server): State<Arc<McpServer>>) -> impl IntoResponse {
    Json(json!({"status": "ok", "tools": server.tool_count()}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property_search::{PropertySearchConfig, PropertySearchTool};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        let tool = PropertySearchTool::new(PropertySearchConfig::new("http://127.0.0.1:1"));
        router(McpServer::new().with_tool(Arc::new(tool)))
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_tools_list_over_http() {
        for uri in ["/", "/mcp"] {
            let (status, body) =
                post_json(app(), uri, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["result"]["tools"][0]["name"], "search_properties");
            assert_eq!(body["result"]["tools"][0]["inputSchema"]["required"][1], "state");
        }
    }

    #[tokio::test]
    async fn test_parse_error_over_http() {
        let (status, body) = post_json(app(), "/", "not json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32700);
        assert!(body["id"].is_null());
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"status": "ok", "tools": 1}));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/mcp")
                    .header("origin", "https://example.com")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
    }
}
