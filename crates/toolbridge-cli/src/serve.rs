//! HTTP invoke endpoint

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use toolbridge_core::{BridgeError, InvokeHandler, InvokeResponse};

/// Envelope reply with the HTTP status mirroring `statusCode`
pub struct InvokeReply(pub InvokeResponse);

impl IntoResponse for InvokeReply {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0)).into_response()
    }
}

pub fn router(handler: InvokeHandler) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", post(invoke))
        .route("/invoke", post(invoke))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(handler)
}

pub async fn serve(handler: InvokeHandler, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        provider = %handler.config().provider,
        model = %handler.config().model,
        "invoke endpoint listening"
    );
    axum::serve(listener, router(handler)).await
}

async fn invoke(State(handler): State<InvokeHandler>, body: Bytes) -> InvokeReply {
    let event = match serde_json::from_slice::<Value>(&body) {
        Ok(event) => event,
        Err(e) => {
            let err = BridgeError::invalid_request(format!("body is not valid JSON: {}", e));
            return InvokeReply(InvokeResponse::error(&err));
        }
    };
    InvokeReply(handler.handle(event).await)
}

async fn health(State(handler): State<InvokeHandler>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "provider": handler.config().provider.id(),
        "model": handler.config().model,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use toolbridge_core::{BridgeConfig, ConfigLayer, NoOpLogger};
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request as MockRequest, ResponseTemplate};

    async fn tool_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(|req: &MockRequest| {
                let body: Value = serde_json::from_slice(&req.body).unwrap();
                ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": body["id"],
                    "result": {"tools": []}
                }))
            })
            .mount(&server)
            .await;
        server
    }

    fn app(mcp_url: &str) -> Router {
        let config = BridgeConfig::resolve(
            ConfigLayer {
                mcp_url: Some(mcp_url.to_string()),
                provider: Some("mock".into()),
                ..Default::default()
            },
            |_| None,
        )
        .unwrap();
        router(InvokeHandler::new(config, Arc::new(NoOpLogger)))
    }

    async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
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
    async fn test_invoke_success() {
        let server = tool_server().await;
        let (status, body) = post(app(&server.uri()), "/invoke", r#"{"message": "hi"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["body"]["response"], "Echo: hi");
        assert_eq!(body["body"]["history"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_gateway_event_at_root() {
        let server = tool_server().await;
        let (status, body) =
            post(app(&server.uri()), "/", r#"{"body": "{\"prompt\": \"hey\"}"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["body"]["response"], "Echo: hey");
    }

    #[tokio::test]
    async fn test_status_mirrors_envelope() {
        let (status, body) = post(app("http://127.0.0.1:1"), "/invoke", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["statusCode"], 400);
        assert!(body["body"]["error"].is_string());

        let (status, _) = post(app("http://127.0.0.1:1"), "/invoke", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app("http://127.0.0.1:1")
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["provider"], "mock");
        assert_eq!(body["model"], "mock-model");
    }
}
