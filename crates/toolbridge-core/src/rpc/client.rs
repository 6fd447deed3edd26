//! JSON-RPC client for remote tool endpoints
//!
//! Speaks JSON-RPC 2.0 over plain HTTP POST. Every request carries a
//! client-scoped correlation id starting at 1; a response must echo it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use super::protocol::{
    CallToolParams, CallToolResult, ListToolsResult, RpcRequest, RpcResponse, PROTOCOL_VERSION,
};
use crate::error::ErrorKind;
use crate::logging::{NoOpLogger, SharedLogger};
use crate::types::ToolDescriptor;

/// Default bound on a single tool endpoint request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while talking to a tool endpoint
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Tool reported an error: {0}")]
    ToolFailed(String),
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::ConnectionFailed(_) | RpcError::Timeout(_) | RpcError::Http { .. } => {
                ErrorKind::Transport
            }
            RpcError::Json(_) | RpcError::Remote { .. } | RpcError::InvalidResponse(_) => {
                ErrorKind::Protocol
            }
            RpcError::ToolFailed(_) => ErrorKind::ToolExecution,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Timeout(_))
    }
}

pub type RpcResult<T> = Result<T, RpcError>;

/// Longest slice of an error body kept in `RpcError::Http`
const ERROR_BODY_LIMIT: usize = 512;

/// JSON-RPC client bound to one endpoint URL
pub struct RpcClient {
    url: String,
    http: reqwest::Client,
    timeout: Duration,
    request_id: AtomicU64,
    logger: SharedLogger,
}

impl RpcClient {
    /// Create a client for `url` with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: reqwest::Client::new(),
            timeout: DEFAULT_TIMEOUT,
            request_id: AtomicU64::new(1),
            logger: std::sync::Arc::new(NoOpLogger),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Reuse an existing connection pool
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make a JSON-RPC request and decode its `result`
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> RpcResult<R> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = RpcRequest::new(id, method, serde_json::to_value(params)?);

        self.logger
            .debug(&format!("rpc request id={} method={}", id, method));

        let response = self
            .http
            .post(&self.url)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let envelope = serde_json::from_slice::<RpcResponse>(&body);

        if !status.is_success() {
            // A JSON-RPC error body is more specific than the status line
            if let Ok(RpcResponse { error: Some(error), .. }) = envelope {
                return Err(RpcError::Remote {
                    code: error.code,
                    message: error.message,
                });
            }
            let text = String::from_utf8_lossy(&body);
            let text: String = text.chars().take(ERROR_BODY_LIMIT).collect();
            self.logger
                .warn(&format!("rpc method={} failed with HTTP {}", method, status));
            return Err(RpcError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope = envelope
            .map_err(|e| RpcError::InvalidResponse(format!("malformed JSON-RPC response: {}", e)))?;
        self.parse_response(id, envelope)
    }

    fn parse_response<R: DeserializeOwned>(&self, id: u64, response: RpcResponse) -> RpcResult<R> {
        let echoed = response.id.as_u64() == Some(id);

        // Servers answer unparsable requests with a null id
        if !echoed && !(response.id.is_null() && response.error.is_some()) {
            return Err(RpcError::InvalidResponse(format!(
                "response id {} does not match request id {}",
                response.id, id
            )));
        }

        if let Some(error) = response.error {
            return Err(RpcError::Remote {
                code: error.code,
                message: error.message,
            });
        }

        let result = response
            .result
            .ok_or_else(|| RpcError::InvalidResponse("Missing result field".to_string()))?;

        serde_json::from_value(result)
            .map_err(|e| RpcError::InvalidResponse(format!("unexpected result shape: {}", e)))
    }

    fn transport_error(&self, error: reqwest::Error) -> RpcError {
        if error.is_timeout() {
            RpcError::Timeout(self.timeout)
        } else {
            RpcError::ConnectionFailed(error.to_string())
        }
    }

    // ==================== MCP TOOL API ====================

    /// MCP handshake; returns the server's raw `initialize` result
    pub async fn initialize(&self, client_name: &str, client_version: &str) -> RpcResult<Value> {
        self.call(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": client_name, "version": client_version},
            }),
        )
        .await
    }

    /// List all available tools (MCP tools/list)
    pub async fn list_tools(&self) -> RpcResult<Vec<ToolDescriptor>> {
        let result: ListToolsResult = self.call("tools/list", json!({})).await?;
        Ok(result.tools)
    }

    /// Call a tool (MCP tools/call)
    pub async fn call_tool(&self, name: &str, arguments: Value) -> RpcResult<CallToolResult> {
        self.call(
            "tools/call",
            CallToolParams {
                name: name.to_string(),
                arguments,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rpc_ok(id: u64, result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_increase() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"id": 1})))
            .respond_with(rpc_ok(1, json!({"tools": []})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"id": 2})))
            .respond_with(rpc_ok(2, json!({"tools": []})))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri());
        assert!(client.list_tools().await.unwrap().is_empty());
        assert!(client.list_tools().await.unwrap().is_empty());

        let requests = server.received_requests().await.unwrap();
        let ids: Vec<u64> = requests
            .iter()
            .map(|r| r.body_json::<Value>().unwrap()["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_id_mismatch_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_ok(99, json!({"tools": []})))
            .mount(&server)
            .await;

        let err = RpcClient::new(server.uri()).list_tools().await.unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse(_)));
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_remote_error_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/mcp"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32601, "message": "Method not found: tools/call"}
            })))
            .mount(&server)
            .await;

        let client = RpcClient::new(format!("{}/mcp", server.uri()));
        let err = client.call_tool("search_properties", json!({})).await.unwrap_err();
        match &err {
            RpcError::Remote { code, message } => {
                assert_eq!(*code, -32601);
                assert!(message.contains("Method not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_http_status_without_rpc_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = RpcClient::new(server.uri()).list_tools().await.unwrap_err();
        match &err {
            RpcError::Http { status, body } => {
                assert_eq!(*status, 503);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_http_status_with_rpc_body_reports_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32603, "message": "Internal error"}
            })))
            .mount(&server)
            .await;

        let err = RpcClient::new(server.uri()).list_tools().await.unwrap_err();
        assert!(matches!(err, RpcError::Remote { code: -32603, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = RpcClient::new(server.uri()).list_tools().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(rpc_ok(1, json!({"tools": []})).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = RpcClient::new(server.uri()).with_timeout(Duration::from_millis(50));
        let err = client.list_tools().await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = RpcClient::new("http://127.0.0.1:1/");
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, RpcError::ConnectionFailed(_)));
    }
}
