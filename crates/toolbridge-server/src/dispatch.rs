//! JSON-RPC dispatch for an MCP tool server
//!
//! `McpServer` owns a fixed set of [`ToolHandler`]s and answers
//! `initialize`, `tools/list` and `tools/call`. Transport is left to the
//! caller (see `http`).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use toolbridge_core::rpc::protocol::{
    CallToolParams, ListToolsResult, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use toolbridge_core::rpc::{CallToolResult, RpcResponse};
use toolbridge_core::ToolDescriptor;

/// Server name reported by `initialize`
pub const SERVER_NAME: &str = "property-search-mcp-server";

/// One tool exposed by the server
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Descriptor advertised in `tools/list`
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool. Failures are reported inside the result, never as
    /// JSON-RPC errors.
    async fn call(&self, arguments: Value) -> CallToolResult;
}

/// Method router over a set of tools
#[derive(Clone)]
pub struct McpServer {
    name: String,
    version: String,
    tools: Vec<Arc<dyn ToolHandler>>,
}

impl McpServer {
    pub fn new() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            tools: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn ToolHandler>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Handle a raw request body
    pub async fn handle_bytes(&self, body: &[u8]) -> RpcResponse {
        match serde_json::from_slice::<Value>(body) {
            Ok(value) => self.handle(value).await,
            Err(e) => {
                tracing::warn!(error = %e, "unparsable request body");
                RpcResponse::failure(Value::Null, PARSE_ERROR, format!("Parse error: {}", e))
            }
        }
    }

    /// Handle a decoded request.
    ///
    /// A gateway event (`{"body": "<json>"}`) is unwrapped first. A missing
    /// request id defaults to 1.
    pub async fn handle(&self, request: Value) -> RpcResponse {
        let request = match unwrap_event(request) {
            Ok(request) => request,
            Err(message) => return RpcResponse::failure(Value::Null, PARSE_ERROR, message),
        };

        let Value::Object(envelope) = request else {
            return RpcResponse::failure(
                Value::Null,
                INVALID_REQUEST,
                "Invalid Request: expected a JSON object",
            );
        };

        let id = envelope.get("id").cloned().unwrap_or_else(|| Value::from(1));
        let Some(method) = envelope.get("method").and_then(Value::as_str) else {
            return RpcResponse::failure(id, INVALID_REQUEST, "Invalid Request: missing method");
        };
        let params = envelope.get("params").cloned().unwrap_or(Value::Null);

        tracing::debug!(method, id = %id, "rpc request");

        match method {
            "initialize" => RpcResponse::success(id, self.initialize_result()),
            "tools/list" => RpcResponse::success(id, self.list_result()),
            "tools/call" => match serde_json::from_value::<CallToolParams>(params) {
                Ok(params) => {
                    let result = self.call_tool(&params.name, params.arguments).await;
                    match serde_json::to_value(result) {
                        Ok(value) => RpcResponse::success(id, value),
                        Err(e) => {
                            RpcResponse::failure(id, INTERNAL_ERROR, format!("Internal error: {}", e))
                        }
                    }
                }
                Err(e) => RpcResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
            },
            other => {
                RpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other))
            }
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {"name": self.name, "version": self.version}
        })
    }

    fn list_result(&self) -> Value {
        let result = ListToolsResult {
            tools: self.tools.iter().map(|tool| tool.descriptor()).collect(),
        };
        serde_json::to_value(result).unwrap_or_else(|_| json!({"tools": []}))
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> CallToolResult {
        let arguments = match arguments {
            Value::Null => json!({}),
            other => other,
        };

        match self.tools.iter().find(|tool| tool.descriptor().name == name) {
            Some(tool) => {
                tracing::info!(tool = name, "tools/call");
                tool.call(arguments).await
            }
            None => {
                tracing::warn!(tool = name, "unknown tool");
                CallToolResult::error(format!("Unknown tool: {}", name))
            }
        }
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

fn unwrap_event(request: Value) -> Result<Value, String> {
    let is_event = request
        .as_object()
        .map(|map| map.contains_key("body") && !map.contains_key("method"))
        .unwrap_or(false);
    if !is_event {
        return Ok(request);
    }

    match request.get("body") {
        Some(Value::String(raw)) => {
            serde_json::from_str(raw).map_err(|e| format!("Parse error: {}", e))
        }
        Some(body) => Ok(body.clone()),
        None => Ok(request),
    }
}
