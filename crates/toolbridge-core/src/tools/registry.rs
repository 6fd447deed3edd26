//! Tool registry client for a remote MCP endpoint
//!
//! The ToolRegistryClient is the session's view of a tool server:
//! - Discovers tools via `tools/list` and caches them
//! - Filters tools based on configured include/exclude lists
//! - Executes tools via `tools/call` and flattens their text output

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::executor::ToolExecutor;
use crate::logging::SharedLogger;
use crate::rpc::{RpcClient, RpcError, RpcResult};
use crate::types::ToolDescriptor;

/// Name-based filter applied to discovered tools
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    /// If set, only include tools with these names
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these names
    pub exclude: HashSet<String>,
}

impl ToolFilter {
    /// Accept every tool
    pub fn new() -> Self {
        Self::default()
    }

    /// Include only specific tools
    pub fn with_include(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(names.into_iter().collect());
        self
    }

    /// Exclude specific tools
    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude = names.into_iter().collect();
        self
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolDescriptor) -> bool {
        if self.exclude.contains(&tool.name) {
            return false;
        }

        match self.include {
            Some(ref include) => include.contains(&tool.name),
            None => true,
        }
    }
}

/// Cached, filtered view of one remote tool endpoint
pub struct ToolRegistryClient {
    rpc: RpcClient,
    /// Tools from the last successful `tools/list`
    cache: RwLock<Option<Vec<ToolDescriptor>>>,
    filter: ToolFilter,
    logger: SharedLogger,
}

impl ToolRegistryClient {
    pub fn new(rpc: RpcClient, logger: SharedLogger) -> Self {
        Self {
            rpc,
            cache: RwLock::new(None),
            filter: ToolFilter::new(),
            logger,
        }
    }

    pub fn with_filter(mut self, filter: ToolFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn endpoint(&self) -> &str {
        self.rpc.url()
    }

    /// MCP handshake; returns the server's `serverInfo`/capabilities
    pub async fn initialize(&self) -> RpcResult<Value> {
        let info = self
            .rpc
            .initialize(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            .await?;
        let server = info
            .get("serverInfo")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        self.logger
            .info(&format!("[ToolRegistry] Initialized session with {}", server));
        Ok(info)
    }

    /// List tools, served from cache unless `force_refresh` or nothing cached yet
    pub async fn list_tools(&self, force_refresh: bool) -> RpcResult<Vec<ToolDescriptor>> {
        if !force_refresh {
            let cached = self.cache.read().clone();
            if let Some(tools) = cached {
                return Ok(tools);
            }
        }

        let tools: Vec<ToolDescriptor> = match self.rpc.list_tools().await {
            Ok(tools) => tools.into_iter().filter(|t| self.filter.matches(t)).collect(),
            Err(e) => {
                self.logger
                    .error(&format!("[ToolRegistry] Failed to fetch tools: {}", e));
                return Err(e);
            }
        };

        self.logger.info(&format!(
            "[ToolRegistry] Discovered {} tools from {}",
            tools.len(),
            self.rpc.url()
        ));
        *self.cache.write() = Some(tools.clone());
        Ok(tools)
    }

    /// Number of cached tools (0 before the first listing)
    pub fn cached_tool_count(&self) -> usize {
        self.cache.read().as_ref().map_or(0, Vec::len)
    }

    /// Call a tool by name and return its joined text output
    pub async fn call_tool(&self, name: &str, arguments: Value) -> RpcResult<String> {
        self.logger
            .info(&format!("[ToolRegistry] Calling tool: {}", name));

        let result = self.rpc.call_tool(name, arguments).await?;
        let text = result.joined_text();

        if result.is_error {
            self.logger
                .warn(&format!("[ToolRegistry] Tool {} reported an error", name));
            return Err(RpcError::ToolFailed(text));
        }

        self.logger.debug(&format!(
            "[ToolRegistry] Tool {} returned {} bytes",
            name,
            text.len()
        ));
        Ok(text)
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistryClient {
    async fn initialize(&self) -> RpcResult<Value> {
        ToolRegistryClient::initialize(self).await
    }

    async fn list_tools(&self, force_refresh: bool) -> RpcResult<Vec<ToolDescriptor>> {
        ToolRegistryClient::list_tools(self, force_refresh).await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> RpcResult<String> {
        ToolRegistryClient::call_tool(self, name, arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::logging::NoOpLogger;
    use serde_json::json;
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, format!("{} tool", name), json!({"type": "object"}))
    }

    /// Echoes the request id so any number of calls succeed
    fn respond_with(result: Value) -> impl Fn(&Request) -> ResponseTemplate {
        move |request: &Request| {
            let id = request.body_json::<Value>().map(|b| b["id"].clone()).unwrap_or(Value::Null);
            ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
        }
    }

    fn client_for(server: &MockServer) -> ToolRegistryClient {
        ToolRegistryClient::new(RpcClient::new(server.uri()), Arc::new(NoOpLogger))
    }

    #[test]
    fn test_tool_filter_default() {
        let filter = ToolFilter::new();
        assert!(filter.matches(&descriptor("search_properties")));
    }

    #[test]
    fn test_tool_filter_include_and_exclude() {
        let filter = ToolFilter::new()
            .with_include(["search_properties".to_string(), "get_weather".to_string()])
            .with_exclude(["get_weather".to_string()]);

        assert!(filter.matches(&descriptor("search_properties")));
        assert!(!filter.matches(&descriptor("get_weather")));
        assert!(!filter.matches(&descriptor("delete_everything")));
    }

    #[tokio::test]
    async fn test_list_tools_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/list"})))
            .respond_with(respond_with(json!({"tools": [
                {"name": "search_properties", "description": "Search", "inputSchema": {"type": "object"}}
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first = client.list_tools(false).await.unwrap();
        let second = client.list_tools(false).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(client.cached_tool_count(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_refetches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"method": "tools/list"})))
            .respond_with(respond_with(json!({"tools": []})))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.list_tools(false).await.unwrap().is_empty());
        assert!(client.list_tools(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_listing_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .expect(2)
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.list_tools(false).await.is_err());
        assert!(client.list_tools(false).await.is_err());
        assert_eq!(client.cached_tool_count(), 0);
    }

    #[tokio::test]
    async fn test_call_tool_joins_text_segments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "tools/call",
                "params": {"name": "search_properties", "arguments": {"city": "Phoenix", "state": "AZ"}}
            })))
            .respond_with(respond_with(json!({"content": [
                {"type": "text", "text": "Found 2 properties:"},
                {"type": "resource", "uri": "file:///x"},
                {"type": "text", "text": "[...]"}
            ]})))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .call_tool("search_properties", json!({"city": "Phoenix", "state": "AZ"}))
            .await
            .unwrap();
        assert_eq!(text, "Found 2 properties:\n[...]");
    }

    #[tokio::test]
    async fn test_call_tool_is_error_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(respond_with(json!({
                "content": [{"type": "text", "text": "Error: city and state are required"}],
                "isError": true
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .call_tool("search_properties", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolExecution);
        assert!(err.to_string().contains("city and state are required"));
    }

    #[tokio::test]
    async fn test_initialize_sends_protocol_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "initialize",
                "params": {"protocolVersion": "2024-11-05"}
            })))
            .respond_with(respond_with(json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "property-search-mcp-server", "version": "1.0.0"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = client_for(&server).initialize().await.unwrap();
        assert_eq!(info["serverInfo"]["name"], "property-search-mcp-server");
    }
}
