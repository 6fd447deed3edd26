//! Tool execution seam used by the orchestration loop

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::rpc::protocol::METHOD_NOT_FOUND;
use crate::rpc::{RpcError, RpcResult};
use crate::types::ToolDescriptor;

/// Something that can list and run tools
///
/// `ToolRegistryClient` implements this against a remote endpoint;
/// `StaticToolExecutor` runs in-process handlers.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Optional handshake; returns server information when the transport has any
    async fn initialize(&self) -> RpcResult<Value> {
        Ok(Value::Null)
    }

    /// Available tools, cached by the implementation unless `force_refresh`
    async fn list_tools(&self, force_refresh: bool) -> RpcResult<Vec<ToolDescriptor>>;

    /// Run one tool and return its text output
    async fn call_tool(&self, name: &str, arguments: Value) -> RpcResult<String>;
}

type Handler = Box<dyn Fn(&Value) -> RpcResult<String> + Send + Sync>;

/// In-process executor with fixed handlers; records every call
#[derive(Default)]
pub struct StaticToolExecutor {
    tools: Vec<ToolDescriptor>,
    handlers: HashMap<String, Handler>,
    calls: Mutex<Vec<(String, Value)>>,
    listings: Mutex<usize>,
}

impl StaticToolExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool whose handler computes the output from the arguments
    pub fn with_tool<F>(mut self, descriptor: ToolDescriptor, handler: F) -> Self
    where
        F: Fn(&Value) -> RpcResult<String> + Send + Sync + 'static,
    {
        self.handlers
            .insert(descriptor.name.clone(), Box::new(handler));
        self.tools.push(descriptor);
        self
    }

    /// Register a tool that always answers `output`
    pub fn with_text_tool(self, descriptor: ToolDescriptor, output: impl Into<String>) -> Self {
        let output = output.into();
        self.with_tool(descriptor, move |_| Ok(output.clone()))
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Number of `list_tools` requests served
    pub fn listing_count(&self) -> usize {
        *self.listings.lock()
    }
}

#[async_trait]
impl ToolExecutor for StaticToolExecutor {
    async fn list_tools(&self, _force_refresh: bool) -> RpcResult<Vec<ToolDescriptor>> {
        *self.listings.lock() += 1;
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> RpcResult<String> {
        self.calls.lock().push((name.to_string(), arguments.clone()));
        match self.handlers.get(name) {
            Some(handler) => handler(&arguments),
            None => Err(RpcError::Remote {
                code: METHOD_NOT_FOUND,
                message: format!("Unknown tool: {}", name),
            }),
        }
    }
}
