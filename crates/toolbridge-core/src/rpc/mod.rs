//! JSON-RPC transport to remote tool endpoints

mod client;
pub mod protocol;

pub use client::{RpcClient, RpcError, RpcResult, DEFAULT_TIMEOUT};
pub use protocol::{CallToolResult, ContentItem, RpcErrorObject, RpcRequest, RpcResponse};
