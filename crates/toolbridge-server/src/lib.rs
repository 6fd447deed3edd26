//! Toolbridge property-search tool server
//!
//! Exposes a single MCP tool, `search_properties`, over JSON-RPC on HTTP.
//! The tool forwards searches to the property listing REST API.

pub mod dispatch;
pub mod http;
pub mod property_search;

pub use dispatch::{McpServer, ToolHandler, SERVER_NAME};
pub use property_search::{PropertySearchConfig, PropertySearchTool, SearchError};
