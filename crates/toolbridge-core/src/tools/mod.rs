//! Tool discovery, adaptation and execution
//!
//! ```text
//! ┌──────────────────────┐   tools/list, tools/call   ┌──────────────────┐
//! │  ToolRegistryClient  │ ─────────────────────────▶ │  MCP tool server │
//! │  (cache + filter)    │        JSON-RPC / HTTP     │                  │
//! └──────────────────────┘                            └──────────────────┘
//!            │ ToolDescriptor
//!            ▼
//!   adapter::adapt ──▶ Tool ──▶ provider-specific tool schema
//! ```

pub mod adapter;
mod executor;
mod registry;

pub use adapter::{adapt, adapt_all, to_openai_function};
pub use executor::{StaticToolExecutor, ToolExecutor};
pub use registry::{ToolFilter, ToolRegistryClient};
