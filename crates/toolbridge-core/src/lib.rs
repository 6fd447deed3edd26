//! Toolbridge Core
//!
//! Bridges a hosted language model to tools served over MCP-style JSON-RPC.
//! A user turn flows through three pieces:
//!
//! - `tools::ToolRegistryClient` discovers and runs tools on a remote endpoint
//! - `tools::adapter` maps tool descriptors into the shape a model expects
//! - `orchestrator::ChatSession` drives the model ⇄ tool loop and owns the
//!   conversation
//!
//! ```rust,ignore
//! use toolbridge_core::{BridgeConfig, ChatSession, ConfigLayer, TracingLogger};
//!
//! let config = BridgeConfig::load(None, ConfigLayer::default())?;
//! let logger = Arc::new(TracingLogger::new("toolbridge"));
//! let mut session = ChatSession::from_config(&config, logger);
//!
//! let outcome = session.send("Find homes in Phoenix, AZ under $500k").await?;
//! println!("{}", outcome.answer);
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod orchestrator;
pub mod providers;
pub mod rpc;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{
    Conversation, ConversationError, Message, MessageRole, Tool, ToolCall, ToolChoice,
    ToolDescriptor, ToolResult,
};

pub use error::{BridgeError, BridgeResult, ErrorKind};

pub use logging::{Logger, MemoryLogger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{
    Backend, BridgeConfig, ConfigError, ConfigLayer, FileConfigProvider, ProviderKind,
    ToolSelection,
};

pub use rpc::{RpcClient, RpcError, RpcResult};

pub use providers::{
    create_provider, ChatOptions, ChatResponse, MockProvider, Provider, ProviderError,
    ProviderModelConfig,
};

pub use tools::{StaticToolExecutor, ToolExecutor, ToolFilter, ToolRegistryClient};

pub use orchestrator::{sanitize, ChatSession, SessionSettings, TurnOutcome, TurnState};

pub use handler::{InvokeHandler, InvokeRequest, InvokeResponse};
