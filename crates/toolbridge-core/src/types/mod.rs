//! Core types for tool-calling conversations
//!
//! This module contains the shared types used by providers, the tool client
//! and the orchestration loop.

mod conversation;
mod message;
mod tool;

pub use conversation::{Conversation, ConversationError};
pub use message::{Message, MessageRole};
pub use tool::{empty_object_schema, Tool, ToolCall, ToolChoice, ToolDescriptor, ToolResult};
