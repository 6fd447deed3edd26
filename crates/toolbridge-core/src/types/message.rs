//! Chat message types

use serde::{Deserialize, Deserializer, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A single conversation entry.
///
/// Each role carries exactly the fields it may have, so a history can never
/// hold a tool-call list on a user message or a dangling `tool_call_id` on an
/// assistant message. Serialized with the role as the tag:
///
/// ```json
/// {"role": "tool", "tool_call_id": "call_1", "name": "search_properties", "content": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        /// Absent only when the model answered with tool calls alone
        #[serde(default)]
        content: Option<String>,
        #[serde(
            default,
            deserialize_with = "null_as_empty",
            skip_serializing_if = "Vec::is_empty"
        )]
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        tool_call_id: String,
        /// Not every chat API echoes the tool name back
        #[serde(default)]
        name: String,
        content: String,
    },
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ToolCall>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<ToolCall>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: content.into(),
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Create an assistant message requesting tool execution
    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant { content, tool_calls }
    }

    /// Create a tool-role message answering `call`
    pub fn tool(call: &ToolCall, content: impl Into<String>) -> Self {
        Message::Tool {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            content: content.into(),
        }
    }

    /// Create a tool-role message from an execution result
    pub fn from_tool_result(call: &ToolCall, result: ToolResult) -> Self {
        Message::Tool {
            tool_call_id: result.call_id,
            name: call.name.clone(),
            content: result.content,
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Message::System { .. } => MessageRole::System,
            Message::User { .. } => MessageRole::User,
            Message::Assistant { .. } => MessageRole::Assistant,
            Message::Tool { .. } => MessageRole::Tool,
        }
    }

    /// Text content, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Tool { content, .. } => Some(content),
            Message::Assistant { content, .. } => content.as_deref(),
        }
    }

    /// Tool calls requested by an assistant message (empty for other roles)
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls().is_empty()
    }
}
