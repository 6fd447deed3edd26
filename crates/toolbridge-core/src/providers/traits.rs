//! Provider trait definition

use std::time::Duration;

use async_trait::async_trait;

use super::error::ProviderResult;
use crate::types::{Message, Tool, ToolCall, ToolChoice};

/// Model configuration for provider requests
#[derive(Clone)]
pub struct ProviderModelConfig {
    /// Model identifier as used by the provider's API
    pub model: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
    /// Bound on a single model call
    pub timeout: Duration,
}

impl ProviderModelConfig {
    /// Create a new model config
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Hand-written so the key never reaches logs
impl std::fmt::Debug for ProviderModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderModelConfig")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Options for a chat request
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools available for the model to use; `None` means none are offered
    pub tools: Option<Vec<Tool>>,
    /// Tool choice behavior
    pub tool_choice: Option<ToolChoice>,
}

impl ChatOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Set tool choice
    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }
}

/// Reply from a model backend
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    /// Always an assistant message
    pub message: Message,
    /// Model that produced the reply, as reported by the backend
    pub model: String,
}

impl ChatResponse {
    /// Plain text reply
    pub fn text(content: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
            model: model.into(),
        }
    }

    /// Reply requesting tool execution
    pub fn tool_calls(content: Option<String>, calls: Vec<ToolCall>, model: impl Into<String>) -> Self {
        Self {
            message: Message::assistant_with_tool_calls(content, calls),
            model: model.into(),
        }
    }
}

/// Provider trait for model backends
///
/// Each backend (genai, OpenAI-compatible HTTP, mock) implements this trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "groq", "openai-compatible")
    fn name(&self) -> &str;

    /// Send the conversation and return the assistant's reply
    async fn chat(
        &self,
        messages: &[Message],
        model: &ProviderModelConfig,
        options: &ChatOptions,
    ) -> ProviderResult<ChatResponse>;
}
