//! Mock provider for testing
//!
//! Provides deterministic, scripted replies without network dependencies and
//! records every request it receives. Useful for orchestration tests and for
//! running the CLI offline.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ChatResponse, Provider, ProviderModelConfig};
use crate::logging::SharedLogger;
use crate::types::{Message, Tool, ToolCall, ToolChoice};

/// One scripted model reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Plain assistant text
    Text(String),
    /// Assistant turn requesting these tool calls
    ToolCalls(Vec<ToolCall>),
    /// Fail the model call with this message
    Error(String),
}

/// Mock response mode
#[derive(Debug, Clone, Default)]
pub enum MockMode {
    /// Echo back the last user message
    #[default]
    Echo,
    /// Return the scripted replies in order; error once exhausted
    Scripted(VecDeque<MockReply>),
}

/// What the provider was asked, captured per call
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<Tool>>,
    pub tool_choice: Option<ToolChoice>,
    pub model: String,
}

/// Mock model backend
pub struct MockProvider {
    mode: Mutex<MockMode>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: SharedLogger,
}

impl MockProvider {
    /// Create an echo provider (echoes back the last user message)
    pub fn echo(logger: SharedLogger) -> Self {
        Self::with_mode(MockMode::Echo, logger)
    }

    /// Create a provider that plays back `replies` in order
    pub fn scripted(replies: impl IntoIterator<Item = MockReply>, logger: SharedLogger) -> Self {
        Self::with_mode(MockMode::Scripted(replies.into_iter().collect()), logger)
    }

    pub fn with_mode(mode: MockMode, logger: SharedLogger) -> Self {
        Self {
            mode: Mutex::new(mode),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of model calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn last_user_message(messages: &[Message]) -> &str {
        messages
            .iter()
            .rev()
            .find_map(|msg| match msg {
                Message::User { content } if !content.is_empty() => Some(content.as_str()),
                _ => None,
            })
            .unwrap_or("Hello from MockProvider!")
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(
        &self,
        messages: &[Message],
        model: &ProviderModelConfig,
        options: &ChatOptions,
    ) -> ProviderResult<ChatResponse> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            tools: options.tools.clone(),
            tool_choice: options.tool_choice,
            model: model.model.clone(),
        });

        let reply = match &mut *self.mode.lock() {
            MockMode::Echo => {
                let user_msg = Self::last_user_message(messages);
                MockReply::Text(format!("Echo: {}", user_msg))
            }
            MockMode::Scripted(replies) => replies
                .pop_front()
                .unwrap_or_else(|| MockReply::Error("mock script exhausted".to_string())),
        };

        self.logger
            .debug(&format!("MockProvider: replying with {:?}", reply));

        match reply {
            MockReply::Text(text) => Ok(ChatResponse::text(text, model.model.clone())),
            MockReply::ToolCalls(calls) => Ok(ChatResponse::tool_calls(None, calls, model.model.clone())),
            MockReply::Error(message) => Err(ProviderError::Other(format!("Mock error: {}", message))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use std::sync::Arc;

    fn test_logger() -> SharedLogger {
        Arc::new(NoOpLogger)
    }

    fn test_config() -> ProviderModelConfig {
        ProviderModelConfig::new("mock-model")
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let provider = MockProvider::echo(test_logger());
        let response = provider
            .chat(&[Message::user("Hello, world!")], &test_config(), &ChatOptions::new())
            .await
            .unwrap();

        assert_eq!(response.message.text(), Some("Echo: Hello, world!"));
        assert_eq!(provider.name(), "mock");
    }

    #[tokio::test]
    async fn test_scripted_mode_in_order() {
        let call = ToolCall::new("call_1", "search_properties", "{}");
        let provider = MockProvider::scripted(
            [MockReply::ToolCalls(vec![call.clone()]), MockReply::Text("done".into())],
            test_logger(),
        );

        let first = provider
            .chat(&[Message::user("q")], &test_config(), &ChatOptions::new())
            .await
            .unwrap();
        assert_eq!(first.message.tool_calls(), &[call]);

        let second = provider
            .chat(&[Message::user("q")], &test_config(), &ChatOptions::new())
            .await
            .unwrap();
        assert_eq!(second.message.text(), Some("done"));

        // Exhausted script fails loudly
        assert!(provider
            .chat(&[Message::user("q")], &test_config(), &ChatOptions::new())
            .await
            .is_err());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_records_tools() {
        let provider = MockProvider::scripted([MockReply::Error("boom".into())], test_logger());
        let options = ChatOptions::new()
            .with_tools(vec![Tool::new("search_properties", "Search")])
            .with_tool_choice(ToolChoice::Auto);

        let err = provider
            .chat(&[Message::user("q")], &test_config(), &options)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));

        let recorded = provider.requests();
        assert_eq!(recorded[0].tools.as_ref().map(Vec::len), Some(1));
        assert_eq!(recorded[0].tool_choice, Some(ToolChoice::Auto));
        assert_eq!(recorded[0].model, "mock-model");
    }
}
