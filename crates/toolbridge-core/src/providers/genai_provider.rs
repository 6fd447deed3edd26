//! GenaiProvider - hosted model backends through the genai crate
//!
//! Handles OpenAI, Groq, Gemini and Anthropic natively; local and custom
//! endpoints go through genai's OpenAI adapter via the ServiceTargetResolver.

use async_trait::async_trait;

use genai::chat::ChatRequest;

use crate::config::ProviderKind;
use crate::logging::SharedLogger;
use crate::types::{Message, Tool, ToolChoice};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_tool_call, to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{ChatOptions, ChatResponse, Provider, ProviderModelConfig};

/// Model backend built on genai
pub struct GenaiProvider {
    kind: ProviderKind,
    logger: SharedLogger,
}

impl GenaiProvider {
    pub fn new(kind: ProviderKind, logger: SharedLogger) -> Self {
        Self { kind, logger }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Strip a "provider/" prefix (e.g., "groq/llama-3.3-70b" -> "llama-3.3-70b")
    pub fn extract_model_name(model: &str) -> &str {
        match model.split_once('/') {
            Some((prefix, rest)) if ProviderKind::from_id(prefix).is_some() => rest,
            _ => model,
        }
    }
}

/// Tools to attach to a genai request.
///
/// genai has no tool-choice setting and its adapters default to auto, so
/// `ToolChoice::None` is expressed by leaving the tools off. An empty tools
/// array is rejected by several APIs.
fn offered_tools(options: &ChatOptions) -> Option<Vec<Tool>> {
    if options.tool_choice == Some(ToolChoice::None) {
        return None;
    }
    options.tools.clone().filter(|tools| !tools.is_empty())
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        self.kind.id()
    }

    async fn chat(
        &self,
        messages: &[Message],
        model_config: &ProviderModelConfig,
        options: &ChatOptions,
    ) -> ProviderResult<ChatResponse> {
        if self.kind.requires_api_key() && model_config.api_key.is_none() {
            return Err(ProviderError::missing_api_key(self.kind.display_name()));
        }

        let model_name = Self::extract_model_name(&model_config.model);
        self.logger.info(&format!(
            "[GenaiProvider] chat: provider={}, model={}, messages={}",
            self.kind.id(),
            model_name,
            messages.len()
        ));

        let client = create_client(self.kind, model_config);
        let mut chat_req = ChatRequest::new(to_genai_messages(messages)?);

        if let Some(tools) = offered_tools(options) {
            chat_req = chat_req.with_tools(to_genai_tools(tools));
        }

        let genai_options = to_genai_options(options);

        let response = match tokio::time::timeout(
            model_config.timeout,
            client.exec_chat(model_name, chat_req, Some(&genai_options)),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                self.logger
                    .error(&format!("[GenaiProvider] {} API error: {}", self.kind.id(), e));
                return Err(ProviderError::api_error(self.kind.id(), 500, e.to_string()));
            }
            Err(_) => {
                self.logger.error(&format!(
                    "[GenaiProvider] {} request timed out after {}s",
                    self.kind.id(),
                    model_config.timeout.as_secs()
                ));
                return Err(ProviderError::timeout(self.kind.id(), model_config.timeout));
            }
        };

        let content = response.first_text().map(str::to_string);
        let tool_calls: Vec<_> = response
            .tool_calls()
            .into_iter()
            .map(from_genai_tool_call)
            .collect();

        self.logger.debug(&format!(
            "[GenaiProvider] response: text={}, tool_calls={}",
            content.as_ref().map_or(0, String::len),
            tool_calls.len()
        ));

        if tool_calls.is_empty() {
            Ok(ChatResponse::text(content.unwrap_or_default(), model_name))
        } else {
            Ok(ChatResponse::tool_calls(content, tool_calls, model_name))
        }
    }
}
