//! Chat session driving the tool-calling loop
//!
//! One session owns one conversation and one tool executor. Each call to
//! [`ChatSession::send`] runs a full turn:
//!
//! ```text
//! AwaitingUser ─▶ ModelCalled ─┬─▶ Answered
//!                              └─▶ ToolsRequested ─▶ ToolsExecuted ─▶ FollowupModelCalled ─┬─▶ Answered
//!                                        ▲                                                 ├─▶ RoundLimitReached
//!                                        └──────────────── (rounds remain) ────────────────┘
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::sanitize::sanitize;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::logging::SharedLogger;
use crate::providers::{self, ChatOptions, Provider, ProviderError, ProviderModelConfig};
use crate::rpc::RpcClient;
use crate::tools::{adapt_all, ToolExecutor, ToolRegistryClient};
use crate::types::{Conversation, Message, Tool, ToolCall, ToolChoice, ToolDescriptor, ToolResult};

/// Where the session is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    AwaitingUser,
    ModelCalled,
    ToolsRequested,
    ToolsExecuted,
    FollowupModelCalled,
    Answered,
    RoundLimitReached,
}

impl TurnState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Answered | TurnState::RoundLimitReached)
    }
}

/// Result of one completed turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    /// Final assistant text (may be empty when the round budget ran out)
    pub answer: String,
    /// Tool rounds executed
    pub rounds: u32,
    /// Model calls made
    pub model_calls: u32,
    /// Tool calls executed (successful or not)
    pub tools_executed: usize,
    /// Executed tool calls whose result was an error
    pub tool_errors: usize,
    /// The model still wanted tools when the round budget was spent
    pub rounds_exhausted: bool,
    /// Tool calls that were not executed because of the round budget
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending_calls: Vec<ToolCall>,
}

/// Per-session model settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model: ProviderModelConfig,
    pub system_prompt: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub max_tool_rounds: u32,
}

impl SessionSettings {
    pub fn new(model: ProviderModelConfig) -> Self {
        Self {
            model,
            system_prompt: crate::config::DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: Some(crate::config::DEFAULT_MAX_TOKENS),
            temperature: None,
            max_tool_rounds: crate::config::DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl From<&BridgeConfig> for SessionSettings {
    fn from(config: &BridgeConfig) -> Self {
        Self {
            model: providers::model_config(config),
            system_prompt: config.system_prompt.clone(),
            max_tokens: Some(config.max_tokens),
            temperature: None,
            max_tool_rounds: config.max_tool_rounds,
        }
    }
}

/// Tool-calling chat session
pub struct ChatSession {
    provider: Arc<dyn Provider>,
    tools: Arc<dyn ToolExecutor>,
    settings: SessionSettings,
    conversation: Conversation,
    state: TurnState,
    logger: SharedLogger,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolExecutor>,
        settings: SessionSettings,
        logger: SharedLogger,
    ) -> Self {
        let conversation = Conversation::with_system_prompt(settings.system_prompt.clone());
        Self {
            provider,
            tools,
            settings,
            conversation,
            state: TurnState::AwaitingUser,
            logger,
        }
    }

    /// Session wired to the configured tool endpoint and model backend
    pub fn from_config(config: &BridgeConfig, logger: SharedLogger) -> Self {
        let rpc = RpcClient::new(config.mcp_url.clone())
            .with_timeout(config.timeout())
            .with_logger(logger.clone());
        let registry = ToolRegistryClient::new(rpc, logger.clone()).with_filter(config.tools.to_filter());
        let provider = providers::create_provider(config, logger.clone());

        Self::new(provider, Arc::new(registry), SessionSettings::from(config), logger)
    }

    /// Replace the history with an imported one (validated; system prompt
    /// prepended when missing)
    pub fn with_history(mut self, messages: Vec<Message>) -> BridgeResult<Self> {
        self.conversation = Conversation::from_messages(messages, Some(&self.settings.system_prompt))?;
        Ok(self)
    }

    pub fn history(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn into_history(self) -> Vec<Message> {
        self.conversation.into_messages()
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.settings.model.model
    }

    /// MCP handshake with the tool endpoint
    pub async fn initialize(&self) -> BridgeResult<Value> {
        Ok(self.tools.initialize().await?)
    }

    /// Discovered tools (cached unless `force_refresh`)
    pub async fn list_tools(&self, force_refresh: bool) -> BridgeResult<Vec<ToolDescriptor>> {
        Ok(self.tools.list_tools(force_refresh).await?)
    }

    /// Re-fetch the tool list; returns the number of tools
    pub async fn refresh_tools(&self) -> BridgeResult<usize> {
        Ok(self.list_tools(true).await?.len())
    }

    /// Run one user turn to completion.
    ///
    /// On any model-side failure the conversation is rolled back to its
    /// state before this call.
    pub async fn send(&mut self, user_input: &str) -> BridgeResult<TurnOutcome> {
        let checkpoint = self.conversation.len();
        self.conversation.push_user(user_input);
        self.finish_turn(checkpoint).await
    }

    /// Answer an imported history that already ends with a user message
    pub async fn respond(&mut self) -> BridgeResult<TurnOutcome> {
        self.conversation.ensure_awaiting_answer()?;
        let checkpoint = self.conversation.len();
        self.finish_turn(checkpoint).await
    }

    async fn finish_turn(&mut self, checkpoint: usize) -> BridgeResult<TurnOutcome> {
        match self.run_turn().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.logger.error(&format!("[ChatSession] turn failed: {}", e));
                self.conversation.truncate(checkpoint);
                self.state = TurnState::AwaitingUser;
                Err(e)
            }
        }
    }

    async fn run_turn(&mut self) -> BridgeResult<TurnOutcome> {
        let tools = adapt_all(&self.tools.list_tools(false).await?);
        let max_rounds = self.settings.max_tool_rounds;

        let mut rounds = 0u32;
        let mut model_calls = 0u32;
        let mut tools_executed = 0usize;
        let mut tool_errors = 0usize;

        loop {
            self.transition(if rounds == 0 {
                TurnState::ModelCalled
            } else {
                TurnState::FollowupModelCalled
            });

            let options = self.chat_options(&tools, rounds < max_rounds);
            let messages = sanitize(self.conversation.messages());
            let response = self
                .provider
                .chat(&messages, &self.settings.model, &options)
                .await?;
            model_calls += 1;

            if !matches!(response.message, Message::Assistant { .. }) {
                return Err(ProviderError::invalid_response(
                    self.provider.name(),
                    "reply is not an assistant message",
                )
                .into());
            }

            let answer = response.message.text().unwrap_or_default().to_string();
            let calls = response.message.tool_calls().to_vec();
            self.conversation.push(response.message)?;

            if calls.is_empty() {
                self.transition(TurnState::Answered);
                return Ok(TurnOutcome {
                    answer,
                    rounds,
                    model_calls,
                    tools_executed,
                    tool_errors,
                    rounds_exhausted: false,
                    pending_calls: Vec::new(),
                });
            }

            if rounds >= max_rounds {
                self.logger.warn(&format!(
                    "[ChatSession] model requested {} tool call(s) after {} round(s); not executing",
                    calls.len(),
                    rounds
                ));
                for call in &calls {
                    let note = ToolResult::error(
                        call.id.clone(),
                        format!("Tool not executed: maximum tool rounds ({}) exceeded", max_rounds),
                    );
                    self.conversation.push(Message::from_tool_result(call, note))?;
                }
                self.transition(TurnState::RoundLimitReached);
                return Ok(TurnOutcome {
                    answer,
                    rounds,
                    model_calls,
                    tools_executed,
                    tool_errors,
                    rounds_exhausted: true,
                    pending_calls: calls,
                });
            }

            self.transition(TurnState::ToolsRequested);
            for call in &calls {
                let result = self.execute(call).await;
                if result.is_error {
                    tool_errors += 1;
                }
                self.conversation.push(Message::from_tool_result(call, result))?;
                tools_executed += 1;
            }
            self.transition(TurnState::ToolsExecuted);
            rounds += 1;
        }
    }

    /// Tools are offered only while rounds remain
    fn chat_options(&self, tools: &[Tool], offer_tools: bool) -> ChatOptions {
        let options = ChatOptions {
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            ..ChatOptions::default()
        };
        if offer_tools {
            options
                .with_tools(tools.to_vec())
                .with_tool_choice(ToolChoice::Auto)
        } else {
            options.with_tool_choice(ToolChoice::None)
        }
    }

    /// Run one tool call; every failure becomes conversational text
    async fn execute(&self, call: &ToolCall) -> ToolResult {
        self.logger.info(&format!(
            "[ChatSession] calling tool {} (id={})",
            call.name, call.id
        ));

        let arguments = match call.decode_arguments() {
            Ok(arguments) => arguments,
            Err(e) => {
                self.logger
                    .warn(&format!("[ChatSession] bad arguments for {}: {}", call.name, e));
                return ToolResult::error(
                    call.id.clone(),
                    format!("Error executing tool: invalid arguments: {}", e),
                );
            }
        };

        match self.tools.call_tool(&call.name, arguments).await {
            Ok(output) => {
                self.logger.debug(&format!(
                    "[ChatSession] tool {} returned {} bytes",
                    call.name,
                    output.len()
                ));
                ToolResult::success(call.id.clone(), output)
            }
            Err(e) => {
                self.logger
                    .warn(&format!("[ChatSession] tool {} failed: {}", call.name, e));
                ToolResult::error(call.id.clone(), format!("Error executing tool: {}", e))
            }
        }
    }

    fn transition(&mut self, next: TurnState) {
        self.logger
            .debug(&format!("[ChatSession] {:?} -> {:?}", self.state, next));
        self.state = next;
    }
}
