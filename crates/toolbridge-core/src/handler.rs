//! Request/response envelope for the HTTP entry point
//!
//! Accepts either a plain request body
//!
//! ```json
//! {"message": "Find homes in Phoenix, AZ", "provider": "groq"}
//! ```
//!
//! or an API-gateway style event whose `body` holds the same object, either
//! as a JSON string or inline. The reply mirrors the gateway shape:
//! `{"statusCode": 200, "body": {"response": ..., "history": [...]}}`.
//!
//! `history` uses the OpenAI chat message format and can be sent back
//! unchanged as `messages` to continue the conversation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::{BridgeConfig, ConfigError};
use crate::error::{BridgeError, BridgeResult};
use crate::logging::SharedLogger;
use crate::orchestrator::ChatSession;
use crate::providers::openai_compat::to_openai_message;
use crate::types::Message;
use crate::{log_error, log_info, log_warn};

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// One invocation request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InvokeRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Accepted in place of `message`
    #[serde(default)]
    pub prompt: Option<String>,
    /// Prior conversation to continue from
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl InvokeRequest {
    /// Unwrap a gateway event, or take the value as the request itself
    pub fn from_event(event: Value) -> BridgeResult<Self> {
        let body = match event {
            Value::Object(mut map) if map.contains_key("body") => {
                match map.remove("body").unwrap_or(Value::Null) {
                    Value::String(raw) => serde_json::from_str::<Value>(&raw).map_err(|e| {
                        BridgeError::invalid_request(format!("body is not valid JSON: {}", e))
                    })?,
                    Value::Null => Value::Object(Default::default()),
                    other => other,
                }
            }
            other => other,
        };

        serde_json::from_value(body)
            .map_err(|e| BridgeError::invalid_request(format!("malformed request: {}", e)))
    }

    /// User text, preferring `message` over `prompt`
    pub fn user_text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.prompt.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Gateway-shaped reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvokeResponse {
    pub status_code: u16,
    pub body: Value,
}

impl InvokeResponse {
    pub fn ok(answer: &str, history: &[Message]) -> Self {
        let history: Vec<Value> = history.iter().map(to_openai_message).collect();
        Self {
            status_code: 200,
            body: json!({ "response": answer, "history": history }),
        }
    }

    pub fn error(err: &BridgeError) -> Self {
        Self {
            status_code: err.status_code(),
            body: json!({ "error": err.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Runs one fresh session per request
#[derive(Clone)]
pub struct InvokeHandler {
    config: BridgeConfig,
    env: EnvLookup,
    logger: SharedLogger,
}

impl InvokeHandler {
    pub fn new(config: BridgeConfig, logger: SharedLogger) -> Self {
        Self {
            config,
            env: Arc::new(|key: &str| std::env::var(key).ok()),
            logger,
        }
    }

    /// Replace the environment used to find keys when a request switches provider
    pub fn with_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Arc::new(env);
        self
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Handle a raw event; never fails, errors become error envelopes
    pub async fn handle(&self, event: Value) -> InvokeResponse {
        let result = match InvokeRequest::from_event(event) {
            Ok(request) => self.invoke(request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(response) => response,
            Err(e) => {
                log_error!(self.logger, "[InvokeHandler] {} ({})", e, e.kind());
                InvokeResponse::error(&e)
            }
        }
    }

    /// Run one turn for a parsed request
    pub async fn invoke(&self, request: InvokeRequest) -> BridgeResult<InvokeResponse> {
        let user_text = request.user_text().map(str::to_string);
        if user_text.is_none() && request.messages.is_none() {
            return Err(BridgeError::invalid_request(
                "missing 'message' or 'prompt' in request",
            ));
        }

        let env = self.env.clone();
        let config = self.config.switch_model(
            request.provider.as_deref(),
            request.model.as_deref(),
            move |key: &str| env(key),
        )
        .map_err(|e| match e {
            ConfigError::UnknownProvider(_) => BridgeError::invalid_request(e.to_string()),
            other => other.into(),
        })?;
        log_info!(
            self.logger,
            "[InvokeHandler] provider={} model={}",
            config.provider,
            config.model
        );

        let mut session = ChatSession::from_config(&config, self.logger.clone());
        if let Some(history) = request.messages {
            session = session.with_history(history)?;
        }

        let outcome = match user_text {
            Some(text) => session.send(&text).await?,
            None => session.respond().await?,
        };
        if outcome.rounds_exhausted {
            log_warn!(
                self.logger,
                "[InvokeHandler] round limit reached with {} pending call(s)",
                outcome.pending_calls.len()
            );
        }

        Ok(InvokeResponse::ok(&outcome.answer, session.history()))
    }
}
