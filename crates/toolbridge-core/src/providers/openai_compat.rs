//! OpenAI-compatible HTTP provider
//!
//! Talks to any `/chat/completions` endpoint (vLLM, Ollama, LM Studio, hosted
//! gateways) with plain reqwest. Also owns the OpenAI wire serializer for the
//! message union.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::logging::SharedLogger;
use crate::tools::to_openai_function;
use crate::types::{Message, ToolCall};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ChatResponse, Provider, ProviderModelConfig};

const PROVIDER_NAME: &str = "openai-compatible";

// ============================================================================
// Wire format
// ============================================================================

/// Serialize one message in OpenAI chat format
pub fn to_openai_message(message: &Message) -> Value {
    match message {
        Message::System { content } => json!({"role": "system", "content": content}),
        Message::User { content } => json!({"role": "user", "content": content}),
        Message::Assistant { content, tool_calls } => {
            let mut wire = Map::new();
            wire.insert("role".into(), json!("assistant"));
            wire.insert("content".into(), json!(content));
            if !tool_calls.is_empty() {
                let calls: Vec<Value> = tool_calls.iter().map(to_openai_tool_call).collect();
                wire.insert("tool_calls".into(), Value::Array(calls));
            }
            Value::Object(wire)
        }
        Message::Tool {
            tool_call_id,
            name,
            content,
        } => json!({
            "role": "tool",
            "tool_call_id": tool_call_id,
            "name": name,
            "content": content,
        }),
    }
}

fn to_openai_tool_call(call: &ToolCall) -> Value {
    json!({
        "id": call.id,
        "type": "function",
        "function": {"name": call.name, "arguments": call.arguments},
    })
}

/// Full `/chat/completions` request body
pub fn build_request_body(messages: &[Message], model: &str, options: &ChatOptions) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(model));
    body.insert(
        "messages".into(),
        Value::Array(messages.iter().map(to_openai_message).collect()),
    );

    if let Some(tools) = options.tools.as_ref().filter(|t| !t.is_empty()) {
        body.insert(
            "tools".into(),
            Value::Array(tools.iter().map(to_openai_function).collect()),
        );
        let choice = options.tool_choice.unwrap_or_default();
        body.insert("tool_choice".into(), json!(choice.as_str()));
    }
    if let Some(max_tokens) = options.max_tokens {
        body.insert("max_tokens".into(), json!(max_tokens));
    }
    if let Some(temperature) = options.temperature {
        body.insert("temperature".into(), json!(temperature));
    }

    Value::Object(body)
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

// ============================================================================
// Provider
// ============================================================================

/// Provider for OpenAI-compatible `/chat/completions` endpoints
pub struct OpenAiCompatProvider {
    http_client: Client,
    default_base: String,
    logger: SharedLogger,
}

impl OpenAiCompatProvider {
    /// `default_base` is used when the model config carries no `api_base`
    pub fn new(default_base: impl Into<String>, logger: SharedLogger) -> Self {
        Self {
            http_client: Client::new(),
            default_base: default_base.into(),
            logger,
        }
    }

    fn completions_url(&self, model_config: &ProviderModelConfig) -> String {
        let base = model_config
            .api_base
            .as_deref()
            .unwrap_or(&self.default_base);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn chat(
        &self,
        messages: &[Message],
        model_config: &ProviderModelConfig,
        options: &ChatOptions,
    ) -> ProviderResult<ChatResponse> {
        let url = self.completions_url(model_config);
        let body = build_request_body(messages, &model_config.model, options);

        self.logger.info(&format!(
            "[OpenAiCompat] POST {} model={} messages={}",
            url,
            model_config.model,
            messages.len()
        ));

        let mut request = self
            .http_client
            .post(&url)
            .timeout(model_config.timeout)
            .json(&body);
        if let Some(key) = model_config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                self.logger.error(&format!(
                    "[OpenAiCompat] request timed out after {:?}",
                    model_config.timeout
                ));
                ProviderError::timeout(PROVIDER_NAME, model_config.timeout)
            } else {
                self.logger
                    .error(&format!("[OpenAiCompat] request error: {}", e));
                ProviderError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            self.logger.error(&format!(
                "[OpenAiCompat] API returned error status {}",
                status
            ));
            if status.as_u16() == 429 {
                return Err(ProviderError::rate_limited(PROVIDER_NAME, text));
            }
            return Err(ProviderError::api_error(PROVIDER_NAME, status.as_u16(), text));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(PROVIDER_NAME, format!("JSON parse error: {}", e))
        })?;

        let model = parsed.model.unwrap_or_else(|| model_config.model.clone());
        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ProviderError::invalid_response(PROVIDER_NAME, "no choices in response"))?;

        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall::new(tc.id, tc.function.name, tc.function.arguments))
            .collect();

        self.logger.debug(&format!(
            "[OpenAiCompat] response: tool_calls={}",
            tool_calls.len()
        ));

        if tool_calls.is_empty() {
            Ok(ChatResponse::text(message.content.unwrap_or_default(), model))
        } else {
            Ok(ChatResponse::tool_calls(message.content, tool_calls, model))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::{Tool, ToolChoice};
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiCompatProvider {
        OpenAiCompatProvider::new(format!("{}/v1", server.uri()), Arc::new(NoOpLogger))
    }

    #[test]
    fn test_wire_messages() {
        let call = ToolCall::new("call_1", "search_properties", r#"{"city":"Phoenix"}"#);
        let assistant = to_openai_message(&Message::assistant_with_tool_calls(
            Some(String::new()),
            vec![call.clone()],
        ));
        assert_eq!(assistant["content"], "");
        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert_eq!(assistant["tool_calls"][0]["function"]["arguments"], r#"{"city":"Phoenix"}"#);

        let plain = to_openai_message(&Message::assistant("done"));
        assert!(plain.get("tool_calls").is_none());

        let tool = to_openai_message(&Message::tool(&call, "Found 0 properties"));
        assert_eq!(tool["tool_call_id"], "call_1");
        assert_eq!(tool["name"], "search_properties");
    }

    #[test]
    fn test_request_body_tools() {
        let options = ChatOptions::new()
            .with_tools(vec![Tool::new("search_properties", "Search")])
            .with_tool_choice(ToolChoice::Auto)
            .with_max_tokens(4096);
        let body = build_request_body(&[Message::user("hi")], "llama", &options);
        assert_eq!(body["tools"][0]["function"]["name"], "search_properties");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["max_tokens"], 4096);

        let body = build_request_body(&[Message::user("hi")], "llama", &ChatOptions::new().with_tools(vec![]));
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[tokio::test]
    async fn test_chat_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "local-model",
                "choices": [{"message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "search_properties", "arguments": "{\"city\":\"Phoenix\",\"state\":\"AZ\"}"}
                    }]
                }}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .chat(
                &[Message::user("homes in Phoenix")],
                &ProviderModelConfig::new("local-model").with_api_key("test-key"),
                &ChatOptions::new(),
            )
            .await
            .unwrap();

        let calls = response.message.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_abc");
        assert_eq!(calls[0].decode_arguments().unwrap()["state"], "AZ");
        assert_eq!(response.message.text(), None);
    }

    #[tokio::test]
    async fn test_chat_plain_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hello!"}}]
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .chat(&[Message::user("hi")], &ProviderModelConfig::new("m"), &ChatOptions::new())
            .await
            .unwrap();
        assert_eq!(response.message.text(), Some("Hello!"));
        assert_eq!(response.model, "m");
    }

    #[tokio::test]
    async fn test_chat_error_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .chat(&[Message::user("hi")], &ProviderModelConfig::new("m"), &ChatOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_chat_without_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = provider(&server)
            .chat(&[Message::user("hi")], &ProviderModelConfig::new("m"), &ChatOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse { .. }));
    }
}
