//! Adapter between toolbridge types and genai types
//!
//! Conversion functions between our message union and genai's chat types,
//! plus client construction with explicit auth and endpoint resolution.
//! Keys come from `BridgeConfig`, never from genai's own env var lookup.

use genai::adapter::AdapterKind;
use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, MessageContent as GenaiContent,
    Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use serde_json::{json, Value};

use crate::config::ProviderKind;
use crate::types::{Message, Tool, ToolCall};

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatOptions, ProviderModelConfig};

// ============================================================================
// Message Conversion: toolbridge -> genai
// ============================================================================

/// Convert one message to genai's representation
pub fn to_genai_message(msg: &Message) -> ProviderResult<GenaiMessage> {
    let converted = match msg {
        Message::System { content } => GenaiMessage::system(content.as_str()),
        Message::User { content } => GenaiMessage::user(content.as_str()),
        Message::Assistant { content, tool_calls } if tool_calls.is_empty() => {
            GenaiMessage::assistant(content.as_deref().unwrap_or_default())
        }
        // genai carries either text or tool calls on an assistant turn
        Message::Assistant { tool_calls, .. } => {
            let calls = tool_calls
                .iter()
                .map(to_genai_tool_call)
                .collect::<ProviderResult<Vec<_>>>()?;
            GenaiMessage::assistant(GenaiContent::from_tool_calls(calls))
        }
        Message::Tool {
            tool_call_id,
            content,
            ..
        } => GenaiToolResponse::new(tool_call_id.clone(), content.clone()).into(),
    };
    Ok(converted)
}

/// Convert a whole history
pub fn to_genai_messages(messages: &[Message]) -> ProviderResult<Vec<GenaiMessage>> {
    messages.iter().map(to_genai_message).collect()
}

/// genai expects structured arguments; non-JSON payloads travel as a string
fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    let arguments = serde_json::from_str::<Value>(&call.arguments)
        .unwrap_or_else(|_| Value::String(call.arguments.clone()));

    // Built through serde so optional fields added by newer genai releases default
    serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": arguments,
    }))
    .map_err(ProviderError::from)
}

// ============================================================================
// Tool Conversion: toolbridge -> genai
// ============================================================================

/// Convert a backend-neutral tool to a genai tool
pub fn to_genai_tool(tool: Tool) -> GenaiTool {
    GenaiTool::new(tool.name)
        .with_description(tool.description)
        .with_schema(tool.parameters)
}

/// Convert tools to genai tools
pub fn to_genai_tools(tools: Vec<Tool>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: toolbridge -> genai
// ============================================================================

/// Convert ChatOptions to genai ChatOptions
pub fn to_genai_options(options: &ChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> toolbridge
// ============================================================================

/// Convert a genai tool call; string arguments are kept verbatim
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    let arguments = match &tc.fn_arguments {
        Value::String(raw) => raw.clone(),
        other => other.to_string(),
    };
    ToolCall::new(tc.call_id.clone(), tc.fn_name.clone(), arguments)
}

// ============================================================================
// Client Creation with Explicit Auth
// ============================================================================

/// genai adapter used for a provider kind
pub fn adapter_kind(kind: ProviderKind) -> AdapterKind {
    match kind {
        ProviderKind::Groq => AdapterKind::Groq,
        ProviderKind::Gemini => AdapterKind::Gemini,
        ProviderKind::Anthropic => AdapterKind::Anthropic,
        // Everything else speaks the OpenAI protocol
        ProviderKind::OpenAi | ProviderKind::Local | ProviderKind::Custom | ProviderKind::Mock => {
            AdapterKind::OpenAI
        }
    }
}

/// genai joins paths onto the endpoint, so it must end with '/'
pub fn normalize_endpoint(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

/// Create a genai Client pinned to one adapter, key and (optionally) endpoint
///
/// A custom `api_base` routes through the OpenAI-compatible adapter for
/// OpenAI, local and custom kinds; native adapters keep their own protocol
/// at the overridden endpoint.
pub fn create_client(kind: ProviderKind, model_config: &ProviderModelConfig) -> Client {
    let adapter = adapter_kind(kind);
    let api_key = model_config.api_key.clone().unwrap_or_default();
    let endpoint = model_config.api_base.as_deref().map(normalize_endpoint);

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { model, endpoint: default_endpoint, .. } = target;

            let resolved_endpoint = match &endpoint {
                Some(url) => Endpoint::from_owned(url.clone()),
                None => default_endpoint,
            };

            Ok(ServiceTarget {
                endpoint: resolved_endpoint,
                auth: AuthData::from_single(api_key.clone()),
                model: ModelIden::new(adapter, model.model_name.clone()),
            })
        },
    );

    Client::builder()
        .with_service_target_resolver(target_resolver)
        .build()
}
