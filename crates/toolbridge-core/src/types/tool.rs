//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool as advertised by a remote tool server (`tools/list` entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a session
    pub name: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool arguments
    #[serde(rename = "inputSchema", default)]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }
}

/// Tool definition in the backend-neutral shape handed to model providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// JSON Schema for the input parameters
    pub parameters: Value,
}

impl Tool {
    /// Create a new tool definition with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: empty_object_schema(),
        }
    }

    /// Set the parameter schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }
}

/// `{"type": "object", "properties": {}}`
pub fn empty_object_schema() -> Value {
    let mut schema = Map::new();
    schema.insert("type".to_string(), Value::String("object".to_string()));
    schema.insert("properties".to_string(), Value::Object(Map::new()));
    Value::Object(schema)
}

/// Tool call requested by the model.
///
/// Serializes flat as `{id, name, arguments}`. Deserialization also accepts
/// the OpenAI chat shape `{id, type: "function", function: {name, arguments}}`
/// so histories returned by chat-completions APIs can be replayed as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireToolCall")]
pub struct ToolCall {
    /// Correlation identifier assigned by the model backend
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// JSON-encoded argument object, exactly as the model produced it
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Create a tool call from already-structured arguments
    pub fn with_value(id: impl Into<String>, name: impl Into<String>, arguments: &Value) -> Self {
        Self::new(id, name, arguments.to_string())
    }

    /// Decode the argument payload into a JSON object.
    ///
    /// An empty payload decodes to `{}`; anything that is not a JSON object is
    /// rejected.
    pub fn decode_arguments(&self) -> Result<Value, serde_json::Error> {
        let raw = self.arguments.trim();
        if raw.is_empty() {
            return Ok(Value::Object(Map::new()));
        }

        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Ok(Value::Object(map)),
            other => Err(<serde_json::Error as serde::de::Error>::custom(format!(
                "tool arguments must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireToolCall {
    Nested {
        id: String,
        function: WireFunction,
    },
    Flat {
        id: String,
        name: String,
        #[serde(default)]
        arguments: Value,
    },
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl From<WireToolCall> for ToolCall {
    fn from(wire: WireToolCall) -> Self {
        let (id, name, arguments) = match wire {
            WireToolCall::Nested { id, function } => (id, function.name, function.arguments),
            WireToolCall::Flat {
                id,
                name,
                arguments,
            } => (id, name, arguments),
        };
        let arguments = match arguments {
            Value::String(raw) => raw,
            Value::Null => String::new(),
            structured => structured.to_string(),
        };
        ToolCall { id, name, arguments }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Result of one tool execution, ready to be appended to the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    #[serde(rename = "callId")]
    pub call_id: String,
    /// The result content
    pub content: String,
    /// Whether this result represents an error
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(call_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: error.into(),
            is_error: true,
        }
    }
}

/// Tool choice option for requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// Let the model decide whether to use tools
    #[default]
    Auto,
    /// Don't use tools
    None,
}

impl ToolChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolChoice::Auto => "auto",
            ToolChoice::None => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_from_wire() {
        let descriptor: ToolDescriptor = serde_json::from_value(json!({
            "name": "search_properties",
            "description": "Search for properties",
            "inputSchema": {"type": "object", "required": ["city", "state"]}
        }))
        .unwrap();

        assert_eq!(descriptor.name, "search_properties");
        assert_eq!(descriptor.input_schema["required"][0], "city");
    }

    #[test]
    fn test_descriptor_without_optional_fields() {
        let descriptor: ToolDescriptor = serde_json::from_value(json!({"name": "ping"})).unwrap();
        assert!(descriptor.description.is_none());
        assert!(descriptor.input_schema.is_null());
    }

    #[test]
    fn test_decode_arguments() {
        let call = ToolCall::new("call_123", "search_properties", r#"{"city":"Phoenix","state":"AZ"}"#);
        let args = call.decode_arguments().unwrap();
        assert_eq!(args["city"], "Phoenix");
        assert_eq!(args["state"], "AZ");
    }

    #[test]
    fn test_decode_empty_arguments() {
        let call = ToolCall::new("call_1", "list", "  ");
        assert_eq!(call.decode_arguments().unwrap(), json!({}));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(ToolCall::new("c", "t", "[1,2]").decode_arguments().is_err());
        assert!(ToolCall::new("c", "t", "{not json").decode_arguments().is_err());
    }

    #[test]
    fn test_tool_call_from_openai_shape() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "call_1",
            "type": "function",
            "function": {"name": "search_properties", "arguments": "{\"city\":\"Mesa\"}"}
        }))
        .unwrap();

        assert_eq!(call, ToolCall::new("call_1", "search_properties", r#"{"city":"Mesa"}"#));
        assert_eq!(
            serde_json::to_value(&call).unwrap(),
            json!({"id": "call_1", "name": "search_properties", "arguments": "{\"city\":\"Mesa\"}"})
        );
    }

    #[test]
    fn test_tool_call_structured_arguments() {
        let call: ToolCall = serde_json::from_value(json!({
            "id": "call_2",
            "name": "search_properties",
            "arguments": {"city": "Tempe", "state": "AZ"}
        }))
        .unwrap();
        assert_eq!(call.decode_arguments().unwrap()["city"], "Tempe");

        let bare: ToolCall =
            serde_json::from_value(json!({"id": "call_3", "function": {"name": "ping"}})).unwrap();
        assert_eq!(bare.arguments, "");
    }

    #[test]
    fn test_tool_call_requires_name() {
        assert!(serde_json::from_value::<ToolCall>(json!({"id": "call_1"})).is_err());
    }

    #[test]
    fn test_tool_result() {
        let success = ToolResult::success("call_123", "Found 3 properties");
        assert!(!success.is_error);

        let error = ToolResult::error("call_456", "Location not found");
        assert!(error.is_error);
    }
}
