//! Tool schema adapter
//!
//! Pure mapping from remote tool descriptors to the shapes model backends
//! expect. No failure modes.

use serde_json::{json, Value};

use crate::types::{empty_object_schema, Tool, ToolDescriptor};

/// Backend-neutral tool from a remote descriptor
///
/// A missing description becomes `""`; a missing or null schema becomes an
/// empty object schema.
pub fn adapt(descriptor: &ToolDescriptor) -> Tool {
    let parameters = match &descriptor.input_schema {
        Value::Null => empty_object_schema(),
        schema => schema.clone(),
    };

    Tool {
        name: descriptor.name.clone(),
        description: descriptor.description.clone().unwrap_or_default(),
        parameters,
    }
}

pub fn adapt_all(descriptors: &[ToolDescriptor]) -> Vec<Tool> {
    descriptors.iter().map(adapt).collect()
}

/// OpenAI function-calling entry: `{"type":"function","function":{...}}`
pub fn to_openai_function(tool: &Tool) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapt_search_properties() {
        let descriptor = ToolDescriptor::new(
            "search_properties",
            "Search for properties",
            json!({"type": "object", "properties": {"city": {"type": "string"}}, "required": ["city"]}),
        );

        let function = to_openai_function(&adapt(&descriptor));
        assert_eq!(function["type"], "function");
        assert_eq!(function["function"]["name"], "search_properties");
        assert_eq!(function["function"]["description"], "Search for properties");
        assert_eq!(function["function"]["parameters"]["required"][0], "city");
    }

    #[test]
    fn test_adapt_fills_missing_fields() {
        let descriptor: ToolDescriptor = serde_json::from_value(json!({"name": "ping"})).unwrap();
        let tool = adapt(&descriptor);
        assert_eq!(tool.description, "");
        assert_eq!(tool.parameters, json!({"type": "object", "properties": {}}));
    }
}
