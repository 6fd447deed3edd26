//! History normalization before each model call

use crate::types::Message;

/// Normalize a history for replay to a model backend.
///
/// Assistant messages always carry text content (`""` when the model sent
/// only tool calls); every other message passes through unchanged. Total and
/// idempotent.
pub fn sanitize(messages: &[Message]) -> Vec<Message> {
    messages.iter().map(sanitize_message).collect()
}

fn sanitize_message(message: &Message) -> Message {
    match message {
        Message::Assistant {
            content: None,
            tool_calls,
        } => Message::Assistant {
            content: Some(String::new()),
            tool_calls: tool_calls.clone(),
        },
        other => other.clone(),
    }
}
