//! Append-only conversation history

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use super::message::{Message, MessageRole};

/// Violations of the conversation invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversationError {
    #[error("system message must be the first message (found at position {0})")]
    MisplacedSystem(usize),

    #[error("tool message references unknown tool_call_id '{0}'")]
    UnknownToolCall(String),

    #[error("conversation is empty")]
    Empty,

    #[error("last message must be a user message, found {0}")]
    NotAwaitingAnswer(MessageRole),
}

/// Ordered message history owned by a single session.
///
/// Messages are only ever appended. Every append is checked: a system
/// message may only open the history and a tool message must answer a
/// tool call issued by an earlier assistant message.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
    #[serde(skip)]
    issued_calls: HashSet<String>,
}

impl Conversation {
    /// Empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// History opened by a system prompt
    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.messages.push(Message::system(prompt));
        conversation
    }

    /// Import an externally supplied history, validating every message.
    ///
    /// When `default_system` is given and the history does not start with a
    /// system message, one is prepended.
    pub fn from_messages(
        messages: Vec<Message>,
        default_system: Option<&str>,
    ) -> Result<Self, ConversationError> {
        let mut conversation = match (messages.first(), default_system) {
            (Some(Message::System { .. }), _) | (_, None) => Self::new(),
            (_, Some(prompt)) => Self::with_system_prompt(prompt),
        };
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    /// Append a message, enforcing the history invariants
    pub fn push(&mut self, message: Message) -> Result<(), ConversationError> {
        match &message {
            Message::System { .. } if !self.messages.is_empty() => {
                return Err(ConversationError::MisplacedSystem(self.messages.len()));
            }
            Message::Tool { tool_call_id, .. } if !self.issued_calls.contains(tool_call_id) => {
                return Err(ConversationError::UnknownToolCall(tool_call_id.clone()));
            }
            Message::Assistant { tool_calls, .. } => {
                self.issued_calls
                    .extend(tool_calls.iter().map(|call| call.id.clone()));
            }
            _ => {}
        }
        self.messages.push(message);
        Ok(())
    }

    /// Append a user message (always valid)
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Drop everything after the first `len` messages.
    ///
    /// Used to discard a failed turn; tool-call bookkeeping is rebuilt from
    /// what remains.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.messages.len() {
            return;
        }
        self.messages.truncate(len);
        self.issued_calls = self
            .messages
            .iter()
            .flat_map(|m| m.tool_calls().iter().map(|call| call.id.clone()))
            .collect();
    }

    /// Fails unless the history ends with a user message waiting for an answer
    pub fn ensure_awaiting_answer(&self) -> Result<(), ConversationError> {
        match self.messages.last() {
            None => Err(ConversationError::Empty),
            Some(Message::User { .. }) => Ok(()),
            Some(other) => Err(ConversationError::NotAwaitingAnswer(other.role())),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}
