//! Crate-wide error taxonomy
//!
//! Each module keeps its own error enum; `BridgeError` unifies them for
//! callers that only care about the failure domain.

use thiserror::Error;

use crate::config::ConfigError;
use crate::providers::ProviderError;
use crate::rpc::RpcError;
use crate::types::ConversationError;

/// Failure domain of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid settings, detected before any network call
    Configuration,
    /// Connect failures, timeouts and non-success HTTP statuses
    Transport,
    /// Error-bearing or malformed responses
    Protocol,
    /// A tool ran and reported failure
    ToolExecution,
    /// Malformed caller input
    InvalidRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Transport => "transport",
            ErrorKind::Protocol => "protocol",
            ErrorKind::ToolExecution => "tool_execution",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Tool endpoint error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid conversation: {0}")]
    Conversation(#[from] ConversationError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BridgeError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::Config(_) => ErrorKind::Configuration,
            BridgeError::Rpc(e) => e.kind(),
            BridgeError::Provider(e) => e.kind(),
            BridgeError::Conversation(_) | BridgeError::InvalidRequest(_) => {
                ErrorKind::InvalidRequest
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            BridgeError::Rpc(e) => e.is_timeout(),
            BridgeError::Provider(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// HTTP status an entry point should answer with
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidRequest => 400,
            ErrorKind::Configuration => 500,
            ErrorKind::Transport if self.is_timeout() => 504,
            ErrorKind::Transport | ErrorKind::Protocol | ErrorKind::ToolExecution => 502,
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
