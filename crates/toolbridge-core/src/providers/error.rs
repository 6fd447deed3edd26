//! Provider error types

use std::time::Duration;

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing API key
    #[error("API key is required for {provider}")]
    MissingApiKey { provider: String },

    /// Backend answered with a non-success status
    #[error("{provider} API error ({status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// No answer within the configured bound
    #[error("{provider} request timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid response from provider
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// Rate limited
    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    /// Scripted provider ran out of responses, or similar local failure
    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Create an API error
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a missing API key error
    pub fn missing_api_key(provider: impl Into<String>) -> Self {
        Self::MissingApiKey {
            provider: provider.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a rate limited error
    pub fn rate_limited(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(provider: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            provider: provider.into(),
            timeout,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::MissingApiKey { .. } => ErrorKind::Configuration,
            ProviderError::ApiError { .. }
            | ProviderError::Http(_)
            | ProviderError::Timeout { .. }
            | ProviderError::RateLimited { .. } => ErrorKind::Transport,
            ProviderError::Json(_)
            | ProviderError::InvalidResponse { .. }
            | ProviderError::Other(_) => ErrorKind::Protocol,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            ProviderError::Timeout { .. } => true,
            ProviderError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
