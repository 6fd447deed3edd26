//! Model provider catalogue
//!
//! Defaults live in a `match`, so adding a provider means adding a variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Hosted or local model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Groq,
    Gemini,
    Anthropic,
    /// Local OpenAI-compatible server (vLLM, Ollama, LM Studio)
    Local,
    /// Any other OpenAI-compatible endpoint; base URL and model required
    Custom,
    /// Offline scripted provider
    Mock,
}

/// Implementation used to talk to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// genai crate
    Genai,
    /// Plain reqwest against `/chat/completions`
    OpenaiCompat,
    Mock,
}

impl ProviderKind {
    pub fn all() -> &'static [ProviderKind] {
        &[
            ProviderKind::OpenAi,
            ProviderKind::Groq,
            ProviderKind::Gemini,
            ProviderKind::Anthropic,
            ProviderKind::Local,
            ProviderKind::Custom,
            ProviderKind::Mock,
        ]
    }

    /// Identifier used in config files and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Groq => "groq",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Local => "local",
            ProviderKind::Custom => "custom",
            ProviderKind::Mock => "mock",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Groq => "Groq",
            ProviderKind::Gemini => "Google Gemini",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Local => "Local (vLLM/Ollama)",
            ProviderKind::Custom => "Custom endpoint",
            ProviderKind::Mock => "Mock",
        }
    }

    /// OpenAI-compatible base URL
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("https://api.openai.com/v1"),
            ProviderKind::Groq => Some("https://api.groq.com/openai/v1"),
            ProviderKind::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai/"),
            ProviderKind::Anthropic => Some("https://api.anthropic.com/v1"),
            ProviderKind::Local => Some("http://localhost:8000/v1"),
            ProviderKind::Custom | ProviderKind::Mock => None,
        }
    }

    pub fn default_model(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("gpt-4o"),
            ProviderKind::Groq => Some("llama-3.3-70b-versatile"),
            ProviderKind::Gemini => Some("gemini-1.5-flash"),
            ProviderKind::Anthropic => Some("claude-3-5-sonnet-20241022"),
            ProviderKind::Local => Some("local-model"),
            ProviderKind::Mock => Some("mock-model"),
            ProviderKind::Custom => None,
        }
    }

    /// Provider-specific key variable, consulted after `LLM_API_KEY`
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Groq => Some("GROQ_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Local | ProviderKind::Custom | ProviderKind::Mock => None,
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.api_key_env().is_some()
    }

    pub fn default_backend(&self) -> Backend {
        match self {
            ProviderKind::Local | ProviderKind::Custom => Backend::OpenaiCompat,
            ProviderKind::Mock => Backend::Mock,
            _ => Backend::Genai,
        }
    }

    /// Parse an identifier, accepting common aliases
    pub fn from_id(id: &str) -> Option<ProviderKind> {
        match id.trim().to_lowercase().as_str() {
            "openai" => Some(ProviderKind::OpenAi),
            "groq" => Some(ProviderKind::Groq),
            "gemini" | "google" => Some(ProviderKind::Gemini),
            "anthropic" | "claude" => Some(ProviderKind::Anthropic),
            "local" | "vllm" | "ollama" => Some(ProviderKind::Local),
            "custom" => Some(ProviderKind::Custom),
            "mock" => Some(ProviderKind::Mock),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderKind::from_id(s).ok_or_else(|| ConfigError::UnknownProvider(s.to_string()))
    }
}

impl Backend {
    pub fn id(&self) -> &'static str {
        match self {
            Backend::Genai => "genai",
            Backend::OpenaiCompat => "openai-compat",
            Backend::Mock => "mock",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "genai" => Ok(Backend::Genai),
            "openai-compat" | "openai_compat" | "http" => Ok(Backend::OpenaiCompat),
            "mock" => Ok(Backend::Mock),
            _ => Err(ConfigError::UnknownBackend(s.to_string())),
        }
    }
}
