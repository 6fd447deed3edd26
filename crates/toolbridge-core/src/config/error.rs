//! Configuration errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("MCP_URL or MCP_LAMBDA_URL must be set in environment, config file or passed as argument")]
    MissingMcpUrl,

    #[error("API key for {provider} must be set (LLM_API_KEY, {env_var} or --api-key)")]
    MissingApiKey { provider: String, env_var: String },

    #[error("No model configured for {0}; set LLM_MODEL or --model")]
    MissingModel(String),

    #[error("No base URL configured for {0}; set LLM_BASE_URL or --base-url")]
    MissingBaseUrl(String),

    #[error("Unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("Unknown backend '{0}' (expected genai, openai-compat or mock)")]
    UnknownBackend(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
