//! Layered bridge configuration
//!
//! Each source (YAML file, environment, command line) produces a
//! `ConfigLayer`; layers merge with later sources winning and the result is
//! validated into a `BridgeConfig` before any network I/O happens.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::file::FileConfigProvider;
use super::provider_kind::{Backend, ProviderKind};
use crate::tools::ToolFilter;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with access to tools via MCP.";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 1;

/// Provider used when none is configured
pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::Groq;

/// Tool include/exclude lists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl ToolSelection {
    pub fn to_filter(&self) -> ToolFilter {
        let mut filter = ToolFilter::new().with_exclude(self.exclude.iter().cloned());
        if let Some(include) = &self.include {
            filter = filter.with_include(include.iter().cloned());
        }
        filter
    }
}

/// One partial configuration source; every field optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tool_rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolSelection>,
}

impl ConfigLayer {
    /// Overlay `higher` on top of `self`; set fields in `higher` win
    pub fn merge(self, higher: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            mcp_url: higher.mcp_url.or(self.mcp_url),
            provider: higher.provider.or(self.provider),
            backend: higher.backend.or(self.backend),
            api_key: higher.api_key.or(self.api_key),
            model: higher.model.or(self.model),
            base_url: higher.base_url.or(self.base_url),
            system_prompt: higher.system_prompt.or(self.system_prompt),
            max_tokens: higher.max_tokens.or(self.max_tokens),
            timeout_secs: higher.timeout_secs.or(self.timeout_secs),
            max_tool_rounds: higher.max_tool_rounds.or(self.max_tool_rounds),
            tools: higher.tools.or(self.tools),
        }
    }

    /// Layer built from environment variables read through `env`
    ///
    /// Empty values count as unset.
    pub fn from_env<F>(env: F) -> ConfigResult<ConfigLayer>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        Ok(ConfigLayer {
            mcp_url: get("MCP_URL").or_else(|| get("MCP_LAMBDA_URL")),
            provider: get("LLM_PROVIDER"),
            backend: get("LLM_BACKEND"),
            api_key: get("LLM_API_KEY"),
            model: get("LLM_MODEL").or_else(|| get("OPENAI_MODEL")),
            base_url: get("LLM_BASE_URL").or_else(|| get("OPENAI_BASE_URL")),
            system_prompt: get("LLM_SYSTEM_PROMPT"),
            max_tokens: parse_number("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"))?,
            timeout_secs: parse_number("MCP_TIMEOUT", get("MCP_TIMEOUT"))?,
            max_tool_rounds: parse_number("MAX_TOOL_ROUNDS", get("MAX_TOOL_ROUNDS"))?,
            tools: None,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>) -> ConfigResult<Option<T>> {
    value
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            })
        })
        .transpose()
}

/// Validated configuration for one bridge process
#[derive(Clone, PartialEq)]
pub struct BridgeConfig {
    pub mcp_url: String,
    pub provider: ProviderKind,
    pub backend: Backend,
    pub api_key: Option<String>,
    pub model: String,
    /// Explicit base URL; `None` means the backend's default for the provider
    pub base_url: Option<String>,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub max_tool_rounds: u32,
    pub tools: ToolSelection,
}

impl BridgeConfig {
    /// Validate a merged layer; `env` supplies the provider's own key variable
    pub fn resolve<F>(layer: ConfigLayer, env: F) -> ConfigResult<BridgeConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mcp_url = layer
            .mcp_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingMcpUrl)?;

        let provider = match layer.provider.as_deref() {
            Some(id) => id.parse::<ProviderKind>()?,
            None => DEFAULT_PROVIDER,
        };

        let backend = match layer.backend.as_deref() {
            Some(id) => id.parse::<Backend>()?,
            None => provider.default_backend(),
        };

        let api_key = layer.api_key.or_else(|| {
            provider
                .api_key_env()
                .and_then(|var| env(var))
                .filter(|v| !v.trim().is_empty())
        });
        if provider.requires_api_key() && backend != Backend::Mock && api_key.is_none() {
            return Err(ConfigError::MissingApiKey {
                provider: provider.display_name().to_string(),
                env_var: provider.api_key_env().unwrap_or("LLM_API_KEY").to_string(),
            });
        }

        let model = layer
            .model
            .or_else(|| provider.default_model().map(str::to_string))
            .ok_or_else(|| ConfigError::MissingModel(provider.display_name().to_string()))?;

        if backend == Backend::OpenaiCompat
            && layer.base_url.is_none()
            && provider.default_base_url().is_none()
        {
            return Err(ConfigError::MissingBaseUrl(provider.display_name().to_string()));
        }

        Ok(BridgeConfig {
            mcp_url,
            provider,
            backend,
            api_key,
            model,
            base_url: layer.base_url,
            system_prompt: layer
                .system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: layer.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_secs: layer.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_tool_rounds: layer.max_tool_rounds.unwrap_or(DEFAULT_MAX_TOOL_ROUNDS),
            tools: layer.tools.unwrap_or_default(),
        })
    }

    /// Full stack: YAML file (explicit path or the user config) → process
    /// environment → `overrides`
    pub fn load(config_path: Option<&Path>, overrides: ConfigLayer) -> ConfigResult<BridgeConfig> {
        let file = match config_path {
            Some(path) => FileConfigProvider::new(path),
            None => FileConfigProvider::user(),
        };
        let env = |key: &str| std::env::var(key).ok();

        let layer = file
            .load()?
            .merge(ConfigLayer::from_env(env)?)
            .merge(overrides);
        Self::resolve(layer, env)
    }

    /// Same settings aimed at another provider and/or model.
    ///
    /// Switching provider drops the key, backend and base URL of the old one
    /// and re-resolves them for the new provider from `env`.
    pub fn switch_model<F>(
        &self,
        provider: Option<&str>,
        model: Option<&str>,
        env: F,
    ) -> ConfigResult<BridgeConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match provider {
            Some(id) => Some(id.parse::<ProviderKind>()?),
            None => None,
        };

        match provider {
            Some(kind) if kind != self.provider => {
                let layer = ConfigLayer {
                    mcp_url: Some(self.mcp_url.clone()),
                    provider: Some(kind.id().to_string()),
                    model: model.map(str::to_string),
                    system_prompt: Some(self.system_prompt.clone()),
                    max_tokens: Some(self.max_tokens),
                    timeout_secs: Some(self.timeout_secs),
                    max_tool_rounds: Some(self.max_tool_rounds),
                    tools: Some(self.tools.clone()),
                    ..Default::default()
                };
                Self::resolve(layer, env)
            }
            _ => {
                let mut config = self.clone();
                if let Some(model) = model {
                    config.model = model.to_string();
                }
                Ok(config)
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL the OpenAI-compatible backend should use
    pub fn effective_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.provider.default_base_url())
    }
}

// Hand-written so the key never reaches logs
impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("mcp_url", &self.mcp_url)
            .field("provider", &self.provider)
            .field("backend", &self.backend)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("tools", &self.tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn resolve_env(pairs: &[(&str, &str)]) -> ConfigResult<BridgeConfig> {
        let env = env_of(pairs);
        let layer = ConfigLayer::from_env(&env)?;
        BridgeConfig::resolve(layer, &env)
    }

    #[test]
    fn test_groq_defaults() {
        let config = resolve_env(&[
            ("MCP_LAMBDA_URL", "https://mcp.example.com"),
            ("GROQ_API_KEY", "gsk-test"),
        ])
        .unwrap();

        assert_eq!(config.provider, ProviderKind::Groq);
        assert_eq!(config.backend, Backend::Genai);
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.api_key.as_deref(), Some("gsk-test"));
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.max_tool_rounds, 1);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_mcp_url() {
        let err = resolve_env(&[("GROQ_API_KEY", "k")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingMcpUrl));
    }

    #[test]
    fn test_missing_api_key() {
        let err = resolve_env(&[("MCP_URL", "http://x"), ("LLM_PROVIDER", "openai")]).unwrap_err();
        match err {
            ConfigError::MissingApiKey { env_var, .. } => assert_eq!(env_var, "OPENAI_API_KEY"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_generic_key_wins_over_provider_key() {
        let config = resolve_env(&[
            ("MCP_URL", "http://x"),
            ("LLM_PROVIDER", "anthropic"),
            ("LLM_API_KEY", "generic"),
            ("ANTHROPIC_API_KEY", "specific"),
        ])
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn test_local_needs_no_key() {
        let config = resolve_env(&[("MCP_URL", "http://x"), ("LLM_PROVIDER", "local")]).unwrap();
        assert_eq!(config.backend, Backend::OpenaiCompat);
        assert_eq!(config.effective_base_url(), Some("http://localhost:8000/v1"));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_custom_requires_base_url_and_model() {
        let err = resolve_env(&[("MCP_URL", "http://x"), ("LLM_PROVIDER", "custom")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingModel(_)));

        let err = resolve_env(&[
            ("MCP_URL", "http://x"),
            ("LLM_PROVIDER", "custom"),
            ("LLM_MODEL", "my-model"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingBaseUrl(_)));
    }

    #[test]
    fn test_invalid_number() {
        let err = resolve_env(&[("MCP_URL", "http://x"), ("MAX_TOOL_ROUNDS", "lots")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_merge_later_wins() {
        let file = ConfigLayer {
            mcp_url: Some("http://file".into()),
            model: Some("file-model".into()),
            ..Default::default()
        };
        let cli = ConfigLayer {
            model: Some("cli-model".into()),
            ..Default::default()
        };

        let merged = file.merge(cli);
        assert_eq!(merged.mcp_url.as_deref(), Some("http://file"));
        assert_eq!(merged.model.as_deref(), Some("cli-model"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = resolve_env(&[("MCP_URL", "http://x"), ("GROQ_API_KEY", "gsk-secret")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("gsk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_tool_selection_filter() {
        let selection = ToolSelection {
            include: None,
            exclude: vec!["dangerous".into()],
        };
        let filter = selection.to_filter();
        assert!(filter.exclude.contains("dangerous"));
        assert!(filter.include.is_none());
    }

    #[test]
    fn test_switch_model() {
        let env = |key: &str| match key {
            "GEMINI_API_KEY" => Some("gem-key".to_string()),
            _ => None,
        };
        let base = resolve_env(&[
            ("MCP_URL", "http://x"),
            ("GROQ_API_KEY", "gsk-key"),
            ("MAX_TOOL_ROUNDS", "3"),
        ])
        .unwrap();

        let same = base.switch_model(None, Some("llama-3.1-8b-instant"), env).unwrap();
        assert_eq!(same.provider, ProviderKind::Groq);
        assert_eq!(same.model, "llama-3.1-8b-instant");
        assert_eq!(same.api_key.as_deref(), Some("gsk-key"));

        let gemini = base.switch_model(Some("gemini"), None, env).unwrap();
        assert_eq!(gemini.provider, ProviderKind::Gemini);
        assert_eq!(gemini.model, "gemini-1.5-flash");
        assert_eq!(gemini.api_key.as_deref(), Some("gem-key"));
        assert_eq!(gemini.max_tool_rounds, 3);

        let err = base.switch_model(Some("openai"), None, env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey { .. }));
    }
}
