//! Configuration: provider catalogue, layered settings and the YAML file

mod error;
mod file;
mod provider_kind;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::FileConfigProvider;
pub use provider_kind::{Backend, ProviderKind};
pub use settings::{
    BridgeConfig, ConfigLayer, ToolSelection, DEFAULT_MAX_TOKENS, DEFAULT_MAX_TOOL_ROUNDS,
    DEFAULT_PROVIDER, DEFAULT_SYSTEM_PROMPT, DEFAULT_TIMEOUT_SECS,
};
