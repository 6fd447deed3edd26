use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use toolbridge_core::ConfigLayer;

/// Chat with a language model that can call MCP tools
#[derive(Parser, Debug)]
#[command(
    name = "toolbridge",
    version,
    about = "Chat with a language model that can call MCP tools",
    long_about = "toolbridge connects a hosted language model to the tools served by an MCP \
                  endpoint. Settings come from ~/.config/toolbridge/config.yaml, the \
                  environment (and a .env file), then the flags below.\n\n\
                  Examples:\n  \
                  toolbridge chat\n  \
                  toolbridge ask \"Find homes in Phoenix, AZ under $500k\"\n  \
                  toolbridge --provider gemini tools --refresh\n  \
                  toolbridge serve --bind 0.0.0.0:8080\n  \
                  toolbridge config set --provider gemini --model gemini-2.0-flash"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactive chat session
    Chat,

    /// Ask one question and print the answer
    Ask(AskArgs),

    /// List the tools offered by the MCP endpoint
    Tools(ToolsArgs),

    /// Serve the invoke endpoint over HTTP
    Serve(ServeArgs),

    /// Show or update the config file
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AskArgs {
    /// Question to ask
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,

    /// Print the full conversation as JSON after the answer
    #[arg(long)]
    pub history: bool,
}

impl AskArgs {
    pub fn prompt_text(&self) -> String {
        self.prompt.join(" ")
    }
}

#[derive(Args, Debug, Clone)]
pub struct ToolsArgs {
    /// Bypass the tool cache
    #[arg(long)]
    pub refresh: bool,

    /// Print descriptors as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print the file's settings (API key masked)
    Show,

    /// Write the given global flags into the file, keeping other settings
    Set,

    /// Print the config file location
    Path,
}

/// Flags shared by every subcommand; they override file and environment
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (defaults to ~/.config/toolbridge/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// MCP endpoint URL
    #[arg(long, global = true, value_name = "URL")]
    pub mcp_url: Option<String>,

    /// openai, groq, gemini, anthropic, local, custom or mock
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// genai, openai-compat or mock
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// API key (prefer LLM_API_KEY or the provider's own variable)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[arg(long, global = true)]
    pub system_prompt: Option<String>,

    #[arg(long, global = true)]
    pub max_tokens: Option<u32>,

    /// Network timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Tool rounds allowed per turn
    #[arg(long, global = true)]
    pub max_tool_rounds: Option<u32>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    /// Highest-priority configuration layer
    pub fn to_layer(&self) -> ConfigLayer {
        ConfigLayer {
            mcp_url: self.mcp_url.clone(),
            provider: self.provider.clone(),
            backend: self.backend.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            system_prompt: self.system_prompt.clone(),
            max_tokens: self.max_tokens,
            timeout_secs: self.timeout,
            max_tool_rounds: self.max_tool_rounds,
            tools: None,
        }
    }
}
