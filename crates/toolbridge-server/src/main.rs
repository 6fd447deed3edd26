//! `toolbridge-server` binary

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use toolbridge_server::{http, McpServer, PropertySearchConfig, PropertySearchTool};

const DEFAULT_API_BASE: &str =
    "https://mz5wkrw9e4.execute-api.us-east-1.amazonaws.com/property_listing_service/prod/public";

#[derive(Parser, Debug)]
#[command(name = "toolbridge-server", version, about = "Property search MCP tool server")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND", default_value = "127.0.0.1:8787")]
    bind: SocketAddr,

    /// Base URL of the property listing API
    #[arg(long, env = "PROPERTY_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Tenant sent with every listing request
    #[arg(long, env = "TENANT", default_value = toolbridge_server::property_search::DEFAULT_TENANT)]
    tenant: String,

    /// Listing API key
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, env = "SEARCH_TIMEOUT", default_value_t = 25)]
    timeout: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_logging(debug: bool, json: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init()
            .ok();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.log_json);

    let mut config = PropertySearchConfig::new(args.api_base)
        .with_tenant(args.tenant)
        .with_timeout(Duration::from_secs(args.timeout));
    match args.api_key {
        Some(key) => config = config.with_api_key(key),
        None => tracing::warn!("API_KEY not set; searches will fail until it is configured"),
    }
    tracing::debug!(?config, "property search configured");

    let server = McpServer::new().with_tool(Arc::new(PropertySearchTool::new(config)));
    http::serve(server, args.bind)
        .await
        .with_context(|| format!("failed to serve on {}", args.bind))
}
