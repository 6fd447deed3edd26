mod chat;
mod commands;
mod config;
mod serve;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::{CliArgs, Commands, GlobalArgs};
use toolbridge_core::{BridgeConfig, ChatSession, InvokeHandler, SharedLogger, TracingLogger};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = CliArgs::parse();
    init_logging(&args.global, matches!(args.command, Commands::Serve(_)));

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    // Editing the file must work even when the current settings do not resolve
    if let Commands::Config(config_args) = &args.command {
        return config::run_config(config_args, &args.global, &mut std::io::stdout());
    }

    let config = BridgeConfig::load(args.global.config.as_deref(), args.global.to_layer())
        .context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let logger: SharedLogger = Arc::new(TracingLogger::new("toolbridge"));

    match args.command {
        Commands::Chat => chat::run_chat(ChatSession::from_config(&config, logger)).await,
        Commands::Ask(ask) => {
            let session = ChatSession::from_config(&config, logger);
            chat::run_ask(session, &ask, &mut std::io::stdout()).await
        }
        Commands::Tools(tools) => {
            let session = ChatSession::from_config(&config, logger);
            chat::run_tools(session, &tools, &mut std::io::stdout()).await
        }
        Commands::Serve(serve_args) => {
            let handler = InvokeHandler::new(config, logger);
            serve::serve(handler, serve_args.bind)
                .await
                .with_context(|| format!("failed to serve on {}", serve_args.bind))
        }
        Commands::Config(_) => Ok(()),
    }
}

/// Logs go to stderr so answers on stdout stay clean.
/// Interactive commands default to warnings only; `serve` to info.
fn init_logging(args: &GlobalArgs, serving: bool) {
    let level = match (args.debug, serving) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{level},h2=warn,hyper=warn,reqwest=warn")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}
